//! Error taxonomy for program hosting.

use karel_world::KarelError;
use thiserror::Error;

/// Errors raised while loading or running a learner program.
///
/// The first three variants are load failures: they abort that load
/// attempt only, and the host stays alive for a retry. The next three are
/// run failures: recoverable at the host level, reported via a diagnostic
/// plus a user-visible notice. `Engine` carries anything the supervisor
/// could not classify; it propagates unmodified.
#[derive(Debug, Error)]
pub enum HostError {
    /// The program file does not exist.
    #[error("program not found: {0}")]
    NotFound(String),

    /// The program (or one of its required units) failed to parse.
    #[error("syntax error: {0}")]
    SyntaxFailure(String),

    /// The primary unit defines no `main()` function.
    #[error("couldn't find the main() function; are you sure you have one?")]
    MissingEntryPoint,

    /// A capability precondition was violated (raised by the world model).
    #[error("{0}")]
    DomainPrecondition(KarelError),

    /// The program referenced a name that resolves to nothing.
    #[error("name '{name}' is not defined")]
    UnresolvedName {
        name: String,
        suggestion: Option<String>,
    },

    /// Any other failure during execution.
    #[error("{0}")]
    GeneralRuntime(String),

    /// Unclassified engine failure; not swallowed by the supervisor.
    #[error("lua error: {0}")]
    Engine(#[from] mlua::Error),
}

impl HostError {
    /// The stable kind name used as the diagnostic header.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NotFound",
            Self::SyntaxFailure(_) => "SyntaxFailure",
            Self::MissingEntryPoint => "MissingEntryPoint",
            Self::DomainPrecondition(_) => "DomainPrecondition",
            Self::UnresolvedName { .. } => "UnresolvedName",
            Self::GeneralRuntime(_) => "GeneralRuntime",
            Self::Engine(_) => "Engine",
        }
    }

    /// True for run failures the host reports and survives. Load failures
    /// end the attempt; engine failures propagate.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DomainPrecondition(_) | Self::UnresolvedName { .. } | Self::GeneralRuntime(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_failures_are_recoverable() {
        assert!(HostError::DomainPrecondition(KarelError::FrontBlocked).is_recoverable());
        assert!(HostError::UnresolvedName {
            name: "mvoe".into(),
            suggestion: None
        }
        .is_recoverable());
        assert!(HostError::GeneralRuntime("boom".into()).is_recoverable());
    }

    #[test]
    fn load_failures_are_not() {
        assert!(!HostError::NotFound("x.lua".into()).is_recoverable());
        assert!(!HostError::SyntaxFailure("unexpected symbol".into()).is_recoverable());
        assert!(!HostError::MissingEntryPoint.is_recoverable());
    }

    #[test]
    fn kind_matches_taxonomy() {
        assert_eq!(
            HostError::DomainPrecondition(KarelError::FrontBlocked).kind(),
            "DomainPrecondition"
        );
        assert_eq!(HostError::MissingEntryPoint.kind(), "MissingEntryPoint");
    }
}
