//! Error types for world and robot operations.

use thiserror::Error;

/// Errors raised by the world/robot model.
///
/// The first three variants are the domain preconditions: the legality
/// rules a hosted program can violate at run time. The rest cover value
/// parsing and world-file loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KarelError {
    /// The robot tried to move into a wall or the world boundary.
    #[error("Karel attempted to move, but its front was blocked")]
    FrontBlocked,

    /// The robot tried to pick a beeper from an empty corner.
    #[error("Karel attempted to pick up a beeper, but there were none on the current corner")]
    NoBeeperOnCorner,

    /// The robot tried to put a beeper with an empty bag.
    #[error("Karel attempted to put down a beeper, but it had none left in its bag")]
    EmptyBeeperBag,

    /// A color name outside the fixed palette.
    #[error("unknown color: {0}")]
    InvalidColor(String),

    /// A direction name other than north/south/east/west.
    #[error("unknown direction: {0}")]
    InvalidDirection(String),

    /// The world file does not exist or could not be read.
    #[error("world file not found: {0}")]
    WorldFileNotFound(String),

    /// A world file declaration that could not be parsed or applied.
    #[error("malformed world file at line {line}: {reason}")]
    MalformedWorldFile { line: usize, reason: String },

    /// A world file without a `Dimension:` declaration.
    #[error("world file has no Dimension declaration")]
    MissingDimension,
}

impl KarelError {
    /// Returns true for the run-time preconditions a program can violate,
    /// as opposed to load-time failures.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::FrontBlocked | Self::NoBeeperOnCorner | Self::EmptyBeeperBag
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preconditions_are_flagged() {
        assert!(KarelError::FrontBlocked.is_precondition());
        assert!(KarelError::NoBeeperOnCorner.is_precondition());
        assert!(KarelError::EmptyBeeperBag.is_precondition());
        assert!(!KarelError::MissingDimension.is_precondition());
        assert!(!KarelError::InvalidColor("mauve".into()).is_precondition());
    }

    #[test]
    fn display_mentions_the_failed_action() {
        let msg = KarelError::FrontBlocked.to_string();
        assert!(msg.contains("move"));
        assert!(msg.contains("blocked"));
    }
}
