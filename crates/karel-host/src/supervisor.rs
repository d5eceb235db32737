//! Execution supervision and failure diagnosis.
//!
//! The entry point runs once under a single failure guard. Recognized
//! failures (domain preconditions, unresolved names, general runtime
//! errors) are turned into a diagnostic that shows only the learner's own
//! frames, printed to the console, and returned as a classified
//! [`HostError`]. Anything else propagates unmodified.

use crate::error::HostError;
use crate::loader::LoadedProgram;
use crate::suggest::did_you_mean;
use crate::traceback::{frames_for_unit, StackFrame};
use crate::VOCABULARY;
use karel_world::KarelError;
use regex::Regex;

/// Marker inserted by Lua between an error message and its traceback.
const TRACEBACK_MARKER: &str = "stack traceback:";

/// Invokes the program's entry point once.
///
/// On a recognized failure, prints the cleaned diagnostic to the console
/// channel and returns the classified error so the controller can present
/// a notice.
///
/// # Errors
///
/// Classified run failures; or [`HostError::Engine`] for failures outside
/// the taxonomy, which are never swallowed.
#[tracing::instrument(skip(program), fields(program = %program.name()))]
pub fn run(program: &LoadedProgram) -> Result<(), HostError> {
    let main = program.entry_point().map_err(HostError::Engine)?;
    match main.call::<()>(()) {
        Ok(()) => {
            tracing::debug!("program completed");
            Ok(())
        }
        Err(err) => match diagnose(program, &err) {
            Some((classified, diagnostic)) => {
                tracing::warn!(kind = classified.kind(), "program failed");
                eprintln!("{diagnostic}");
                Err(classified)
            }
            None => Err(HostError::Engine(err)),
        },
    }
}

/// Classifies a failure and renders its diagnostic.
///
/// Returns `None` for failure classes outside the taxonomy.
pub fn diagnose(program: &LoadedProgram, err: &mlua::Error) -> Option<(HostError, String)> {
    let (traceback, root) = unwrap_chain(err);
    let classified = classify(program, root)?;
    let frames = traceback
        .map(|tb| frames_for_unit(&tb, program.unit()))
        .unwrap_or_default();
    let diagnostic = render_diagnostic(program, &frames, &classified);
    Some((classified, diagnostic))
}

/// Walks the mlua error chain, collecting the innermost traceback and the
/// root cause. Runtime errors carry the traceback embedded in their
/// message; callback errors carry it as a field.
fn unwrap_chain(err: &mlua::Error) -> (Option<String>, &mlua::Error) {
    match err {
        mlua::Error::CallbackError { traceback, cause } => {
            let (inner_tb, root) = unwrap_chain(cause);
            (inner_tb.or_else(|| Some(traceback.clone())), root)
        }
        mlua::Error::WithContext { cause, .. } => unwrap_chain(cause),
        mlua::Error::RuntimeError(message) => {
            let traceback = message
                .find(TRACEBACK_MARKER)
                .map(|at| message[at..].to_string());
            (traceback, err)
        }
        other => (None, other),
    }
}

/// Maps a root cause into the host taxonomy. `None` means unrecognized.
fn classify(program: &LoadedProgram, root: &mlua::Error) -> Option<HostError> {
    if let Some(karel) = find_domain_error(root) {
        return Some(HostError::DomainPrecondition(karel));
    }
    if let mlua::Error::RuntimeError(message) = root {
        let message = message
            .split(TRACEBACK_MARKER)
            .next()
            .unwrap_or(message)
            .trim();
        let unresolved = Regex::new(r"unresolved name '([^']+)'").expect("static regex");
        if let Some(caps) = unresolved.captures(message) {
            let name = caps[1].to_string();
            let mut candidates: Vec<String> =
                VOCABULARY.iter().map(|s| (*s).to_string()).collect();
            candidates.extend(program.defined_names());
            let suggestion = did_you_mean(&name, &candidates);
            return Some(HostError::UnresolvedName { name, suggestion });
        }
        return Some(HostError::GeneralRuntime(message.to_string()));
    }
    None
}

/// Extracts a [`KarelError`] from an external error anywhere in the chain.
pub(crate) fn find_domain_error(err: &mlua::Error) -> Option<KarelError> {
    match err {
        mlua::Error::ExternalError(external) => {
            let source: &(dyn std::error::Error + 'static) = &**external;
            source.downcast_ref::<KarelError>().cloned()
        }
        mlua::Error::CallbackError { cause, .. } => find_domain_error(cause),
        mlua::Error::WithContext { cause, .. } => find_domain_error(cause),
        _ => None,
    }
}

/// Renders the user-facing diagnostic block: the retained frames with
/// their source lines, then `Kind: message`, then an optional suggestion.
fn render_diagnostic(
    program: &LoadedProgram,
    frames: &[StackFrame],
    error: &HostError,
) -> String {
    let mut out = String::from("Traceback (most recent call last):\n");
    for frame in frames {
        out.push_str(&format!("  File \"{}\", line {}\n", frame.unit, frame.line));
        if let Some(text) = program.source_line(frame.line) {
            out.push_str(&format!("    {}\n", text.trim()));
        }
    }
    out.push_str(&format!("{}: {}", error.kind(), error));
    if let HostError::UnresolvedName {
        suggestion: Some(suggestion),
        ..
    } = error
    {
        out.push_str(&format!("\nDid you mean \"{suggestion}\"?"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intercept::NullView;
    use crate::{ProgramLoader, SharedView, SharedWorld, WorldView};
    use karel_world::World;
    use parking_lot::Mutex;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn shared(world: World) -> SharedWorld {
        Arc::new(Mutex::new(world))
    }

    fn null_view() -> SharedView {
        Arc::new(Mutex::new(Box::new(NullView) as Box<dyn WorldView>))
    }

    fn load(dir: &tempfile::TempDir, source: &str, world: &SharedWorld) -> LoadedProgram {
        let path: PathBuf = dir.path().join("prog.lua");
        std::fs::write(&path, source).unwrap();
        let program = ProgramLoader::new(Arc::clone(world)).load(&path).unwrap();
        program.bind(world, &null_view()).unwrap();
        program
    }

    #[test]
    fn clean_run_returns_ok() {
        let dir = tempfile::tempdir().unwrap();
        let world = shared(World::new(5, 5));
        world.lock().set_speed(100);
        let program = load(&dir, "function main() move() end", &world);
        run(&program).unwrap();
        assert_eq!(world.lock().robot_position(), (2, 1));
    }

    #[test]
    fn blocked_move_is_domain_precondition() {
        let dir = tempfile::tempdir().unwrap();
        let world = shared(World::new(1, 1));
        world.lock().set_speed(100);
        let program = load(&dir, "function main() move() end", &world);
        let err = run(&program).unwrap_err();
        assert!(matches!(
            err,
            HostError::DomainPrecondition(KarelError::FrontBlocked)
        ));
    }

    #[test]
    fn diagnostic_frames_come_only_from_the_primary_unit() {
        let dir = tempfile::tempdir().unwrap();
        let world = shared(World::new(1, 1));
        world.lock().set_speed(100);
        let source = "\
function stride()
  move()
end
function main()
  stride()
end";
        let program = load(&dir, source, &world);
        let main = program.entry_point().unwrap();
        let err = main.call::<()>(()).unwrap_err();
        let (classified, diagnostic) = diagnose(&program, &err).unwrap();

        assert_eq!(classified.kind(), "DomainPrecondition");
        assert!(diagnostic.contains("Traceback (most recent call last):"));
        // Outermost first: main's call before the failing line in stride.
        let call_site = diagnostic.find("line 5").expect("main frame");
        let fail_site = diagnostic.find("line 2").expect("stride frame");
        assert!(call_site < fail_site);
        assert!(diagnostic.contains("stride()"));
        assert!(diagnostic.contains("move()"));
        assert!(diagnostic.contains("DomainPrecondition:"));
        assert!(!diagnostic.contains("supervisor"));
    }

    #[test]
    fn unresolved_name_gets_a_suggestion() {
        let dir = tempfile::tempdir().unwrap();
        let world = shared(World::new(5, 5));
        let program = load(&dir, "function main() mvoe() end", &world);
        let err = run(&program).unwrap_err();
        match err {
            HostError::UnresolvedName { name, suggestion } => {
                assert_eq!(name, "mvoe");
                assert_eq!(suggestion.as_deref(), Some("move"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn suggestion_appears_in_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        let world = shared(World::new(5, 5));
        let program = load(&dir, "function main() turn_lefft() end", &world);
        let main = program.entry_point().unwrap();
        let err = main.call::<()>(()).unwrap_err();
        let (_, diagnostic) = diagnose(&program, &err).unwrap();
        assert!(diagnostic.contains("UnresolvedName:"));
        assert!(diagnostic.contains("Did you mean \"turn_left\"?"));
    }

    #[test]
    fn plain_lua_error_is_general_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let world = shared(World::new(5, 5));
        let program = load(&dir, "function main() error(\"oops\") end", &world);
        let err = run(&program).unwrap_err();
        assert!(matches!(err, HostError::GeneralRuntime(_)));
        assert!(err.to_string().contains("oops"));
    }

    #[test]
    fn dependency_frames_are_filtered_out() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("buddy.lua"),
            "local M = {}\nfunction M.charge() move() end\nreturn M",
        )
        .unwrap();
        let world = shared(World::new(1, 1));
        world.lock().set_speed(100);
        let source = "\
local buddy = require(\"buddy\")
function main()
  buddy.charge()
end";
        let program = load(&dir, source, &world);
        let main = program.entry_point().unwrap();
        let err = main.call::<()>(()).unwrap_err();
        let (_, diagnostic) = diagnose(&program, &err).unwrap();
        assert!(diagnostic.contains("prog.lua"));
        assert!(!diagnostic.contains("buddy.lua"));
    }

    #[test]
    fn successful_program_produces_no_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        let world = shared(World::new(5, 5));
        world.lock().set_speed(100);
        let program = load(&dir, "function main() turn_left() end", &world);
        assert!(run(&program).is_ok());
    }
}
