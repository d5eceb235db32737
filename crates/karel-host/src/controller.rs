//! Host command dispatch: run, reset, load-world.
//!
//! The controller owns the shared world, a pristine copy for resets, the
//! program path, and the injected visualization hook. Each run rebuilds
//! the loaded program from disk so saved edits take effect without
//! restarting the host.

use crate::error::HostError;
use crate::intercept::WorldView;
use crate::loader::ProgramLoader;
use crate::{supervisor, SharedView, SharedWorld};
use karel_world::{KarelError, World};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What happened during one supervised run.
#[derive(Debug)]
pub enum RunOutcome {
    /// The entry point returned normally.
    Completed,
    /// The run failed with a recognized, recoverable error. The
    /// diagnostic has already been emitted and the user notified.
    Failed(HostError),
}

/// Dispatches run / reset / load-world commands against one program file.
pub struct HostController {
    program_path: PathBuf,
    world: SharedWorld,
    pristine: World,
    view: SharedView,
}

impl HostController {
    /// Creates a controller for the program at `program_path`, running
    /// against `world` and drawing through `view`.
    #[must_use]
    pub fn new(program_path: PathBuf, world: World, view: Box<dyn WorldView>) -> Self {
        Self {
            program_path,
            pristine: world.clone(),
            world: Arc::new(Mutex::new(world)),
            view: Arc::new(Mutex::new(view)),
        }
    }

    /// Handle to the live world (shared with the capability bindings).
    #[must_use]
    pub fn world(&self) -> SharedWorld {
        Arc::clone(&self.world)
    }

    /// Redraws the current world state.
    ///
    /// Lock order is world before view, same as the interceptor and
    /// `reset_world`.
    pub fn redraw(&self) {
        let world = self.world.lock();
        self.view.lock().refresh(&world);
    }

    /// Runs the program: reload from disk, bind, supervise.
    ///
    /// Recoverable run failures are reported (diagnostic + notice) and
    /// returned as [`RunOutcome::Failed`]; the host stays alive.
    ///
    /// # Errors
    ///
    /// Load failures (`NotFound`, `SyntaxFailure`, `MissingEntryPoint`)
    /// and unclassified engine failures. These abort this attempt only;
    /// the caller decides whether to retry.
    #[tracing::instrument(skip(self), fields(program = %self.program_path.display()))]
    pub fn run_program(&self) -> Result<RunOutcome, HostError> {
        // Reload fresh every run so saved edits are picked up.
        let loader = ProgramLoader::new(Arc::clone(&self.world));
        let program = loader.load(&self.program_path)?;
        program.bind(&self.world, &self.view)?;

        match supervisor::run(&program) {
            Ok(()) => Ok(RunOutcome::Completed),
            Err(err) if err.is_recoverable() => {
                eprintln!("Karel crashed! Check the console for more details.");
                Ok(RunOutcome::Failed(err))
            }
            Err(err) => Err(err),
        }
    }

    /// Discards transient world state by restoring the pristine copy.
    pub fn reset_world(&self) {
        let mut world = self.world.lock();
        *world = self.pristine.clone();
        self.view.lock().refresh(&world);
        tracing::debug!("world reset");
    }

    /// Replaces both the live and pristine worlds from a world file.
    ///
    /// # Errors
    ///
    /// Parse failures leave the current world untouched.
    pub fn load_world(&mut self, path: &Path) -> Result<(), KarelError> {
        let fresh = World::from_file(path)?;
        self.pristine = fresh.clone();
        let mut world = self.world.lock();
        *world = fresh;
        self.view.lock().refresh(&world);
        tracing::info!(path = %path.display(), "world loaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts refreshes; stands in for the renderer.
    struct CountingView(Arc<AtomicUsize>);

    impl WorldView for CountingView {
        fn refresh(&mut self, _world: &World) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn controller_for(source: &str, world: World) -> (HostController, Arc<AtomicUsize>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prog.lua");
        std::fs::write(&path, source).unwrap();
        let refreshes = Arc::new(AtomicUsize::new(0));
        let view = Box::new(CountingView(Arc::clone(&refreshes)));
        (HostController::new(path, world, view), refreshes, dir)
    }

    #[test]
    fn run_completes_and_mutates_world() {
        let mut world = World::new(5, 5);
        world.set_speed(100);
        let (controller, _, _dir) = controller_for("function main() move() move() end", world);
        let outcome = controller.run_program().unwrap();
        assert!(matches!(outcome, RunOutcome::Completed));
        assert_eq!(controller.world().lock().robot_position(), (3, 1));
    }

    #[test]
    fn each_mutating_call_refreshes_once() {
        let mut world = World::new(5, 5);
        world.set_speed(100);
        let (controller, refreshes, _dir) = controller_for(
            "function main()\n  move()\n  turn_left()\n  front_is_clear()\nend",
            world,
        );
        controller.run_program().unwrap();
        // Two mutators, one query: exactly two refreshes.
        assert_eq!(refreshes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn queries_do_not_refresh() {
        let mut world = World::new(5, 5);
        world.set_speed(100);
        let (controller, refreshes, _dir) = controller_for(
            "function main()\n  for _ = 1, 50 do front_is_clear() end\nend",
            world,
        );
        controller.run_program().unwrap();
        assert_eq!(refreshes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn recoverable_failure_keeps_the_host_alive() {
        let mut world = World::new(1, 1);
        world.set_speed(100);
        let (controller, _, _dir) = controller_for("function main() move() end", world);
        let outcome = controller.run_program().unwrap();
        assert!(matches!(outcome, RunOutcome::Failed(_)));
        // A second run still works.
        let outcome = controller.run_program().unwrap();
        assert!(matches!(outcome, RunOutcome::Failed(_)));
    }

    #[test]
    fn load_failure_aborts_the_attempt_only() {
        let mut world = World::new(3, 3);
        world.set_speed(100);
        let (controller, _, dir) = controller_for("function main( end", world);
        assert!(matches!(
            controller.run_program(),
            Err(HostError::SyntaxFailure(_))
        ));
        // Fix the file; the next attempt succeeds.
        std::fs::write(dir.path().join("prog.lua"), "function main() move() end").unwrap();
        assert!(matches!(
            controller.run_program().unwrap(),
            RunOutcome::Completed
        ));
    }

    #[test]
    fn edits_are_picked_up_between_runs() {
        let mut world = World::new(5, 5);
        world.set_speed(100);
        let (controller, _, dir) = controller_for("function main() move() end", world);
        controller.run_program().unwrap();
        assert_eq!(controller.world().lock().robot_position(), (2, 1));

        std::fs::write(
            dir.path().join("prog.lua"),
            "function main() turn_left() end",
        )
        .unwrap();
        controller.reset_world();
        controller.run_program().unwrap();
        // Only the new behavior: turned, not moved.
        assert_eq!(controller.world().lock().robot_position(), (1, 1));
        assert_eq!(
            controller.world().lock().facing(),
            karel_world::Direction::North
        );
    }

    #[test]
    fn reset_restores_pristine_world_and_redraws() {
        let mut world = World::new(5, 5);
        world.set_speed(100);
        let (controller, refreshes, _dir) = controller_for("function main() move() end", world);
        controller.run_program().unwrap();
        assert_eq!(controller.world().lock().robot_position(), (2, 1));

        let before = refreshes.load(Ordering::SeqCst);
        controller.reset_world();
        assert_eq!(controller.world().lock().robot_position(), (1, 1));
        assert_eq!(refreshes.load(Ordering::SeqCst), before + 1);
    }

    #[test]
    fn load_world_replaces_live_and_pristine() {
        let (mut controller, _, dir) =
            controller_for("function main() end", World::new(2, 2));
        let world_path = dir.path().join("maze.w");
        std::fs::write(&world_path, "Dimension: (7, 3)\nKarel: (4, 2); north\n").unwrap();

        controller.load_world(&world_path).unwrap();
        assert_eq!(controller.world().lock().avenues(), 7);
        assert_eq!(controller.world().lock().robot_position(), (4, 2));

        // Reset now restores the loaded world, not the original one.
        controller.world().lock().turn_left().unwrap();
        controller.reset_world();
        assert_eq!(
            controller.world().lock().facing(),
            karel_world::Direction::North
        );
    }

    #[test]
    fn bad_world_file_leaves_current_world_alone() {
        let (mut controller, _, dir) =
            controller_for("function main() end", World::new(2, 2));
        let world_path = dir.path().join("bad.w");
        std::fs::write(&world_path, "Wall: (1, 1); north\n").unwrap();

        assert!(controller.load_world(&world_path).is_err());
        assert_eq!(controller.world().lock().avenues(), 2);
    }
}
