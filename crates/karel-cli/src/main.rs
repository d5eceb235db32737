//! Karel CLI - terminal host for learner programs.
//!
//! Points the program host at one Lua file and drives it interactively:
//! `run` reloads the file from disk every time, so the edit-save-rerun
//! loop needs no restart. `reset` restores the pristine world and `world`
//! swaps in a different world file.

mod render;

use anyhow::Result;
use clap::Parser;
use karel_host::{HostController, RunOutcome};
use karel_world::{BeeperBag, World, MAX_SPEED};
use render::AsciiRenderer;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Karel CLI - terminal host for learner programs
#[derive(Parser, Debug)]
#[command(name = "karel")]
#[command(version, about, long_about = None)]
struct Args {
    /// Learner program to host (a Lua file)
    program: PathBuf,

    /// World file to load (defaults to an empty 10x10 world)
    #[arg(short, long)]
    world: Option<PathBuf>,

    /// Pacing speed override, 0 (slowest) to 100 (no delay)
    #[arg(short, long)]
    speed: Option<u8>,

    /// Run the program once and exit instead of starting the prompt
    #[arg(long)]
    once: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Terminal filter: --debug > --verbose > RUST_LOG env > default "warn"
    let filter = if args.debug {
        EnvFilter::new("debug,rustyline=warn")
    } else if args.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_filter(filter))
        .init();

    let mut world = match &args.world {
        Some(path) => World::from_file(path)
            .map_err(|e| anyhow::anyhow!("cannot load world {}: {e}", path.display()))?,
        None => {
            let mut world = World::new(10, 10);
            world.set_beeper_bag(BeeperBag::Infinite);
            world
        }
    };
    if let Some(speed) = args.speed {
        world.set_speed(speed.min(MAX_SPEED));
    }

    info!(program = %args.program.display(), "hosting program");

    let renderer = AsciiRenderer::new(std::io::stdout());
    let mut controller = HostController::new(args.program.clone(), world, Box::new(renderer));

    if args.once {
        return run_once(&controller);
    }

    println!("Karel CLI v{}", env!("CARGO_PKG_VERSION"));
    println!("Hosting {}", args.program.display());
    controller.redraw();
    repl(&mut controller)
}

/// One-shot mode. A run failure was already reported through the
/// diagnostic and the notice, so only load failures exit non-zero.
fn run_once(controller: &HostController) -> Result<()> {
    controller.run_program()?;
    Ok(())
}

fn repl(controller: &mut HostController) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline("karel> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);
                if !dispatch(controller, line) {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Handles one prompt line. Returns `false` to leave the loop.
fn dispatch(controller: &mut HostController, line: &str) -> bool {
    let (command, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(c, r)| (c, r.trim()));

    match command {
        "run" | "r" => match controller.run_program() {
            Ok(RunOutcome::Completed) => println!("Finished running."),
            Ok(RunOutcome::Failed(_)) => {}
            Err(e) => eprintln!("Error: {e}"),
        },
        "reset" => controller.reset_world(),
        "world" | "w" => {
            if rest.is_empty() {
                eprintln!("Usage: world <path>");
            } else if let Err(e) = controller.load_world(&PathBuf::from(rest)) {
                eprintln!("Error: {e}");
            }
        }
        "speed" => match rest.parse::<u8>() {
            Ok(speed) => controller.world().lock().set_speed(speed.min(MAX_SPEED)),
            Err(_) => eprintln!("Usage: speed <0-100>"),
        },
        "show" => controller.redraw(),
        "help" | "?" => print_help(),
        "quit" | "exit" | "q" => return false,
        other => eprintln!("Unknown command: {other} (try 'help')"),
    }
    true
}

fn print_help() {
    println!(
        "\
Commands:
  run            reload the program from disk and run main()
  reset          restore the world to its pristine state
  world <path>   load a different world file
  speed <0-100>  change pacing (100 = no delay; reset restores the original)
  show           redraw the world
  quit           leave"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use karel_host::WorldView;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingView(Arc<AtomicUsize>);

    impl WorldView for CountingView {
        fn refresh(&mut self, _world: &World) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn controller_with(source: &str) -> (HostController, Arc<AtomicUsize>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prog.lua");
        std::fs::write(&path, source).unwrap();
        let mut world = World::new(5, 5);
        world.set_speed(MAX_SPEED);
        let refreshes = Arc::new(AtomicUsize::new(0));
        let view = Box::new(CountingView(Arc::clone(&refreshes)));
        (HostController::new(path, world, view), refreshes, dir)
    }

    #[test]
    fn args_are_well_formed() {
        use clap::CommandFactory;
        // Catches flag collisions (notably against the generated -V/--version).
        Args::command().debug_assert();
    }

    #[test]
    fn verbose_short_flag_is_lowercase() {
        let args = Args::parse_from(["karel", "-v", "prog.lua"]);
        assert!(args.verbose);
        assert!(!args.debug);
    }

    #[test]
    fn once_mode_is_clean_after_a_reported_run_failure() {
        let (controller, _, _dir) = controller_with(
            "function main()\n  while true do move() end\nend",
        );
        // The failure was handled and reported; the exit stays clean.
        assert!(run_once(&controller).is_ok());
    }

    #[test]
    fn once_mode_fails_on_a_load_failure() {
        let (controller, _, _dir) = controller_with("function main( end");
        assert!(run_once(&controller).is_err());
    }

    #[test]
    fn run_command_executes_the_program() {
        let (mut controller, _, _dir) = controller_with("function main() move() end");
        assert!(dispatch(&mut controller, "run"));
        assert_eq!(controller.world().lock().robot_position(), (2, 1));
    }

    #[test]
    fn reset_command_restores_the_world() {
        let (mut controller, _, _dir) = controller_with("function main() move() end");
        dispatch(&mut controller, "run");
        dispatch(&mut controller, "reset");
        assert_eq!(controller.world().lock().robot_position(), (1, 1));
    }

    #[test]
    fn speed_command_clamps_to_maximum() {
        let (mut controller, _, _dir) = controller_with("function main() end");
        dispatch(&mut controller, "speed 250");
        assert_eq!(controller.world().lock().speed(), MAX_SPEED);
    }

    #[test]
    fn bad_speed_is_rejected_without_change() {
        let (mut controller, _, _dir) = controller_with("function main() end");
        dispatch(&mut controller, "speed fast");
        assert_eq!(controller.world().lock().speed(), MAX_SPEED);
    }

    #[test]
    fn world_command_loads_a_world_file() {
        let (mut controller, _, dir) = controller_with("function main() end");
        let world_path = dir.path().join("maze.w");
        std::fs::write(&world_path, "Dimension: (8, 4)\n").unwrap();
        dispatch(&mut controller, &format!("world {}", world_path.display()));
        assert_eq!(controller.world().lock().avenues(), 8);
    }

    #[test]
    fn show_command_redraws() {
        let (mut controller, refreshes, _dir) = controller_with("function main() end");
        dispatch(&mut controller, "show");
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn quit_leaves_the_loop() {
        let (mut controller, _, _dir) = controller_with("function main() end");
        assert!(!dispatch(&mut controller, "quit"));
        assert!(!dispatch(&mut controller, "q"));
        assert!(dispatch(&mut controller, "nonsense"));
    }
}
