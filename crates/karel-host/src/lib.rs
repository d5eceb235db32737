//! Program host for learner-written Karel programs.
//!
//! Learner programs are Lua files. The host loads one, binds the fixed
//! capability vocabulary into it, supervises the `main()` entry point, and
//! turns failures into diagnostics showing only the learner's own frames.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                HostController                       │
//! │   run / reset / load-world command dispatch         │
//! │  ┌───────────────────────────────────────────────┐  │
//! │  │ ProgramLoader ──► LoadedProgram (fresh Lua VM) │  │
//! │  │   require() resolves sibling units             │  │
//! │  └───────────────────────────────────────────────┘  │
//! │                        │ bind                       │
//! │  ┌───────────────────────────────────────────────┐  │
//! │  │ capability vocabulary (globals)                │  │
//! │  │   queries ──► World directly                   │  │
//! │  │   mutators ──► intercepted: act, refresh view, │  │
//! │  │               pacing delay (1 - speed/100)s    │  │
//! │  └───────────────────────────────────────────────┘  │
//! │                        │ run                        │
//! │  ┌───────────────────────────────────────────────┐  │
//! │  │ supervisor: classify failure, filter traceback │  │
//! │  │ to the learner's unit, emit diagnostic         │  │
//! │  └───────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Example program
//!
//! ```lua
//! -- hurdles.lua
//! function jump()
//!     turn_left()
//!     move()
//!     turn_left()
//!     turn_left()
//!     turn_left()
//! end
//!
//! function main()
//!     while front_is_clear() do
//!         move()
//!     end
//!     jump()
//! end
//! ```

mod bind;
mod controller;
mod error;
mod intercept;
mod loader;
mod suggest;
mod supervisor;
mod traceback;

use karel_world::World;
use parking_lot::Mutex;
use std::sync::Arc;

pub use bind::{MUTATORS, VOCABULARY};
pub use controller::{HostController, RunOutcome};
pub use error::HostError;
pub use intercept::{pacing_delay, NullView, WorldView};
pub use loader::{LoadedProgram, ProgramLoader};
pub use suggest::did_you_mean;
pub use supervisor::{diagnose, run};

/// World state shared between the host and the Lua capability closures.
pub type SharedWorld = Arc<Mutex<World>>;

/// Visualization hook shared with the intercepted mutators.
pub type SharedView = Arc<Mutex<Box<dyn WorldView>>>;
