//! World and robot model for the Karel program host.
//!
//! This crate owns everything the hosted program acts upon: the grid
//! (avenues × streets, 1-based corners), walls, beepers, corner colors,
//! the robot's pose and beeper bag, and the pacing speed. Every action a
//! program can take maps to one method on [`World`]; the legality rules
//! live here as well, surfaced as [`KarelError`] values.
//!
//! # Coordinate System
//!
//! Corners are addressed as `(avenue, street)`, both starting at 1 in the
//! south-west corner. Avenues run east, streets run north.
//!
//! # Example
//!
//! ```
//! use karel_world::{Direction, World};
//!
//! let mut world = World::new(5, 5);
//! assert_eq!(world.robot_position(), (1, 1));
//! assert_eq!(world.facing(), Direction::East);
//!
//! world.move_forward().unwrap();
//! assert_eq!(world.robot_position(), (2, 1));
//! ```

mod color;
mod direction;
mod error;
mod wfile;
mod world;

pub use color::Color;
pub use direction::Direction;
pub use error::KarelError;
pub use world::{BeeperBag, Wall, World, DEFAULT_SPEED, MAX_SPEED};
