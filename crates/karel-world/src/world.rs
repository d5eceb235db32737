//! The grid world, the robot that lives in it, and the action legality rules.

use crate::color::Color;
use crate::direction::Direction;
use crate::error::KarelError;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Default pacing speed when a world file does not declare one.
pub const DEFAULT_SPEED: u8 = 50;

/// Maximum pacing speed. At this speed actions incur no delay.
pub const MAX_SPEED: u8 = 100;

/// A wall segment on one edge of a corner.
///
/// A wall blocks movement across its edge from both sides, so
/// `Wall { 2, 1, North }` also blocks southward movement from `(2, 2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Wall {
    pub avenue: i32,
    pub street: i32,
    pub direction: Direction,
}

/// The robot's beeper bag: a finite count or a bottomless supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeeperBag {
    Finite(u32),
    Infinite,
}

impl BeeperBag {
    /// True if at least one beeper can be put down.
    #[must_use]
    pub fn has_beepers(self) -> bool {
        match self {
            Self::Finite(n) => n > 0,
            Self::Infinite => true,
        }
    }
}

/// The simulated world: grid geometry, walls, beepers, paint, robot pose,
/// beeper bag, and pacing speed.
///
/// All hosted-program actions are methods here. Mutators return
/// `Result<(), KarelError>` so a precondition violation surfaces as a value
/// the host can classify; queries are pure and infallible.
///
/// `World` is `Clone`: reset and reload are implemented by the host as
/// "replace with a pristine clone", never by in-place repair.
#[derive(Debug, Clone)]
pub struct World {
    avenues: i32,
    streets: i32,
    walls: HashSet<Wall>,
    beepers: HashMap<(i32, i32), u32>,
    colors: HashMap<(i32, i32), Color>,
    robot_avenue: i32,
    robot_street: i32,
    robot_direction: Direction,
    bag: BeeperBag,
    speed: u8,
}

impl World {
    /// Creates an empty world of the given size with the robot at `(1, 1)`
    /// facing east, an empty bag, and the default speed.
    ///
    /// Dimensions are clamped to at least 1×1.
    #[must_use]
    pub fn new(avenues: i32, streets: i32) -> Self {
        Self {
            avenues: avenues.max(1),
            streets: streets.max(1),
            walls: HashSet::new(),
            beepers: HashMap::new(),
            colors: HashMap::new(),
            robot_avenue: 1,
            robot_street: 1,
            robot_direction: Direction::East,
            bag: BeeperBag::Finite(0),
            speed: DEFAULT_SPEED,
        }
    }

    /// Loads a world from a `.w` file.
    ///
    /// # Errors
    ///
    /// Returns [`KarelError::WorldFileNotFound`] if the file cannot be read,
    /// or a parse error describing the offending line.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, KarelError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|_| KarelError::WorldFileNotFound(path.display().to_string()))?;
        let world = crate::wfile::parse(&source)?;
        tracing::debug!(path = %path.display(), "loaded world file");
        Ok(world)
    }

    // === Geometry ===

    #[must_use]
    pub fn avenues(&self) -> i32 {
        self.avenues
    }

    #[must_use]
    pub fn streets(&self) -> i32 {
        self.streets
    }

    /// True if `(avenue, street)` is a corner inside the grid.
    #[must_use]
    pub fn in_bounds(&self, avenue: i32, street: i32) -> bool {
        (1..=self.avenues).contains(&avenue) && (1..=self.streets).contains(&street)
    }

    /// Adds a wall segment. Out-of-bounds walls are ignored.
    pub fn add_wall(&mut self, wall: Wall) {
        if self.in_bounds(wall.avenue, wall.street) {
            self.walls.insert(wall);
        }
    }

    /// True if movement from `(avenue, street)` toward `direction` is
    /// blocked by the boundary or a wall on either side of the edge.
    #[must_use]
    pub fn is_blocked(&self, avenue: i32, street: i32, direction: Direction) -> bool {
        let (da, ds) = direction.delta();
        let (next_avenue, next_street) = (avenue + da, street + ds);
        if !self.in_bounds(next_avenue, next_street) {
            return true;
        }
        self.walls.contains(&Wall {
            avenue,
            street,
            direction,
        }) || self.walls.contains(&Wall {
            avenue: next_avenue,
            street: next_street,
            direction: direction.opposite(),
        })
    }

    // === Robot pose ===

    #[must_use]
    pub fn robot_position(&self) -> (i32, i32) {
        (self.robot_avenue, self.robot_street)
    }

    #[must_use]
    pub fn facing(&self) -> Direction {
        self.robot_direction
    }

    /// Places the robot. Out-of-bounds positions are rejected.
    pub fn place_robot(
        &mut self,
        avenue: i32,
        street: i32,
        direction: Direction,
    ) -> Result<(), KarelError> {
        if !self.in_bounds(avenue, street) {
            return Err(KarelError::MalformedWorldFile {
                line: 0,
                reason: format!("robot position ({avenue}, {street}) is outside the world"),
            });
        }
        self.robot_avenue = avenue;
        self.robot_street = street;
        self.robot_direction = direction;
        Ok(())
    }

    // === Beepers, bag, paint ===

    #[must_use]
    pub fn beeper_count(&self, avenue: i32, street: i32) -> u32 {
        self.beepers.get(&(avenue, street)).copied().unwrap_or(0)
    }

    /// Sets the beeper count on a corner (world setup, not a robot action).
    pub fn set_beepers(&mut self, avenue: i32, street: i32, count: u32) {
        if count == 0 {
            self.beepers.remove(&(avenue, street));
        } else {
            self.beepers.insert((avenue, street), count);
        }
    }

    #[must_use]
    pub fn beeper_bag(&self) -> BeeperBag {
        self.bag
    }

    pub fn set_beeper_bag(&mut self, bag: BeeperBag) {
        self.bag = bag;
    }

    /// The paint on a corner; `Color::Blank` for an unpainted one.
    #[must_use]
    pub fn corner_color(&self, avenue: i32, street: i32) -> Color {
        self.colors
            .get(&(avenue, street))
            .copied()
            .unwrap_or(Color::Blank)
    }

    /// Paints a corner during world setup.
    pub fn set_corner_color(&mut self, avenue: i32, street: i32, color: Color) {
        if color == Color::Blank {
            self.colors.remove(&(avenue, street));
        } else {
            self.colors.insert((avenue, street), color);
        }
    }

    // === Pacing ===

    /// The pacing speed, 0–100. Read fresh by the host on every
    /// intercepted action.
    #[must_use]
    pub fn speed(&self) -> u8 {
        self.speed
    }

    /// Sets the pacing speed, clamped to [`MAX_SPEED`].
    pub fn set_speed(&mut self, speed: u8) {
        self.speed = speed.min(MAX_SPEED);
    }

    // === Mutating capabilities ===

    /// Moves the robot one corner forward.
    ///
    /// # Errors
    ///
    /// [`KarelError::FrontBlocked`] against a wall or the boundary.
    pub fn move_forward(&mut self) -> Result<(), KarelError> {
        if self.front_is_blocked() {
            return Err(KarelError::FrontBlocked);
        }
        let (da, ds) = self.robot_direction.delta();
        self.robot_avenue += da;
        self.robot_street += ds;
        Ok(())
    }

    /// Rotates the robot 90° counterclockwise. Always legal; returns
    /// `Result` to share the mutating-capability signature.
    pub fn turn_left(&mut self) -> Result<(), KarelError> {
        self.robot_direction = self.robot_direction.left();
        Ok(())
    }

    /// Picks one beeper from the current corner into the bag.
    ///
    /// # Errors
    ///
    /// [`KarelError::NoBeeperOnCorner`] if the corner has none.
    pub fn pick_beeper(&mut self) -> Result<(), KarelError> {
        let key = (self.robot_avenue, self.robot_street);
        match self.beepers.get_mut(&key) {
            Some(count) if *count > 0 => {
                *count -= 1;
                if *count == 0 {
                    self.beepers.remove(&key);
                }
            }
            _ => return Err(KarelError::NoBeeperOnCorner),
        }
        if let BeeperBag::Finite(n) = self.bag {
            self.bag = BeeperBag::Finite(n.saturating_add(1));
        }
        Ok(())
    }

    /// Puts one beeper from the bag onto the current corner.
    ///
    /// # Errors
    ///
    /// [`KarelError::EmptyBeeperBag`] if the bag is empty.
    pub fn put_beeper(&mut self) -> Result<(), KarelError> {
        match self.bag {
            BeeperBag::Finite(0) => return Err(KarelError::EmptyBeeperBag),
            BeeperBag::Finite(n) => self.bag = BeeperBag::Finite(n - 1),
            BeeperBag::Infinite => {}
        }
        let count = self
            .beepers
            .entry((self.robot_avenue, self.robot_street))
            .or_insert(0);
        *count = count.saturating_add(1);
        Ok(())
    }

    /// Paints the current corner. Always legal; `Color::Blank` erases.
    pub fn paint_corner(&mut self, color: Color) -> Result<(), KarelError> {
        self.set_corner_color(self.robot_avenue, self.robot_street, color);
        Ok(())
    }

    // === Queries ===

    #[must_use]
    pub fn front_is_clear(&self) -> bool {
        !self.is_blocked(self.robot_avenue, self.robot_street, self.robot_direction)
    }

    #[must_use]
    pub fn front_is_blocked(&self) -> bool {
        !self.front_is_clear()
    }

    #[must_use]
    pub fn left_is_clear(&self) -> bool {
        !self.is_blocked(
            self.robot_avenue,
            self.robot_street,
            self.robot_direction.left(),
        )
    }

    #[must_use]
    pub fn right_is_clear(&self) -> bool {
        !self.is_blocked(
            self.robot_avenue,
            self.robot_street,
            self.robot_direction.right(),
        )
    }

    #[must_use]
    pub fn beepers_present(&self) -> bool {
        self.beeper_count(self.robot_avenue, self.robot_street) > 0
    }

    #[must_use]
    pub fn beepers_in_bag(&self) -> bool {
        self.bag.has_beepers()
    }

    /// True if the current corner carries exactly `color` (with
    /// `Color::Blank` matching unpainted corners).
    #[must_use]
    pub fn corner_color_is(&self, color: Color) -> bool {
        self.corner_color(self.robot_avenue, self.robot_street) == color
    }

    /// Iterates all wall segments (for rendering).
    pub fn walls(&self) -> impl Iterator<Item = &Wall> {
        self.walls.iter()
    }
}
