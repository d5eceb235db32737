//! Compass directions on the grid.

use crate::error::KarelError;
use std::fmt;
use std::str::FromStr;

/// One of the four compass directions the robot can face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// The direction after a 90° left turn.
    #[must_use]
    pub fn left(self) -> Self {
        match self {
            Self::North => Self::West,
            Self::West => Self::South,
            Self::South => Self::East,
            Self::East => Self::North,
        }
    }

    /// The direction after a 90° right turn.
    #[must_use]
    pub fn right(self) -> Self {
        self.left().left().left()
    }

    /// The opposite direction.
    #[must_use]
    pub fn opposite(self) -> Self {
        self.left().left()
    }

    /// Unit step `(avenue, street)` for one move in this direction.
    #[must_use]
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, 1),
            Self::South => (0, -1),
            Self::East => (1, 0),
            Self::West => (-1, 0),
        }
    }
}

impl FromStr for Direction {
    type Err = KarelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "north" => Ok(Self::North),
            "south" => Ok(Self::South),
            "east" => Ok(Self::East),
            "west" => Ok(Self::West),
            other => Err(KarelError::InvalidDirection(other.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::North => "north",
            Self::South => "south",
            Self::East => "east",
            Self::West => "west",
        };
        write!(f, "{name}")
    }
}
