//! Corner paint colors.

use crate::error::KarelError;
use std::fmt;
use std::str::FromStr;

/// The fixed paint palette for `paint_corner` / `corner_color_is`.
///
/// `Blank` means an unpainted corner; painting with it erases paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Black,
    Cyan,
    DarkGray,
    Gray,
    Green,
    LightGray,
    Magenta,
    Orange,
    Pink,
    Purple,
    White,
    Blue,
    Yellow,
    Blank,
}

impl Color {
    /// Every palette entry, `Blank` included.
    pub const ALL: [Color; 15] = [
        Color::Red,
        Color::Black,
        Color::Cyan,
        Color::DarkGray,
        Color::Gray,
        Color::Green,
        Color::LightGray,
        Color::Magenta,
        Color::Orange,
        Color::Pink,
        Color::Purple,
        Color::White,
        Color::Blue,
        Color::Yellow,
        Color::Blank,
    ];
}

impl FromStr for Color {
    type Err = KarelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" => Ok(Self::Red),
            "black" => Ok(Self::Black),
            "cyan" => Ok(Self::Cyan),
            "dark_gray" | "darkgray" => Ok(Self::DarkGray),
            "gray" => Ok(Self::Gray),
            "green" => Ok(Self::Green),
            "light_gray" | "lightgray" => Ok(Self::LightGray),
            "magenta" => Ok(Self::Magenta),
            "orange" => Ok(Self::Orange),
            "pink" => Ok(Self::Pink),
            "purple" => Ok(Self::Purple),
            "white" => Ok(Self::White),
            "blue" => Ok(Self::Blue),
            "yellow" => Ok(Self::Yellow),
            "blank" | "" => Ok(Self::Blank),
            other => Err(KarelError::InvalidColor(other.to_string())),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Red => "red",
            Self::Black => "black",
            Self::Cyan => "cyan",
            Self::DarkGray => "dark_gray",
            Self::Gray => "gray",
            Self::Green => "green",
            Self::LightGray => "light_gray",
            Self::Magenta => "magenta",
            Self::Orange => "orange",
            Self::Pink => "pink",
            Self::Purple => "purple",
            Self::White => "white",
            Self::Blue => "blue",
            Self::Yellow => "yellow",
            Self::Blank => "blank",
        };
        write!(f, "{name}")
    }
}
