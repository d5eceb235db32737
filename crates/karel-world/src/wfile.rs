//! World file parsing.
//!
//! A world file is a plain-text list of declarations, one per line.
//! Keys are case-insensitive; blank lines are skipped.
//!
//! ```text
//! Dimension: (10, 10)
//! Wall: (3, 1); north
//! Beeper: (2, 1) 3
//! Karel: (1, 1); east
//! Color: (5, 5); blue
//! Speed: 75
//! BeeperBag: INFINITY
//! ```
//!
//! `Dimension` is required and must precede any declaration that names a
//! corner. Robot defaults to `(1, 1)` facing east, speed to 50, bag to 0.

use crate::color::Color;
use crate::direction::Direction;
use crate::error::KarelError;
use crate::world::{BeeperBag, Wall, World};
use regex::Regex;

/// Compiled line patterns, built once per parse.
struct Patterns {
    /// `(a, s)`
    pair: Regex,
    /// `(a, s); word`
    pair_word: Regex,
    /// `(a, s) n`
    pair_count: Regex,
}

impl Patterns {
    fn new() -> Self {
        Self {
            pair: Regex::new(r"^\(\s*(\d+)\s*,\s*(\d+)\s*\)$").expect("static regex"),
            pair_word: Regex::new(r"^\(\s*(\d+)\s*,\s*(\d+)\s*\)\s*;\s*(\w+)$")
                .expect("static regex"),
            pair_count: Regex::new(r"^\(\s*(\d+)\s*,\s*(\d+)\s*\)\s+(\d+)$")
                .expect("static regex"),
        }
    }
}

/// Parses world file source text.
///
/// # Errors
///
/// Returns [`KarelError::MissingDimension`] when no `Dimension:` line
/// exists, or [`KarelError::MalformedWorldFile`] naming the first bad line.
pub fn parse(source: &str) -> Result<World, KarelError> {
    let patterns = Patterns::new();

    let mut world: Option<World> = None;
    // First pass: the dimension line establishes the grid.
    for (idx, raw) in source.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let (key, value) = split_declaration(idx + 1, line)?;
        if key == "dimension" {
            let (avenues, streets) = parse_pair(&patterns, idx + 1, &value)?;
            if avenues < 1 || streets < 1 {
                return Err(malformed(idx + 1, "dimensions must be at least 1x1"));
            }
            world = Some(World::new(avenues, streets));
            break;
        }
    }
    let mut world = world.ok_or(KarelError::MissingDimension)?;

    // Second pass: apply everything else in order.
    for (idx, raw) in source.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let (key, value) = split_declaration(line_no, line)?;
        match key.as_str() {
            "dimension" => {}
            "wall" => {
                let (avenue, street, word) = parse_pair_word(&patterns, line_no, &value)?;
                let direction = parse_at(line_no, word.parse::<Direction>())?;
                check_bounds(&world, line_no, avenue, street)?;
                world.add_wall(Wall {
                    avenue,
                    street,
                    direction,
                });
            }
            "karel" => {
                let (avenue, street, word) = parse_pair_word(&patterns, line_no, &value)?;
                let direction = parse_at(line_no, word.parse::<Direction>())?;
                check_bounds(&world, line_no, avenue, street)?;
                world
                    .place_robot(avenue, street, direction)
                    .map_err(|e| malformed(line_no, &e.to_string()))?;
            }
            "beeper" => {
                let caps = patterns
                    .pair_count
                    .captures(&value)
                    .ok_or_else(|| malformed(line_no, "expected `(avenue, street) count`"))?;
                let avenue = parse_number(line_no, &caps[1])?;
                let street = parse_number(line_no, &caps[2])?;
                let count: u32 = caps[3]
                    .parse()
                    .map_err(|_| malformed(line_no, "beeper count out of range"))?;
                check_bounds(&world, line_no, avenue, street)?;
                world.set_beepers(avenue, street, count);
            }
            "color" => {
                let (avenue, street, word) = parse_pair_word(&patterns, line_no, &value)?;
                let color = parse_at(line_no, word.parse::<Color>())?;
                check_bounds(&world, line_no, avenue, street)?;
                world.set_corner_color(avenue, street, color);
            }
            "speed" => {
                let speed: u8 = value
                    .parse()
                    .map_err(|_| malformed(line_no, "speed must be an integer 0-100"))?;
                if speed > 100 {
                    return Err(malformed(line_no, "speed must be an integer 0-100"));
                }
                world.set_speed(speed);
            }
            "beeperbag" => {
                if value.eq_ignore_ascii_case("infinity") || value.eq_ignore_ascii_case("infinite")
                {
                    world.set_beeper_bag(BeeperBag::Infinite);
                } else {
                    let count: u32 = value
                        .parse()
                        .map_err(|_| malformed(line_no, "expected a count or INFINITY"))?;
                    world.set_beeper_bag(BeeperBag::Finite(count));
                }
            }
            other => {
                return Err(malformed(line_no, &format!("unknown declaration `{other}`")));
            }
        }
    }

    Ok(world)
}

fn split_declaration(line_no: usize, line: &str) -> Result<(String, String), KarelError> {
    let (key, value) = line
        .split_once(':')
        .ok_or_else(|| malformed(line_no, "expected `Key: value`"))?;
    Ok((
        key.trim().to_ascii_lowercase(),
        value.trim().to_string(),
    ))
}

fn parse_pair(patterns: &Patterns, line_no: usize, value: &str) -> Result<(i32, i32), KarelError> {
    let caps = patterns
        .pair
        .captures(value)
        .ok_or_else(|| malformed(line_no, "expected `(avenue, street)`"))?;
    Ok((
        parse_number(line_no, &caps[1])?,
        parse_number(line_no, &caps[2])?,
    ))
}

fn parse_pair_word(
    patterns: &Patterns,
    line_no: usize,
    value: &str,
) -> Result<(i32, i32, String), KarelError> {
    let caps = patterns
        .pair_word
        .captures(value)
        .ok_or_else(|| malformed(line_no, "expected `(avenue, street); word`"))?;
    Ok((
        parse_number(line_no, &caps[1])?,
        parse_number(line_no, &caps[2])?,
        caps[3].to_string(),
    ))
}

fn parse_number(line_no: usize, digits: &str) -> Result<i32, KarelError> {
    digits
        .parse()
        .map_err(|_| malformed(line_no, "coordinate out of range"))
}

fn parse_at<T>(line_no: usize, result: Result<T, KarelError>) -> Result<T, KarelError> {
    result.map_err(|e| malformed(line_no, &e.to_string()))
}

fn check_bounds(world: &World, line_no: usize, avenue: i32, street: i32) -> Result<(), KarelError> {
    if world.in_bounds(avenue, street) {
        Ok(())
    } else {
        Err(malformed(
            line_no,
            &format!("corner ({avenue}, {street}) is outside the world"),
        ))
    }
}

fn malformed(line: usize, reason: &str) -> KarelError {
    KarelError::MalformedWorldFile {
        line,
        reason: reason.to_string(),
    }
}
