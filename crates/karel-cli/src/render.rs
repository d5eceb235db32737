//! Plain-text world rendering.
//!
//! One frame per refresh, drawn top-down so street numbers grow upward,
//! the way world files describe them. Each corner shows one glyph: the
//! robot's heading, a beeper count, a paint initial, or a dot. Walls
//! appear as `|` between corners and `-` rows between streets.

use karel_host::WorldView;
use karel_world::{BeeperBag, Color, Direction, World};
use std::io::Write;

/// Draws each frame to a writer (stdout in the binary).
pub struct AsciiRenderer<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> AsciiRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write + Send> WorldView for AsciiRenderer<W> {
    fn refresh(&mut self, world: &World) {
        // Rendering must never fail a run; a broken pipe just stops frames.
        let _ = writeln!(self.out, "\n{}", render(world));
        let _ = self.out.flush();
    }
}

/// Renders one frame of the world.
#[must_use]
pub fn render(world: &World) -> String {
    let mut out = String::new();
    for street in (1..=world.streets()).rev() {
        let mut row = String::new();
        for avenue in 1..=world.avenues() {
            row.push(glyph(world, avenue, street));
            if avenue < world.avenues() {
                let wall = world.is_blocked(avenue, street, Direction::East);
                row.push(if wall { '|' } else { ' ' });
            }
        }
        out.push_str(row.trim_end());
        out.push('\n');
        if street > 1 {
            let mut under = String::new();
            for avenue in 1..=world.avenues() {
                let wall = world.is_blocked(avenue, street, Direction::South);
                under.push(if wall { '-' } else { ' ' });
                if avenue < world.avenues() {
                    under.push(' ');
                }
            }
            let under = under.trim_end();
            if !under.is_empty() {
                out.push_str(under);
                out.push('\n');
            }
        }
    }
    out.push_str(&status_line(world));
    out
}

fn glyph(world: &World, avenue: i32, street: i32) -> char {
    if world.robot_position() == (avenue, street) {
        return match world.facing() {
            Direction::North => '^',
            Direction::South => 'v',
            Direction::East => '>',
            Direction::West => '<',
        };
    }
    let beepers = world.beeper_count(avenue, street);
    if beepers > 0 {
        return char::from_digit(beepers.min(9), 10).unwrap_or('9');
    }
    let color = world.corner_color(avenue, street);
    if color != Color::Blank {
        return color
            .to_string()
            .chars()
            .next()
            .map_or('.', |c| c.to_ascii_uppercase());
    }
    '.'
}

fn status_line(world: &World) -> String {
    let bag = match world.beeper_bag() {
        BeeperBag::Infinite => "inf".to_string(),
        BeeperBag::Finite(n) => n.to_string(),
    };
    format!("speed: {}  bag: {}", world.speed(), bag)
}
