//! Lua traceback parsing and unit filtering.
//!
//! A Lua traceback looks like:
//!
//! ```text
//! stack traceback:
//!         [C]: in function 'move'
//!         hurdles.lua:7: in function 'jump'
//!         hurdles.lua:12: in function 'main'
//!         [C]: in ?
//! ```
//!
//! Frames are listed innermost first. We keep only frames whose chunk
//! identity matches the learner's primary unit and flip them to
//! outermost-first, so the printed diagnostic reads top-down and ends at
//! the line of the failing call.

use regex::Regex;

/// One retained call-stack entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StackFrame {
    pub unit: String,
    pub line: usize,
}

/// Parses a traceback, retaining only frames from `unit`, ordered
/// outermost first.
pub(crate) fn frames_for_unit(traceback: &str, unit: &str) -> Vec<StackFrame> {
    // `[C]` frames never match: the chunk part may not contain a colon.
    let frame_re = Regex::new(r"(?m)^\s*([^\s:][^:]*):(\d+):").expect("static regex");

    let mut frames: Vec<StackFrame> = frame_re
        .captures_iter(traceback)
        .filter_map(|caps| {
            let frame_unit = caps.get(1)?.as_str();
            if frame_unit != unit {
                return None;
            }
            let line: usize = caps.get(2)?.as_str().parse().ok()?;
            Some(StackFrame {
                unit: frame_unit.to_string(),
                line,
            })
        })
        .collect();
    frames.reverse();
    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
stack traceback:
\t[C]: in function 'move'
\thurdles.lua:7: in function 'jump'
\thelper.lua:3: in function 'assist'
\thurdles.lua:12: in function 'main'
\t[C]: in ?";

    #[test]
    fn keeps_only_primary_unit_frames() {
        let frames = frames_for_unit(SAMPLE, "hurdles.lua");
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|f| f.unit == "hurdles.lua"));
    }

    #[test]
    fn frames_are_outermost_first() {
        let frames = frames_for_unit(SAMPLE, "hurdles.lua");
        assert_eq!(frames[0].line, 12);
        assert_eq!(frames[1].line, 7);
    }

    #[test]
    fn c_frames_are_dropped() {
        let frames = frames_for_unit(SAMPLE, "[C]");
        assert!(frames.is_empty());
    }

    #[test]
    fn dependency_unit_frames_are_dropped() {
        let frames = frames_for_unit(SAMPLE, "hurdles.lua");
        assert!(frames.iter().all(|f| f.line != 3));
    }

    #[test]
    fn empty_traceback_gives_no_frames() {
        assert!(frames_for_unit("", "hurdles.lua").is_empty());
    }
}
