//! Line — fixed column layout of a server log line.
//!
//! ```text
//! [2019.08.01-12.00.00:000][123]LogSquad: ...
//!  ^ timestamp (1..24)     ^ tick (26..29)
//!                               ^ anchor column 30
//! ```

use std::ops::Range;

use chrono::NaiveDateTime;

pub const TIMESTAMP_RANGE: Range<usize> = 1..24;
pub const TICK_RANGE: Range<usize> = 26..29;
pub const ANCHOR_COLUMN: usize = 30;
pub const TIMESTAMP_FORMAT: &str = "%Y.%m.%d-%H.%M.%S:%3f";

/// Only lines longer than the anchor column can carry an event.
pub fn is_candidate(line: &str) -> bool {
    line.len() > ANCHOR_COLUMN
}

/// The literal 23-character stamp, e.g. `2019.08.01-12.00.00:000`.
pub fn stamp(line: &str) -> Option<&str> {
    if !line.starts_with('[') {
        return None;
    }
    line.get(TIMESTAMP_RANGE)
}

pub fn parse_timestamp(stamp: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()
}

pub fn timestamp(line: &str) -> Option<NaiveDateTime> {
    stamp(line).and_then(parse_timestamp)
}

/// Frame counter; lines of one bounded event share it.
pub fn tick(line: &str) -> Option<&str> {
    line.get(TICK_RANGE)
}

/// Everything from the anchor column on.
pub fn body(line: &str) -> Option<&str> {
    line.get(ANCHOR_COLUMN..)
}

/// Whether `fragment` starts exactly at the anchor column, with at least
/// one character after it.
pub fn anchored(line: &str, fragment: &str) -> bool {
    line.len() > ANCHOR_COLUMN + fragment.len()
        && body(line).is_some_and(|b| b.starts_with(fragment))
}
