//! Pure interval arithmetic over events.

use crate::types::event::millis_to_minutes;
use crate::types::Event;

/// Strict overlap test: touching endpoints do not overlap.
pub fn overlaps(a: &Event, b: &Event) -> bool {
    a.start < b.end && a.end > b.start
}

/// Minutes during which `a` and `b` intersect; 0 when they do not overlap.
pub fn overlap_minutes(a: &Event, b: &Event) -> i64 {
    if !overlaps(a, b) {
        return 0;
    }
    let start = a.start.max(b.start);
    let end = a.end.min(b.end);
    millis_to_minutes((end - start).num_milliseconds())
}

/// Minutes between the end of the earlier event and the start of the later one.
///
/// Symmetric in its arguments; 0 when the events overlap.
pub fn gap_minutes(a: &Event, b: &Event) -> i64 {
    if a.end <= b.start {
        millis_to_minutes((b.start - a.end).num_milliseconds())
    } else if b.end <= a.start {
        millis_to_minutes((a.start - b.end).num_milliseconds())
    } else {
        0
    }
}
