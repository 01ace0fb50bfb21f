//! Overlap detection within a time window.
//!
//! Uses a sweep line over the start-ordered snapshot instead of an all-pairs
//! scan: for each event, only the following events that start before it ends
//! are compared. This is O(n log n + k) for k reported pairs and yields the
//! same pairs and durations as the O(n²) scan.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::snapshot::EventSnapshot;
use crate::types::{Deadline, Event, EventSummary, TimeWindow};
use super::interval::overlap_minutes;

/// Two events whose intervals strictly intersect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapPair {
    /// Earlier-starting event (snapshot order).
    pub event_a: EventSummary,
    /// Later-starting event (snapshot order).
    pub event_b: EventSummary,
    /// Overlap duration in minutes.
    pub overlap_minutes: i64,
}

/// Detector for pairwise overlaps.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlapDetector {
    deadline: Deadline,
}

impl OverlapDetector {
    /// Create a detector without a deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detector bounded by a deadline.
    pub fn with_deadline(deadline: Deadline) -> Self {
        Self { deadline }
    }

    /// Find every overlapping pair among events intersecting `window`.
    ///
    /// Pairs are ordered by the earlier event, then the later event, in
    /// snapshot order.
    pub fn find_overlaps(
        &self,
        snapshot: &EventSnapshot,
        window: &TimeWindow,
    ) -> Result<Vec<OverlapPair>, AnalysisError> {
        // Snapshot order is already ascending by start.
        let in_window: Vec<&Event> = snapshot
            .events()
            .iter()
            .filter(|e| window.intersects(e))
            .collect();

        let mut pairs = Vec::new();
        for (i, a) in in_window.iter().enumerate() {
            self.deadline.check()?;
            for b in &in_window[i + 1..] {
                // b.start >= a.start, so a.start < b.end always holds.
                if b.start >= a.end {
                    break;
                }
                pairs.push(OverlapPair {
                    event_a: a.summary(),
                    event_b: b.summary(),
                    overlap_minutes: overlap_minutes(a, b),
                });
            }
        }

        tracing::debug!(
            window_events = in_window.len(),
            overlap_count = pairs.len(),
            "overlap detection complete"
        );

        Ok(pairs)
    }
}
