//! Gap analysis between chronologically adjacent events.
//!
//! Events are scanned in start order while carrying the latest end seen so
//! far and the event that owns it. A gap opens only when that running end is
//! strictly before the next start, so time still covered by an earlier long
//! event never counts as free. The owner of the running end is the gap's
//! preceding event.
//!
//! ## Modes
//!
//! - **Global**: the whole snapshot in start order.
//! - **Bounded**: events intersecting the window, preceded by the most recent
//!   event ending at or before the window start. Events starting at or after
//!   the window end are scanned until the first gap past the window, so the
//!   trailing gap ends at the earliest start that is not already covered.
//!
//! Overlapping or touching neighbours never produce a gap.
//!
//! ## Ordering
//!
//! Gaps are sorted by duration descending, then by the preceding event's
//! start, then by the preceding event's snapshot position.

use std::cmp::Ordering;

use crate::error::AnalysisError;
use crate::snapshot::EventSnapshot;
use crate::types::event::millis_to_minutes;
use crate::types::{Deadline, Gap, Severity, TimeWindow};

/// Analyzer for temporal gaps.
#[derive(Debug, Clone, Copy, Default)]
pub struct GapAnalyzer {
    deadline: Deadline,
}

impl GapAnalyzer {
    /// Create an analyzer without a deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an analyzer bounded by a deadline.
    pub fn with_deadline(deadline: Deadline) -> Self {
        Self { deadline }
    }

    /// Find gaps, optionally bounded by a window.
    ///
    /// Gaps shorter than `min_gap_minutes` are dropped.
    pub fn find_gaps(
        &self,
        snapshot: &EventSnapshot,
        window: Option<&TimeWindow>,
        min_gap_minutes: i64,
    ) -> Result<Vec<Gap>, AnalysisError> {
        let chain = match window {
            Some(window) => bounded_chain(snapshot, window),
            None => (0..snapshot.len()).collect(),
        };

        let events = snapshot.events();
        let mut found: Vec<(usize, Gap)> = Vec::new();
        // Position of the event owning the latest end so far.
        let mut covering: Option<usize> = None;
        for &position in &chain {
            self.deadline.check()?;
            let next = &events[position];
            let Some(owner) = covering else {
                covering = Some(position);
                continue;
            };
            let before = &events[owner];

            if before.end < next.start {
                let duration_minutes =
                    millis_to_minutes((next.start - before.end).num_milliseconds());
                if duration_minutes >= min_gap_minutes {
                    found.push((
                        owner,
                        Gap {
                            preceding: before.summary(),
                            succeeding: next.summary(),
                            start: before.end,
                            end: next.start,
                            duration_minutes,
                            severity: Severity::from_minutes(duration_minutes),
                        },
                    ));
                }
                if window.is_some_and(|w| next.start >= w.end) {
                    break;
                }
            }
            // On equal ends the later position takes over.
            if next.end >= before.end {
                covering = Some(position);
            }
        }

        found.sort_by(|(pos_a, a), (pos_b, b)| compare_gaps(a, *pos_a, b, *pos_b));

        tracing::debug!(
            snapshot_id = %snapshot.snapshot_id(),
            bounded = window.is_some(),
            chain_len = chain.len(),
            gap_count = found.len(),
            "gap analysis complete"
        );

        Ok(found.into_iter().map(|(_, gap)| gap).collect())
    }

    /// The longest gap, if any.
    pub fn largest_gap(
        &self,
        snapshot: &EventSnapshot,
        window: Option<&TimeWindow>,
        min_gap_minutes: i64,
    ) -> Result<Option<Gap>, AnalysisError> {
        Ok(self
            .find_gaps(snapshot, window, min_gap_minutes)?
            .into_iter()
            .next())
    }
}

fn compare_gaps(a: &Gap, pos_a: usize, b: &Gap, pos_b: usize) -> Ordering {
    b.duration_minutes
        .cmp(&a.duration_minutes)
        .then_with(|| a.preceding.start.cmp(&b.preceding.start))
        .then_with(|| pos_a.cmp(&pos_b))
}

/// Snapshot positions of `[before?] ++ in-window ++ trailing`, in start order.
///
/// Trailing holds every event starting at or after the window end; the scan
/// stops at the first gap among them.
fn bounded_chain(snapshot: &EventSnapshot, window: &TimeWindow) -> Vec<usize> {
    let events = snapshot.events();

    let mut before: Option<usize> = None;
    let mut in_window = Vec::new();
    let mut trailing = Vec::new();

    for (position, event) in events.iter().enumerate() {
        if window.intersects(event) {
            in_window.push(position);
        } else if event.end <= window.start {
            // Latest end wins; on ties the later snapshot position is closer.
            if before.map_or(true, |b| event.end >= events[b].end) {
                before = Some(position);
            }
        } else if event.start >= window.end {
            trailing.push(position);
        }
    }

    let mut chain = Vec::with_capacity(in_window.len() + trailing.len() + 1);
    chain.extend(before);
    chain.extend(in_window);
    chain.extend(trailing);
    chain
}
