//! Shortest path over parent/child links.
//!
//! Kept apart from the precedence graph: the two relations answer different
//! questions and are never merged.

use crate::error::AnalysisError;
use crate::snapshot::EventSnapshot;
use crate::types::{Deadline, EventId};
use super::path::{breadth_first_path, EventPath};

/// Shortest chain of parent/child links from `source` to `target`.
///
/// Neighbors of an event are its children in snapshot order, then its
/// declared parent when that parent is present in the snapshot.
pub fn shortest_hierarchy_path(
    snapshot: &EventSnapshot,
    source: &EventId,
    target: &EventId,
    deadline: &Deadline,
) -> Result<Option<EventPath>, AnalysisError> {
    let from = snapshot.position(source).ok_or(AnalysisError::NotFound(*source))?;
    let to = snapshot.position(target).ok_or(AnalysisError::NotFound(*target))?;
    let events = snapshot.events();

    let positions = breadth_first_path(
        snapshot.len(),
        from,
        to,
        |node| {
            snapshot
                .child_positions(&events[node].id)
                .iter()
                .copied()
                .chain(snapshot.parent_position(node))
        },
        deadline,
    )?;

    Ok(positions.map(|p| EventPath::from_positions(snapshot, &p)))
}
