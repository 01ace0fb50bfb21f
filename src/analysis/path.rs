//! Breadth-first path search shared by the precedence and hierarchy finders.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::error::AnalysisError;
use crate::snapshot::EventSnapshot;
use crate::types::{Deadline, EventSummary};

/// One event on a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    /// The event.
    pub event: EventSummary,
    /// The event's own duration in minutes.
    pub duration_minutes: i64,
}

/// An ordered chain of events.
///
/// `total_duration_minutes` is the sum of the step durations, not the
/// wall-clock span from the first start to the last end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPath {
    /// Steps from source to target.
    pub steps: Vec<PathStep>,
    /// Sum of step durations.
    pub total_duration_minutes: i64,
}

impl EventPath {
    /// Build a path from snapshot positions.
    pub(crate) fn from_positions(snapshot: &EventSnapshot, positions: &[usize]) -> Self {
        let events = snapshot.events();
        let steps: Vec<PathStep> = positions
            .iter()
            .map(|&p| PathStep {
                event: events[p].summary(),
                duration_minutes: events[p].duration_minutes(),
            })
            .collect();
        let total_duration_minutes: i64 = steps.iter().map(|s| s.duration_minutes).sum();
        Self {
            steps,
            total_duration_minutes,
        }
    }

    /// Number of edges traversed.
    pub fn hop_count(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }
}

/// Level-order search from `source` to `target` over snapshot positions.
///
/// The visited set is seeded with the source and nodes are marked on
/// enqueue, so each queue entry's path is the first (shortest) discovered.
/// Among equally short paths the winner follows `neighbors` iteration order.
pub(crate) fn breadth_first_path<F, I>(
    node_count: usize,
    source: usize,
    target: usize,
    mut neighbors: F,
    deadline: &Deadline,
) -> Result<Option<Vec<usize>>, AnalysisError>
where
    F: FnMut(usize) -> I,
    I: IntoIterator<Item = usize>,
{
    let mut visited = vec![false; node_count];
    visited[source] = true;

    let mut queue: VecDeque<(usize, Vec<usize>)> = VecDeque::new();
    queue.push_back((source, vec![source]));

    while let Some((node, path)) = queue.pop_front() {
        deadline.check()?;
        if node == target {
            return Ok(Some(path));
        }
        for next in neighbors(node) {
            if visited[next] {
                continue;
            }
            visited[next] = true;
            let mut branch = path.clone();
            branch.push(next);
            queue.push_back((next, branch));
        }
    }

    Ok(None)
}
