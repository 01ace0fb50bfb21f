//! Temporal precedence graph and shortest precedence paths.
//!
//! An edge A→B exists iff `A.end <= B.start` (A can influence B). The graph
//! is dense, up to n² edges, but because the snapshot is sorted by start the
//! successors of A are exactly the suffix of the snapshot whose starts are at
//! or after `A.end`. The graph therefore stores one suffix offset per event
//! and enumerates edges lazily, in snapshot order.

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::error::AnalysisError;
use crate::snapshot::EventSnapshot;
use crate::types::{Deadline, EventId};
use super::path::{breadth_first_path, EventPath};

/// Summary of a precedence graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecedenceStats {
    /// Fingerprint of the snapshot the graph was built from.
    pub snapshot_id: String,
    /// Number of events.
    pub node_count: usize,
    /// Number of precedence edges.
    pub edge_count: usize,
}

/// Precedence graph over one snapshot.
#[derive(Debug, Clone)]
pub struct PrecedenceGraph {
    snapshot_id: String,
    /// `first_successor[a]`: first snapshot position whose start is >= events[a].end.
    first_successor: Vec<usize>,
}

impl PrecedenceGraph {
    /// Build the graph for a snapshot.
    pub fn build(snapshot: &EventSnapshot, deadline: &Deadline) -> Result<Self, AnalysisError> {
        let events = snapshot.events();
        let mut first_successor = Vec::with_capacity(events.len());
        for event in events {
            deadline.check()?;
            // Starts are ascending; `end > start` keeps the event itself out of its suffix.
            first_successor.push(events.partition_point(|other| other.start < event.end));
        }

        let graph = Self {
            snapshot_id: snapshot.snapshot_id().to_string(),
            first_successor,
        };

        tracing::debug!(
            snapshot_id = %graph.snapshot_id,
            node_count = graph.node_count(),
            edge_count = graph.edge_count(),
            "precedence graph built"
        );

        Ok(graph)
    }

    /// Fingerprint of the snapshot this graph belongs to.
    pub fn snapshot_id(&self) -> &str {
        &self.snapshot_id
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.first_successor.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        let n = self.node_count();
        self.first_successor.iter().map(|&first| n - first).sum()
    }

    /// Successor positions of `position`, in snapshot order.
    pub fn successors(&self, position: usize) -> Range<usize> {
        self.first_successor[position]..self.node_count()
    }

    /// Whether the edge `from → to` exists.
    pub fn has_edge(&self, from: usize, to: usize) -> bool {
        from != to && self.successors(from).contains(&to)
    }

    /// Graph summary.
    pub fn stats(&self) -> PrecedenceStats {
        PrecedenceStats {
            snapshot_id: self.snapshot_id.clone(),
            node_count: self.node_count(),
            edge_count: self.edge_count(),
        }
    }

    /// Shortest precedence chain from `source` to `target`.
    ///
    /// Returns `Ok(None)` when no chain exists. Ties among equally short
    /// chains resolve by snapshot order of the successors.
    pub fn shortest_path(
        &self,
        snapshot: &EventSnapshot,
        source: &EventId,
        target: &EventId,
        deadline: &Deadline,
    ) -> Result<Option<EventPath>, AnalysisError> {
        debug_assert_eq!(self.snapshot_id, snapshot.snapshot_id());

        let from = snapshot.position(source).ok_or(AnalysisError::NotFound(*source))?;
        let to = snapshot.position(target).ok_or(AnalysisError::NotFound(*target))?;

        let positions = breadth_first_path(
            self.node_count(),
            from,
            to,
            |node| self.successors(node),
            deadline,
        )?;

        Ok(positions.map(|p| EventPath::from_positions(snapshot, &p)))
    }
}
