//! Point-in-time event snapshots.
//!
//! An `EventSnapshot` is the immutable input of every analysis call. It is
//! validated once at construction (unique IDs, `end > start`) so the
//! algorithms never re-validate records, and it carries a deterministic
//! `snapshot_id` that keys derived caches.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::canonical::canonical_hash_hex;
use crate::error::AnalysisError;
use crate::types::{Event, EventId};

/// Canonical per-event fingerprint input.
#[derive(Serialize)]
struct FingerprintEntry {
    id: String,
    start_ms: i64,
    end_ms: i64,
    parent: Option<String>,
}

/// An immutable, validated, start-ordered copy of the event set.
///
/// Ordering is ascending `(start, id)`, independent of the order in which
/// the provider supplied the events. This "snapshot order" is the canonical
/// tie-break for every analysis.
#[derive(Debug, Clone)]
pub struct EventSnapshot {
    events: Vec<Event>,
    index: BTreeMap<EventId, usize>,
    children: BTreeMap<EventId, Vec<usize>>,
    snapshot_id: String,
}

impl EventSnapshot {
    /// Build a snapshot, validating every record.
    pub fn from_events(mut events: Vec<Event>) -> Result<Self, AnalysisError> {
        for event in &events {
            event.validate()?;
        }

        events.sort_by(|a, b| a.start.cmp(&b.start).then(a.id.cmp(&b.id)));

        let mut index = BTreeMap::new();
        for (position, event) in events.iter().enumerate() {
            if index.insert(event.id, position).is_some() {
                return Err(AnalysisError::DuplicateEvent(event.id));
            }
        }

        let mut children: BTreeMap<EventId, Vec<usize>> = BTreeMap::new();
        for (position, event) in events.iter().enumerate() {
            if let Some(parent_id) = event.parent_id {
                children.entry(parent_id).or_default().push(position);
            }
        }

        let fingerprint: Vec<FingerprintEntry> = events
            .iter()
            .map(|e| FingerprintEntry {
                id: e.id.to_string(),
                start_ms: e.start.timestamp_millis(),
                end_ms: e.end.timestamp_millis(),
                parent: e.parent_id.map(|p| p.to_string()),
            })
            .collect();
        let snapshot_id = canonical_hash_hex(&fingerprint);

        Ok(Self {
            events,
            index,
            children,
            snapshot_id,
        })
    }

    /// An empty snapshot.
    pub fn empty() -> Self {
        Self {
            events: Vec::new(),
            index: BTreeMap::new(),
            children: BTreeMap::new(),
            snapshot_id: canonical_hash_hex(&Vec::<FingerprintEntry>::new()),
        }
    }

    /// Deterministic fingerprint of IDs, intervals and parent links.
    pub fn snapshot_id(&self) -> &str {
        &self.snapshot_id
    }

    /// All events in snapshot order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the snapshot has no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Position of an event in snapshot order.
    pub fn position(&self, id: &EventId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Look up an event.
    pub fn get(&self, id: &EventId) -> Option<&Event> {
        self.position(id).map(|p| &self.events[p])
    }

    /// Look up an event, failing with `NotFound`.
    pub fn require(&self, id: &EventId) -> Result<&Event, AnalysisError> {
        self.get(id).ok_or(AnalysisError::NotFound(*id))
    }

    /// Positions of the events whose parent is `parent_id`, in snapshot order.
    pub fn child_positions(&self, parent_id: &EventId) -> &[usize] {
        self.children
            .get(parent_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Events whose parent is `parent_id`, in snapshot order.
    pub fn children_of(&self, parent_id: &EventId) -> impl Iterator<Item = &Event> + '_ {
        self.child_positions(parent_id)
            .iter()
            .map(move |&p| &self.events[p])
    }

    /// Position of an event's declared parent, if it is in the snapshot.
    pub fn parent_position(&self, position: usize) -> Option<usize> {
        self.events[position]
            .parent_id
            .and_then(|parent_id| self.position(&parent_id))
    }

    /// Earliest start across all events.
    pub fn earliest_start(&self) -> Option<DateTime<Utc>> {
        self.events.first().map(|e| e.start)
    }

    /// Latest end across all events.
    pub fn latest_end(&self) -> Option<DateTime<Utc>> {
        self.events.iter().map(|e| e.end).max()
    }

    /// A copy of this snapshot with one event's interval replaced.
    pub fn with_interval(
        &self,
        id: &EventId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, AnalysisError> {
        if end <= start {
            return Err(AnalysisError::InvalidInterval { start, end });
        }
        let position = self.position(id).ok_or(AnalysisError::NotFound(*id))?;

        let mut events = self.events.clone();
        events[position].start = start;
        events[position].end = end;
        Self::from_events(events)
    }

    /// A copy of this snapshot with one event's parent replaced or removed.
    pub fn with_parent(
        &self,
        id: &EventId,
        parent_id: Option<EventId>,
    ) -> Result<Self, AnalysisError> {
        let position = self.position(id).ok_or(AnalysisError::NotFound(*id))?;
        if let Some(parent_id) = parent_id {
            self.require(&parent_id)?;
        }

        let mut events = self.events.clone();
        events[position].parent_id = parent_id;
        Self::from_events(events)
    }
}
