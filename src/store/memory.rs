//! In-memory event store for testing and single-node deployments.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;

use crate::error::AnalysisError;
use crate::types::{Event, EventId};
use super::{EventStore, EventWriter};

/// Error type for in-memory store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InMemoryError {
    /// Rejected on insert.
    #[error("Invalid event: {0}")]
    InvalidEvent(#[from] AnalysisError),
}

/// In-memory event store.
///
/// Uses a BTreeMap keyed by ID so reads are deterministic; interior
/// locking lets the store be shared behind an `Arc` and written by
/// ingestion jobs.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    events: RwLock<BTreeMap<EventId, Event>>,
}

impl InMemoryEventStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `events`, validating each one.
    pub fn with_events(events: impl IntoIterator<Item = Event>) -> Result<Self, InMemoryError> {
        let store = Self::new();
        for event in events {
            store.add_event(event)?;
        }
        Ok(store)
    }

    /// Add or replace an event.
    pub fn add_event(&self, event: Event) -> Result<(), InMemoryError> {
        event.validate()?;
        self.events.write().insert(event.id, event);
        Ok(())
    }

    /// Remove an event, returning it if present.
    pub fn remove_event(&self, id: &EventId) -> Option<Event> {
        self.events.write().remove(id)
    }

    /// Number of stored events.
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    fn sorted(mut events: Vec<Event>) -> Vec<Event> {
        // Map order is by ID, so equal starts fall back to ID order.
        events.sort_by_key(|e| e.start);
        events
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    type Error = InMemoryError;

    async fn get_all_events(&self) -> Result<Vec<Event>, Self::Error> {
        let events: Vec<Event> = self.events.read().values().cloned().collect();
        Ok(Self::sorted(events))
    }

    async fn get_event(&self, id: &EventId) -> Result<Option<Event>, Self::Error> {
        Ok(self.events.read().get(id).cloned())
    }

    async fn get_child_events(&self, parent_id: &EventId) -> Result<Vec<Event>, Self::Error> {
        let children: Vec<Event> = self
            .events
            .read()
            .values()
            .filter(|e| e.parent_id.as_ref() == Some(parent_id))
            .cloned()
            .collect();
        Ok(Self::sorted(children))
    }
}

#[async_trait]
impl EventWriter for InMemoryEventStore {
    async fn insert_events(&self, events: &[Event]) -> Result<usize, Self::Error> {
        for event in events {
            event.validate()?;
        }
        let mut map = self.events.write();
        for event in events {
            map.insert(event.id, event.clone());
        }
        Ok(events.len())
    }
}
