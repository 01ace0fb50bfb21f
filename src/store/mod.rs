//! Event storage backends.
//!
//! The analyzer only reads through [`EventStore`]; bulk ingestion writes
//! through [`EventWriter`].

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;
use crate::types::{Event, EventId};

/// Trait for event storage backends.
///
/// Implementations must return events in ascending start order, with a
/// deterministic order among equal starts.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync;

    /// Fetch every event, ascending by start.
    async fn get_all_events(&self) -> Result<Vec<Event>, Self::Error>;

    /// Fetch one event by ID.
    async fn get_event(&self, id: &EventId) -> Result<Option<Event>, Self::Error>;

    /// Fetch the events whose parent is `parent_id`, ascending by start.
    async fn get_child_events(&self, parent_id: &EventId) -> Result<Vec<Event>, Self::Error>;

    /// Whether the backend is reachable.
    async fn is_healthy(&self) -> bool {
        true
    }
}

/// Write side of a store.
#[async_trait]
pub trait EventWriter: EventStore {
    /// Insert or replace events by ID. Returns the number written.
    async fn insert_events(&self, events: &[Event]) -> Result<usize, Self::Error>;
}

pub use memory::{InMemoryError, InMemoryEventStore};

#[cfg(feature = "postgres")]
pub use postgres::{PostgresConfig, PostgresError, PostgresEventStore};
