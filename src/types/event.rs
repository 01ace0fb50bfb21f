//! Event types for the temporal kernel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::error::AnalysisError;

/// Milliseconds per minute, used for all minute arithmetic.
pub(crate) const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// Convert a millisecond span to whole minutes, rounding half away from zero.
pub(crate) fn millis_to_minutes(millis: i64) -> i64 {
    (millis as f64 / MILLIS_PER_MINUTE).round() as i64
}

/// Unique identifier for an event.
///
/// Wraps a UUID and implements `Ord` for deterministic ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Create a new EventId from a UUID.
    pub fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Create a new EventId from a UUID string.
    pub fn from_str(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Generate a new random EventId.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for EventId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// A named time interval, optionally parented to another event.
///
/// Instants are stored in UTC; any RFC 3339 offset is accepted on input.
/// The `end > start` invariant is checked by [`Event::new`] and again when a
/// snapshot is built, since deserialized events bypass the constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier.
    pub id: EventId,
    /// Display name.
    pub name: String,
    /// Start instant (inclusive).
    pub start: DateTime<Utc>,
    /// End instant (exclusive).
    pub end: DateTime<Utc>,
    /// Parent event, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<EventId>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Free-form metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Event {
    /// Create a new event, rejecting empty or inverted intervals.
    pub fn new(
        id: EventId,
        name: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, AnalysisError> {
        if end <= start {
            return Err(AnalysisError::InvalidInterval { start, end });
        }
        Ok(Self {
            id,
            name: name.into(),
            start,
            end,
            parent_id: None,
            description: None,
            metadata: BTreeMap::new(),
        })
    }

    /// Set the parent event.
    pub fn with_parent(mut self, parent_id: EventId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Duration in whole minutes.
    pub fn duration_minutes(&self) -> i64 {
        millis_to_minutes((self.end - self.start).num_milliseconds())
    }

    /// Check the `end > start` invariant.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.end <= self.start {
            return Err(AnalysisError::InvalidInterval {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    /// Lightweight summary for reports.
    pub fn summary(&self) -> EventSummary {
        EventSummary {
            id: self.id,
            name: self.name.clone(),
            start: self.start,
            end: self.end,
        }
    }
}

/// Event reference embedded in analysis results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    /// Event ID.
    pub id: EventId,
    /// Display name.
    pub name: String,
    /// Start instant.
    pub start: DateTime<Utc>,
    /// End instant.
    pub end: DateTime<Utc>,
}
