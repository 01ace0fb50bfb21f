//! Error type shared by the analysis core and the analyzer facade.

use chrono::{DateTime, Utc};

use crate::types::EventId;

/// Error type for analysis operations.
///
/// Empty input is never an error: gap and overlap queries over fewer than two
/// relevant events return empty results instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    /// An operation referenced an unknown event.
    #[error("Event not found: {0}")]
    NotFound(EventId),
    /// An event interval (input or simulated) has `end <= start`.
    #[error("Invalid interval: end {end} is not after start {start}")]
    InvalidInterval {
        /// Interval start.
        start: DateTime<Utc>,
        /// Interval end.
        end: DateTime<Utc>,
    },
    /// A query window has `end <= start`.
    #[error("Invalid range: window end {end} is not after start {start}")]
    InvalidRange {
        /// Window start.
        start: DateTime<Utc>,
        /// Window end.
        end: DateTime<Utc>,
    },
    /// Two events in one snapshot share an ID.
    #[error("Duplicate event in snapshot: {0}")]
    DuplicateEvent(EventId),
    /// The analysis deadline expired before the computation finished.
    #[error("Analysis deadline exceeded")]
    DeadlineExceeded,
    /// Snapshot provider failure.
    #[error("Store error: {0}")]
    StoreError(String),
}

impl AnalysisError {
    /// Create a store error from any error type.
    pub fn from_store<E: std::error::Error>(e: E) -> Self {
        Self::StoreError(e.to_string())
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidInterval { .. } => "INVALID_INTERVAL",
            Self::InvalidRange { .. } => "INVALID_RANGE",
            Self::DuplicateEvent(_) => "DUPLICATE_EVENT",
            Self::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Self::StoreError(_) => "STORE_ERROR",
        }
    }
}
