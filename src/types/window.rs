//! Half-open time windows for bounded queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use super::event::Event;

/// A half-open window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Window start (inclusive).
    pub start: DateTime<Utc>,
    /// Window end (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Create a window, rejecting `end <= start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, AnalysisError> {
        if end <= start {
            return Err(AnalysisError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Whether the event's interval intersects this window.
    pub fn intersects(&self, event: &Event) -> bool {
        event.start < self.end && event.end > self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventId;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_rejects_inverted_range() {
        let err = TimeWindow::new(at(12, 0), at(9, 0)).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidRange { .. }));
        assert!(TimeWindow::new(at(9, 0), at(9, 0)).is_err());
    }

    #[test]
    fn test_intersects_is_strict_at_edges() {
        let window = TimeWindow::new(at(10, 0), at(11, 0)).unwrap();
        let before = Event::new(EventId::random(), "before", at(9, 0), at(10, 0)).unwrap();
        let after = Event::new(EventId::random(), "after", at(11, 0), at(12, 0)).unwrap();
        let straddle = Event::new(EventId::random(), "straddle", at(9, 30), at(10, 30)).unwrap();

        assert!(!window.intersects(&before));
        assert!(!window.intersects(&after));
        assert!(window.intersects(&straddle));
    }
}
