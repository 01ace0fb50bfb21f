//! Gap and severity types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::event::EventSummary;

/// Coarse classification of gap duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Under 30 minutes.
    Low,
    /// 30 minutes up to 2 hours.
    Medium,
    /// 2 hours up to 8 hours.
    High,
    /// 8 hours or more.
    Critical,
}

impl Severity {
    /// Lower bound (inclusive) of the medium bucket, in minutes.
    pub const MEDIUM_MINUTES: i64 = 30;
    /// Lower bound (inclusive) of the high bucket, in minutes.
    pub const HIGH_MINUTES: i64 = 120;
    /// Lower bound (inclusive) of the critical bucket, in minutes.
    pub const CRITICAL_MINUTES: i64 = 480;

    /// Classify a gap duration.
    pub fn from_minutes(minutes: i64) -> Self {
        if minutes >= Self::CRITICAL_MINUTES {
            Self::Critical
        } else if minutes >= Self::HIGH_MINUTES {
            Self::High
        } else if minutes >= Self::MEDIUM_MINUTES {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// The span strictly between two chronologically adjacent events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gap {
    /// Event that ends before the gap.
    pub preceding: EventSummary,
    /// Event that starts after the gap.
    pub succeeding: EventSummary,
    /// Gap start (the preceding event's end).
    pub start: DateTime<Utc>,
    /// Gap end (the succeeding event's start).
    pub end: DateTime<Utc>,
    /// Duration in minutes.
    pub duration_minutes: i64,
    /// Severity bucket.
    pub severity: Severity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_boundaries() {
        assert_eq!(Severity::from_minutes(0), Severity::Low);
        assert_eq!(Severity::from_minutes(29), Severity::Low);
        assert_eq!(Severity::from_minutes(30), Severity::Medium);
        assert_eq!(Severity::from_minutes(119), Severity::Medium);
        assert_eq!(Severity::from_minutes(120), Severity::High);
        assert_eq!(Severity::from_minutes(479), Severity::High);
        assert_eq!(Severity::from_minutes(480), Severity::Critical);
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
    }
}
