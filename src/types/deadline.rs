//! Deadlines for bounding worst-case analysis work.

use std::time::{Duration, Instant};

use crate::error::AnalysisError;

/// Optional expiry threaded through traversal loops.
///
/// `Deadline::none()` never expires. Loops call [`Deadline::check`] once per
/// unit of work and abort with `DeadlineExceeded` after expiry.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deadline {
    expires_at: Option<Instant>,
}

impl Deadline {
    /// A deadline that never expires.
    pub fn none() -> Self {
        Self { expires_at: None }
    }

    /// A deadline `timeout` from now.
    pub fn after(timeout: Duration) -> Self {
        Self {
            expires_at: Some(Instant::now() + timeout),
        }
    }

    /// Build from an optional millisecond timeout.
    pub fn from_millis(timeout_ms: Option<u64>) -> Self {
        match timeout_ms {
            Some(ms) => Self::after(Duration::from_millis(ms)),
            None => Self::none(),
        }
    }

    /// Whether the deadline has passed.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }

    /// Fail with `DeadlineExceeded` once expired.
    pub fn check(&self) -> Result<(), AnalysisError> {
        if self.is_expired() {
            Err(AnalysisError::DeadlineExceeded)
        } else {
            Ok(())
        }
    }
}
