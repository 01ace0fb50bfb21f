//! Core types for the temporal kernel.

pub mod event;
pub mod window;
pub mod gap;
pub mod deadline;

pub use event::{Event, EventId, EventSummary};
pub use window::TimeWindow;
pub use gap::{Gap, Severity};
pub use deadline::Deadline;
