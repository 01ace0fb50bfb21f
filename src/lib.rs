//! # temporal-graph-kernel
//!
//! Temporal relationship analytics over interval events.
//!
//! Each event has a half-open interval `[start, end)` and an optional
//! parent. The kernel answers four families of questions over an immutable
//! snapshot of those events:
//!
//! 1. **Overlap and gap detection** inside a window or across the whole set
//! 2. **Precedence paths**: shortest chains where each event ends before the next starts
//! 3. **Hierarchy paths**: shortest chains over parent/child links
//! 4. **Influence**: decayed reach down the parent/child tree, plus what-if simulations
//!
//! ## Architecture
//!
//! ```text
//! EventStore (Postgres or Memory) → EventSnapshot → analysis::* → reports
//!                                        ↓
//!                              TemporalAnalyzer (policy, deadline, graph cache)
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same events + same policy → identical results and `snapshot_id`
//! - Events are ordered by `(start, id)` inside a snapshot
//! - Ties in every ranking break on snapshot order

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod error;
pub mod policy;
pub mod canonical;
pub mod snapshot;
pub mod analysis;
pub mod analyzer;
pub mod store;
pub mod ingest;

#[cfg(feature = "service")]
pub mod service;

// Re-exports
pub use types::{Deadline, Event, EventId, EventSummary, Gap, Severity, TimeWindow};
pub use error::AnalysisError;
pub use policy::{AnalysisPolicy, RecommendationThresholds, DEFAULT_DECAY_FACTOR};
pub use canonical::{canonical_hash, canonical_hash_hex, to_canonical_bytes};
pub use snapshot::EventSnapshot;
pub use analysis::{
    shortest_hierarchy_path, simulate_gap, simulate_influence, EventPath, GapAnalyzer, GapReport,
    GapSimulation, GlobalInfluence, InfluenceNetwork, InfluenceReport, InfluenceSimulation,
    InfluenceSpreader, OverlapDetector, OverlapPair, PathStep, PrecedenceGraph, PrecedenceStats,
};
pub use analyzer::{CacheStats, TemporalAnalyzer};
pub use store::{EventStore, EventWriter, InMemoryError, InMemoryEventStore};
#[cfg(feature = "postgres")]
pub use store::PostgresEventStore;
pub use ingest::{
    run_ingestion, IngestError, IngestRecord, IngestionJob, IngestionJobRegistry, JobId, JobStatus,
};

// Service re-exports (when service feature is enabled)
#[cfg(feature = "service")]
pub use service::{create_router, PolicyRef, ServiceState};

/// Schema version for all temporal kernel types.
/// Increment on breaking changes to any serialized type.
pub const TEMPORAL_KERNEL_SCHEMA_VERSION: &str = "1.0.0";

/// Default policy version identifier.
pub const DEFAULT_POLICY_VERSION: &str = "analysis_policy_v1";
