//! Temporal analytics over an [`EventSnapshot`](crate::snapshot::EventSnapshot).
//!
//! Every function here is a pure, synchronous computation over an immutable
//! snapshot. Nothing mutates shared state; a [`Deadline`](crate::types::Deadline)
//! threaded through the loops bounds worst-case work.
//!
//! ## Components
//!
//! - [`interval`]: overlap and gap predicates on single pairs
//! - [`overlap`]: sweep-line overlap detection inside a window
//! - [`gaps`]: windowed and global gap analysis
//! - [`simulation`]: what-if gap analysis for a moved event
//! - [`precedence`]: precedence graph and shortest precedence chains
//! - [`hierarchy`]: shortest chains over parent/child links
//! - [`influence`]: decayed hierarchical influence and its global views
//! - [`aggregate`]: statistics and recommendations

pub mod aggregate;
pub mod gaps;
pub mod hierarchy;
pub mod influence;
pub mod interval;
pub mod overlap;
pub mod path;
pub mod precedence;
pub mod simulation;

pub use aggregate::{
    GapReport, GapStatistics, InfluenceBucket, InfluenceDistribution, SeverityCounts,
};
pub use gaps::GapAnalyzer;
pub use hierarchy::shortest_hierarchy_path;
pub use influence::{
    simulate_influence, GlobalInfluence, InfluenceNetwork, InfluenceRecord, InfluenceReport,
    InfluenceSimulation, InfluenceSpreader, InfluenceTotal, NetworkLink, NetworkNode,
};
pub use overlap::{OverlapDetector, OverlapPair};
pub use path::{EventPath, PathStep};
pub use precedence::{PrecedenceGraph, PrecedenceStats};
pub use simulation::{simulate_gap, AffectedGap, GapChange, GapSimulation};
