//! Analysis policy definitions.

pub mod v1;

pub use v1::{AnalysisPolicy, RecommendationThresholds, DEFAULT_DECAY_FACTOR};
