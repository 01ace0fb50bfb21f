//! AnalysisPolicy v1: decay, depth bounds, fan-out and recommendation thresholds.
//!
//! ## Float Normalization for Deterministic Hashing
//!
//! Floats are quantized to integers before hashing to avoid cross-platform
//! serialization differences. The quantization factor is 1e6 (multiply by
//! 1,000,000 and round to i64).

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash_hex;
use crate::DEFAULT_POLICY_VERSION;

/// Quantization factor for float normalization.
const FLOAT_QUANTIZATION_FACTOR: f64 = 1_000_000.0;

/// Default influence decay per hierarchy hop.
pub const DEFAULT_DECAY_FACTOR: f64 = 0.7;

/// Thresholds that drive recommendation text.
///
/// These are reporting policy, not algorithm parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationThresholds {
    /// Critical gaps at or above this count trigger a recommendation.
    pub critical_gap_count: usize,
    /// High-severity gaps at or above this count trigger a recommendation.
    pub high_gap_count: usize,
    /// Average gap minutes at or above this value trigger a recommendation.
    pub average_gap_minutes: f64,
    /// Absolute influence change (percent) above this value is significant.
    pub influence_change_percent: f64,
}

impl Default for RecommendationThresholds {
    fn default() -> Self {
        Self {
            critical_gap_count: 1,
            high_gap_count: 3,
            average_gap_minutes: 240.0,
            influence_change_percent: 20.0,
        }
    }
}

/// Quantized thresholds for deterministic hashing.
#[derive(Debug, Clone, Serialize)]
struct QuantizedThresholds {
    critical_gap_count: usize,
    high_gap_count: usize,
    average_gap_minutes: i64,
    influence_change_percent: i64,
}

/// Quantized policy parameters for deterministic hashing.
#[derive(Debug, Clone, Serialize)]
struct QuantizedPolicyParams {
    version: String,
    decay_factor: i64,
    max_influence_depth: u32,
    global_influence_depth: u32,
    top_influencers: usize,
    thresholds: QuantizedThresholds,
}

/// Analysis policy version 1.
///
/// ## Parameters
///
/// - `decay_factor`: influence multiplier per hierarchy hop (0.7 = 30% loss per hop)
/// - `max_influence_depth`: upper bound applied to caller-supplied depths
/// - `global_influence_depth`: depth used for global and network views
/// - `top_influencers`: size of the global top-N ranking
/// - `parallel_threshold`: snapshot size above which global influence fans out
/// - `analysis_timeout_ms`: optional per-call deadline
/// - `precedence_cache_entries`: LRU capacity for precedence graphs (0 disables)
/// - `thresholds`: recommendation thresholds
///
/// Only parameters that change analysis results contribute to `params_hash`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPolicy {
    /// Policy version identifier.
    pub version: String,
    /// Influence decay per hop (0.0-1.0).
    pub decay_factor: f64,
    /// Maximum traversal depth for influence queries.
    pub max_influence_depth: u32,
    /// Traversal depth for global/network influence views.
    pub global_influence_depth: u32,
    /// Number of entries in the global top-N ranking.
    pub top_influencers: usize,
    /// Snapshot size above which per-event influence runs on worker threads.
    pub parallel_threshold: usize,
    /// Per-call timeout in milliseconds.
    pub analysis_timeout_ms: Option<u64>,
    /// Precedence graph cache capacity.
    pub precedence_cache_entries: usize,
    /// Recommendation thresholds.
    pub thresholds: RecommendationThresholds,
}

impl AnalysisPolicy {
    /// Get the policy ID.
    pub fn policy_id(&self) -> &str {
        &self.version
    }

    /// Return a copy with a different decay factor (clamped to 0.0-1.0).
    pub fn with_decay_factor(mut self, decay_factor: f64) -> Self {
        self.decay_factor = decay_factor.clamp(0.0, 1.0);
        self
    }

    /// Return a copy with a per-call timeout.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.analysis_timeout_ms = Some(timeout_ms);
        self
    }

    /// Load the policy from environment variables, falling back to defaults.
    ///
    /// - `TEMPORAL_DECAY_FACTOR`
    /// - `TEMPORAL_MAX_INFLUENCE_DEPTH`
    /// - `TEMPORAL_GLOBAL_INFLUENCE_DEPTH`
    /// - `TEMPORAL_ANALYSIS_TIMEOUT_MS`
    /// - `TEMPORAL_PRECEDENCE_CACHE_ENTRIES`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            decay_factor: env_parse("TEMPORAL_DECAY_FACTOR")
                .map(|d: f64| d.clamp(0.0, 1.0))
                .unwrap_or(defaults.decay_factor),
            max_influence_depth: env_parse("TEMPORAL_MAX_INFLUENCE_DEPTH")
                .unwrap_or(defaults.max_influence_depth),
            global_influence_depth: env_parse("TEMPORAL_GLOBAL_INFLUENCE_DEPTH")
                .unwrap_or(defaults.global_influence_depth),
            analysis_timeout_ms: env_parse("TEMPORAL_ANALYSIS_TIMEOUT_MS")
                .or(defaults.analysis_timeout_ms),
            precedence_cache_entries: env_parse("TEMPORAL_PRECEDENCE_CACHE_ENTRIES")
                .unwrap_or(defaults.precedence_cache_entries),
            ..defaults
        }
    }

    /// Compute a hash of the result-affecting policy parameters.
    pub fn params_hash(&self) -> String {
        canonical_hash_hex(&self.to_quantized())
    }

    fn to_quantized(&self) -> QuantizedPolicyParams {
        QuantizedPolicyParams {
            version: self.version.clone(),
            decay_factor: quantize_float(self.decay_factor),
            max_influence_depth: self.max_influence_depth,
            global_influence_depth: self.global_influence_depth,
            top_influencers: self.top_influencers,
            thresholds: QuantizedThresholds {
                critical_gap_count: self.thresholds.critical_gap_count,
                high_gap_count: self.thresholds.high_gap_count,
                average_gap_minutes: quantize_float(self.thresholds.average_gap_minutes),
                influence_change_percent: quantize_float(self.thresholds.influence_change_percent),
            },
        }
    }
}

impl Default for AnalysisPolicy {
    fn default() -> Self {
        Self {
            version: DEFAULT_POLICY_VERSION.to_string(),
            decay_factor: DEFAULT_DECAY_FACTOR,
            max_influence_depth: 16,
            global_influence_depth: 3,
            top_influencers: 10,
            parallel_threshold: 256,
            analysis_timeout_ms: None,
            precedence_cache_entries: 64,
            thresholds: RecommendationThresholds::default(),
        }
    }
}

/// Quantize a float to an i64 for deterministic hashing.
fn quantize_float(value: f64) -> i64 {
    (value * FLOAT_QUANTIZATION_FACTOR).round() as i64
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
