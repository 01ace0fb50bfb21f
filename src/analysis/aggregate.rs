//! Summary statistics and recommendations over gap and influence outputs.
//!
//! Everything here is a pure reducer. Recommendation thresholds come from
//! [`RecommendationThresholds`] and are reporting policy only.

use serde::{Deserialize, Serialize};

use crate::policy::RecommendationThresholds;
use crate::types::{Gap, Severity};

/// Gap counts per severity bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    /// Low-severity gaps.
    pub low: usize,
    /// Medium-severity gaps.
    pub medium: usize,
    /// High-severity gaps.
    pub high: usize,
    /// Critical gaps.
    pub critical: usize,
}

impl SeverityCounts {
    /// Increment the count for a severity.
    pub fn increment(&mut self, severity: Severity) {
        match severity {
            Severity::Low => self.low += 1,
            Severity::Medium => self.medium += 1,
            Severity::High => self.high += 1,
            Severity::Critical => self.critical += 1,
        }
    }

    /// Total count across all buckets.
    pub fn total(&self) -> usize {
        self.low + self.medium + self.high + self.critical
    }
}

/// Aggregate statistics over a set of gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapStatistics {
    /// Number of gaps.
    pub count: usize,
    /// Severity histogram.
    pub by_severity: SeverityCounts,
    /// Sum of gap minutes.
    pub total_minutes: i64,
    /// Mean gap minutes (0 when there are no gaps).
    pub average_minutes: f64,
    /// Shortest gap.
    pub min_minutes: Option<i64>,
    /// Longest gap.
    pub max_minutes: Option<i64>,
}

impl GapStatistics {
    /// Reduce a gap list to statistics.
    pub fn from_gaps(gaps: &[Gap]) -> Self {
        let mut by_severity = SeverityCounts::default();
        for gap in gaps {
            by_severity.increment(gap.severity);
        }

        let total_minutes: i64 = gaps.iter().map(|g| g.duration_minutes).sum();
        let average_minutes = if gaps.is_empty() {
            0.0
        } else {
            total_minutes as f64 / gaps.len() as f64
        };

        Self {
            count: gaps.len(),
            by_severity,
            total_minutes,
            average_minutes,
            min_minutes: gaps.iter().map(|g| g.duration_minutes).min(),
            max_minutes: gaps.iter().map(|g| g.duration_minutes).max(),
        }
    }
}

/// Gaps plus their statistics and recommendations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapReport {
    /// Gaps, longest first.
    pub gaps: Vec<Gap>,
    /// Aggregate statistics.
    pub statistics: GapStatistics,
    /// Human-readable recommendations.
    pub recommendations: Vec<String>,
}

impl GapReport {
    /// Build a report from analyzed gaps.
    pub fn new(gaps: Vec<Gap>, thresholds: &RecommendationThresholds) -> Self {
        let statistics = GapStatistics::from_gaps(&gaps);
        let recommendations = gap_recommendations(&statistics, thresholds);
        Self {
            gaps,
            statistics,
            recommendations,
        }
    }
}

/// Influence bucket relative to the maximum observed total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfluenceBucket {
    /// At least 70% of the maximum.
    High,
    /// At least 40% of the maximum.
    Medium,
    /// Below 40% of the maximum.
    Low,
}

impl InfluenceBucket {
    /// Fraction of the maximum at or above which a total is high.
    pub const HIGH_FRACTION: f64 = 0.7;
    /// Fraction of the maximum at or above which a total is medium.
    pub const MEDIUM_FRACTION: f64 = 0.4;

    /// Classify `total` against `max`.
    pub fn classify(total: f64, max: f64) -> Self {
        if max <= 0.0 {
            return Self::Low;
        }
        if total >= max * Self::HIGH_FRACTION {
            Self::High
        } else if total >= max * Self::MEDIUM_FRACTION {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Count of events per influence bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfluenceDistribution {
    /// High-influence events.
    pub high: usize,
    /// Medium-influence events.
    pub medium: usize,
    /// Low-influence events.
    pub low: usize,
}

impl InfluenceDistribution {
    /// Increment the count for a bucket.
    pub fn increment(&mut self, bucket: InfluenceBucket) {
        match bucket {
            InfluenceBucket::High => self.high += 1,
            InfluenceBucket::Medium => self.medium += 1,
            InfluenceBucket::Low => self.low += 1,
        }
    }
}

/// Population variance; 0 for empty input.
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// The `n` items with the highest score, ties kept in input order.
pub fn top_n_by<T: Clone>(items: &[T], n: usize, score: impl Fn(&T) -> f64) -> Vec<T> {
    let mut ranked: Vec<&T> = items.iter().collect();
    // Stable sort keeps input order among equal scores.
    ranked.sort_by(|a, b| {
        score(b)
            .partial_cmp(&score(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.into_iter().take(n).cloned().collect()
}

/// Percentage change from `original` to `new`.
///
/// Undefined (`None`) when the baseline is zero.
pub fn percent_change(original: f64, new: f64) -> Option<f64> {
    if original == 0.0 {
        return None;
    }
    Some((new - original) / original * 100.0)
}

/// Recommendations for a gap population.
pub fn gap_recommendations(
    statistics: &GapStatistics,
    thresholds: &RecommendationThresholds,
) -> Vec<String> {
    if statistics.count == 0 {
        return vec!["No gaps detected; the timeline is continuous".to_string()];
    }

    let mut recommendations = Vec::new();
    let critical = statistics.by_severity.critical;
    if critical >= thresholds.critical_gap_count && critical > 0 {
        recommendations.push(format!(
            "{} critical gap(s) of {} minutes or more; consider scheduling events to close them",
            critical,
            Severity::CRITICAL_MINUTES
        ));
    }
    let high = statistics.by_severity.high;
    if high >= thresholds.high_gap_count && high > 0 {
        recommendations.push(format!(
            "{} high-severity gap(s) between {} and {} minutes; review scheduling density",
            high,
            Severity::HIGH_MINUTES,
            Severity::CRITICAL_MINUTES
        ));
    }
    if statistics.average_minutes >= thresholds.average_gap_minutes {
        recommendations.push(format!(
            "Average gap of {:.0} minutes exceeds {:.0} minutes; the timeline is sparse",
            statistics.average_minutes, thresholds.average_gap_minutes
        ));
    }
    if recommendations.is_empty() {
        recommendations.push("Gap distribution is within configured thresholds".to_string());
    }
    recommendations
}

/// Recommendation for an influence change.
pub fn influence_recommendations(
    percent: Option<f64>,
    thresholds: &RecommendationThresholds,
) -> Vec<String> {
    match percent {
        None => vec!["Baseline influence is zero; percentage change is undefined".to_string()],
        Some(p) if p.abs() > thresholds.influence_change_percent => {
            let direction = if p > 0.0 { "increases" } else { "decreases" };
            vec![format!(
                "Influence {} by {:.1}%, above the {:.0}% significance threshold",
                direction,
                p.abs(),
                thresholds.influence_change_percent
            )]
        }
        Some(p) => vec![format!(
            "Influence change of {:.1}% is within the {:.0}% threshold",
            p, thresholds.influence_change_percent
        )],
    }
}
