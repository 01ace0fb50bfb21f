//! What-if gap simulation.
//!
//! Replaces one event's interval, recomputes global gaps, and diffs the gaps
//! touching that event. Gaps are matched by their (preceding, succeeding)
//! event pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::AnalysisError;
use crate::policy::RecommendationThresholds;
use crate::snapshot::EventSnapshot;
use crate::types::{EventId, Gap, Severity};
use super::aggregate::percent_change;
use super::gaps::GapAnalyzer;

/// How a gap touching the modified event changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapChange {
    /// Present before the change, absent after.
    Eliminated,
    /// Absent before the change, present after.
    Created,
    /// Present in both with a different duration.
    Resized,
}

/// One gap affected by a simulated change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectedGap {
    /// Preceding event.
    pub preceding_id: EventId,
    /// Succeeding event.
    pub succeeding_id: EventId,
    /// Kind of change.
    pub change: GapChange,
    /// Duration before the change.
    pub original_minutes: Option<i64>,
    /// Duration after the change.
    pub new_minutes: Option<i64>,
    /// Severity after the change (or before, for eliminated gaps).
    pub severity: Severity,
    /// Percentage change for resized gaps; undefined for a zero baseline.
    pub percent_change: Option<f64>,
}

/// Result of a gap simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapSimulation {
    /// The modified event.
    pub event_id: EventId,
    /// Hypothetical start.
    pub new_start: DateTime<Utc>,
    /// Hypothetical end.
    pub new_end: DateTime<Utc>,
    /// Global gap count before the change.
    pub original_gap_count: usize,
    /// Global gap count after the change.
    pub new_gap_count: usize,
    /// Gaps touching the modified event that changed.
    pub affected_gaps: Vec<AffectedGap>,
    /// Human-readable recommendations.
    pub recommendations: Vec<String>,
}

type PairKey = (EventId, EventId);

fn touching(gaps: &[Gap], event_id: &EventId) -> Vec<(PairKey, Gap)> {
    gaps.iter()
        .filter(|g| g.preceding.id == *event_id || g.succeeding.id == *event_id)
        .map(|g| ((g.preceding.id, g.succeeding.id), g.clone()))
        .collect()
}

/// Simulate moving `event_id` to `[new_start, new_end)`.
pub fn simulate_gap(
    analyzer: &GapAnalyzer,
    snapshot: &EventSnapshot,
    event_id: &EventId,
    new_start: DateTime<Utc>,
    new_end: DateTime<Utc>,
    thresholds: &RecommendationThresholds,
) -> Result<GapSimulation, AnalysisError> {
    let modified = snapshot.with_interval(event_id, new_start, new_end)?;

    let original = analyzer.find_gaps(snapshot, None, 0)?;
    let updated = analyzer.find_gaps(&modified, None, 0)?;

    let before = touching(&original, event_id);
    let after: BTreeMap<PairKey, Gap> = touching(&updated, event_id).into_iter().collect();

    let mut affected = Vec::new();
    for (key, old) in &before {
        match after.get(key) {
            None => affected.push(AffectedGap {
                preceding_id: key.0,
                succeeding_id: key.1,
                change: GapChange::Eliminated,
                original_minutes: Some(old.duration_minutes),
                new_minutes: None,
                severity: old.severity,
                percent_change: None,
            }),
            Some(new) if new.duration_minutes != old.duration_minutes => {
                affected.push(AffectedGap {
                    preceding_id: key.0,
                    succeeding_id: key.1,
                    change: GapChange::Resized,
                    original_minutes: Some(old.duration_minutes),
                    new_minutes: Some(new.duration_minutes),
                    severity: new.severity,
                    percent_change: percent_change(
                        old.duration_minutes as f64,
                        new.duration_minutes as f64,
                    ),
                })
            }
            Some(_) => {}
        }
    }

    let before_keys: BTreeSet<PairKey> = before.iter().map(|(k, _)| *k).collect();
    for (key, new) in touching(&updated, event_id) {
        if !before_keys.contains(&key) {
            affected.push(AffectedGap {
                preceding_id: key.0,
                succeeding_id: key.1,
                change: GapChange::Created,
                original_minutes: None,
                new_minutes: Some(new.duration_minutes),
                severity: new.severity,
                percent_change: None,
            });
        }
    }

    let recommendations = simulation_recommendations(original.len(), updated.len(), &affected, thresholds);

    tracing::debug!(
        event_id = %event_id,
        original_gap_count = original.len(),
        new_gap_count = updated.len(),
        affected = affected.len(),
        "gap simulation complete"
    );

    Ok(GapSimulation {
        event_id: *event_id,
        new_start,
        new_end,
        original_gap_count: original.len(),
        new_gap_count: updated.len(),
        affected_gaps: affected,
        recommendations,
    })
}

fn simulation_recommendations(
    original_count: usize,
    new_count: usize,
    affected: &[AffectedGap],
    thresholds: &RecommendationThresholds,
) -> Vec<String> {
    let count = |kind: GapChange| affected.iter().filter(|a| a.change == kind).count();
    let eliminated = count(GapChange::Eliminated);
    let created = count(GapChange::Created);
    let new_critical = affected
        .iter()
        .filter(|a| a.change != GapChange::Eliminated && a.severity == Severity::Critical)
        .count();

    let mut recommendations = Vec::new();
    if eliminated > 0 {
        recommendations.push(format!("Change eliminates {} gap(s)", eliminated));
    }
    if created > 0 {
        recommendations.push(format!("Change introduces {} new gap(s)", created));
    }
    if new_critical >= thresholds.critical_gap_count && new_critical > 0 {
        recommendations.push(format!(
            "Change leaves {} critical gap(s) next to the moved event; reconsider the new interval",
            new_critical
        ));
    }
    if new_count < original_count {
        recommendations.push(format!(
            "Total gap count drops from {} to {}",
            original_count, new_count
        ));
    } else if new_count > original_count {
        recommendations.push(format!(
            "Total gap count rises from {} to {}",
            original_count, new_count
        ));
    }
    if recommendations.is_empty() {
        recommendations.push("Change has no effect on surrounding gaps".to_string());
    }
    recommendations
}
