//! Hierarchical influence with depth decay.
//!
//! Influence spreads from a source over parent/child links, never over the
//! precedence graph. An event reached at depth `d` scores `decay^d`; when an
//! event is reachable along several branches the shallowest one wins, so
//! scores never compound.
//!
//! The traversal is an explicit FIFO worklist. Each entry owns the path that
//! led to it and a neighbor already on that path is never pushed, which
//! keeps cyclic parent declarations from looping.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::error::AnalysisError;
use crate::policy::{AnalysisPolicy, RecommendationThresholds};
use crate::snapshot::EventSnapshot;
use crate::types::{Deadline, EventId, EventSummary};
use super::aggregate::{
    influence_recommendations, percent_change, population_variance, top_n_by, InfluenceBucket,
    InfluenceDistribution,
};

/// One event reached from the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfluenceRecord {
    /// The reached event.
    pub event_id: EventId,
    /// Hops from the source.
    pub depth: u32,
    /// `decay_factor^depth`.
    pub score: f64,
}

/// Influence of one source event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfluenceReport {
    /// The source event.
    pub source: EventSummary,
    /// Depth bound actually applied (after clamping).
    pub max_depth: u32,
    /// Decay per hop.
    pub decay_factor: f64,
    /// Reached events ordered by depth, then discovery.
    pub records: Vec<InfluenceRecord>,
    /// Sum of all record scores, source included.
    pub total_influence: f64,
}

/// Total influence of one event in a global view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfluenceTotal {
    /// The event.
    pub event: EventSummary,
    /// Its total influence.
    pub total_influence: f64,
    /// Number of events reached, itself included.
    pub reach: usize,
}

/// Influence ranking across the whole snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalInfluence {
    /// Depth used per event.
    pub depth: u32,
    /// Number of events analyzed.
    pub event_count: usize,
    /// Highest total observed.
    pub max_influence: f64,
    /// Highest totals, ties in snapshot order.
    pub top_influencers: Vec<InfluenceTotal>,
    /// Bucket counts relative to `max_influence`.
    pub distribution: InfluenceDistribution,
    /// Population variance of all totals.
    pub variance: f64,
}

/// Node of the influence network view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkNode {
    /// Event ID.
    pub id: EventId,
    /// Event name.
    pub name: String,
    /// Total influence at the global depth.
    pub total_influence: f64,
    /// Bucket relative to the maximum total.
    pub bucket: InfluenceBucket,
}

/// Parent→child link of the influence network view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkLink {
    /// Parent event.
    pub source: EventId,
    /// Child event.
    pub target: EventId,
}

/// Nodes and links for visualizing influence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfluenceNetwork {
    /// One node per event, in snapshot order.
    pub nodes: Vec<NetworkNode>,
    /// Parent→child links whose parent is in the snapshot.
    pub links: Vec<NetworkLink>,
}

/// Result of re-parenting an event hypothetically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfluenceSimulation {
    /// The re-parented event.
    pub event_id: EventId,
    /// Declared parent before the change.
    pub original_parent: Option<EventId>,
    /// Hypothetical parent (`None` detaches the event).
    pub new_parent: Option<EventId>,
    /// Depth bound applied.
    pub max_depth: u32,
    /// Total influence before the change.
    pub original_total: f64,
    /// Total influence after the change.
    pub new_total: f64,
    /// Events reached before the change.
    pub original_reach: usize,
    /// Events reached after the change.
    pub new_reach: usize,
    /// Percentage change; undefined for a zero baseline.
    pub percent_change: Option<f64>,
    /// Human-readable recommendations.
    pub recommendations: Vec<String>,
}

/// Computes decayed influence over a snapshot's hierarchy.
#[derive(Debug, Clone, Copy)]
pub struct InfluenceSpreader {
    decay_factor: f64,
    max_depth_limit: u32,
    parallel_threshold: usize,
    deadline: Deadline,
}

impl Default for InfluenceSpreader {
    fn default() -> Self {
        Self::from_policy(&AnalysisPolicy::default())
    }
}

impl InfluenceSpreader {
    /// Spreader with a custom decay factor and the default policy limits.
    pub fn new(decay_factor: f64) -> Self {
        Self {
            decay_factor: decay_factor.clamp(0.0, 1.0),
            ..Self::default()
        }
    }

    /// Spreader configured from a policy.
    pub fn from_policy(policy: &AnalysisPolicy) -> Self {
        Self {
            decay_factor: policy.decay_factor,
            max_depth_limit: policy.max_influence_depth,
            parallel_threshold: policy.parallel_threshold,
            deadline: Deadline::none(),
        }
    }

    /// Attach a deadline.
    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }

    /// Override the depth limit applied to every query.
    pub fn with_max_depth_limit(mut self, limit: u32) -> Self {
        self.max_depth_limit = limit;
        self
    }

    /// Override the snapshot size above which global views use worker threads.
    pub fn with_parallel_threshold(mut self, parallel_threshold: usize) -> Self {
        self.parallel_threshold = parallel_threshold;
        self
    }

    /// Decay per hop.
    pub fn decay_factor(&self) -> f64 {
        self.decay_factor
    }

    fn score(&self, depth: u32) -> f64 {
        self.decay_factor.powi(depth as i32)
    }

    /// Influence of `source` up to `max_depth` hops (clamped to the policy limit).
    pub fn compute(
        &self,
        snapshot: &EventSnapshot,
        source: &EventId,
        max_depth: u32,
    ) -> Result<InfluenceReport, AnalysisError> {
        let position = snapshot.position(source).ok_or(AnalysisError::NotFound(*source))?;
        let max_depth = max_depth.min(self.max_depth_limit);
        let reached = self.spread(snapshot, position, max_depth)?;

        let events = snapshot.events();
        let records: Vec<InfluenceRecord> = reached
            .iter()
            .map(|&(p, depth)| InfluenceRecord {
                event_id: events[p].id,
                depth,
                score: self.score(depth),
            })
            .collect();
        let total_influence: f64 = records.iter().map(|r| r.score).sum();

        tracing::debug!(
            source = %source,
            max_depth,
            reached = records.len(),
            total_influence,
            "influence computed"
        );

        Ok(InfluenceReport {
            source: events[position].summary(),
            max_depth,
            decay_factor: self.decay_factor,
            records,
            total_influence,
        })
    }

    /// Reached positions with their minimum depth, ordered by depth then discovery.
    fn spread(
        &self,
        snapshot: &EventSnapshot,
        source: usize,
        max_depth: u32,
    ) -> Result<Vec<(usize, u32)>, AnalysisError> {
        let events = snapshot.events();
        let mut best_depth: Vec<Option<u32>> = vec![None; snapshot.len()];
        let mut reached = Vec::new();

        let mut worklist: VecDeque<(usize, u32, Vec<usize>)> = VecDeque::new();
        worklist.push_back((source, 0, vec![source]));

        while let Some((node, depth, path)) = worklist.pop_front() {
            self.deadline.check()?;

            // FIFO order means the first arrival is the shallowest.
            if best_depth[node].is_some() {
                continue;
            }
            best_depth[node] = Some(depth);
            reached.push((node, depth));

            if depth >= max_depth {
                continue;
            }

            let neighbors = snapshot
                .child_positions(&events[node].id)
                .iter()
                .copied()
                .chain(snapshot.parent_position(node));
            for next in neighbors {
                if path.contains(&next) || best_depth[next].is_some() {
                    continue;
                }
                let mut branch = path.clone();
                branch.push(next);
                worklist.push_back((next, depth + 1, branch));
            }
        }

        Ok(reached)
    }

    fn total_at(
        &self,
        snapshot: &EventSnapshot,
        position: usize,
        depth: u32,
    ) -> Result<(f64, usize), AnalysisError> {
        let reached = self.spread(snapshot, position, depth)?;
        let total = reached.iter().map(|&(_, d)| self.score(d)).sum();
        Ok((total, reached.len()))
    }

    /// `(total, reach)` for every event in snapshot order.
    fn totals(
        &self,
        snapshot: &EventSnapshot,
        depth: u32,
    ) -> Result<Vec<(f64, usize)>, AnalysisError> {
        let n = snapshot.len();
        if n <= self.parallel_threshold {
            return (0..n).map(|p| self.total_at(snapshot, p, depth)).collect();
        }

        tracing::debug!(
            event_count = n,
            workers = rayon::current_num_threads(),
            "fanning out influence computation"
        );

        // Indexed collect keeps snapshot order.
        (0..n)
            .into_par_iter()
            .map(|p| self.total_at(snapshot, p, depth))
            .collect()
    }

    /// Rank every event by its total influence at `depth`.
    pub fn global(
        &self,
        snapshot: &EventSnapshot,
        depth: u32,
        top_n: usize,
    ) -> Result<GlobalInfluence, AnalysisError> {
        let depth = depth.min(self.max_depth_limit);
        let totals = self.totals(snapshot, depth)?;

        let ranked: Vec<InfluenceTotal> = snapshot
            .events()
            .iter()
            .zip(&totals)
            .map(|(event, &(total_influence, reach))| InfluenceTotal {
                event: event.summary(),
                total_influence,
                reach,
            })
            .collect();

        let values: Vec<f64> = totals.iter().map(|&(t, _)| t).collect();
        let max_influence = values.iter().copied().fold(0.0, f64::max);

        let mut distribution = InfluenceDistribution::default();
        for &value in &values {
            distribution.increment(InfluenceBucket::classify(value, max_influence));
        }

        Ok(GlobalInfluence {
            depth,
            event_count: snapshot.len(),
            max_influence,
            top_influencers: top_n_by(&ranked, top_n, |t| t.total_influence),
            distribution,
            variance: population_variance(&values),
        })
    }

    /// Node and link view of the hierarchy, weighted by influence at `depth`.
    pub fn network(
        &self,
        snapshot: &EventSnapshot,
        depth: u32,
    ) -> Result<InfluenceNetwork, AnalysisError> {
        let depth = depth.min(self.max_depth_limit);
        let totals = self.totals(snapshot, depth)?;
        let max_influence = totals.iter().map(|&(t, _)| t).fold(0.0, f64::max);
        let events = snapshot.events();

        let nodes = events
            .iter()
            .zip(&totals)
            .map(|(event, &(total_influence, _))| NetworkNode {
                id: event.id,
                name: event.name.clone(),
                total_influence,
                bucket: InfluenceBucket::classify(total_influence, max_influence),
            })
            .collect();

        let links = (0..events.len())
            .filter_map(|p| {
                snapshot.parent_position(p).map(|parent| NetworkLink {
                    source: events[parent].id,
                    target: events[p].id,
                })
            })
            .collect();

        Ok(InfluenceNetwork { nodes, links })
    }
}

/// Recompute `event_id`'s influence with its parent replaced by `new_parent`.
pub fn simulate_influence(
    spreader: &InfluenceSpreader,
    snapshot: &EventSnapshot,
    event_id: &EventId,
    new_parent: Option<EventId>,
    max_depth: u32,
    thresholds: &RecommendationThresholds,
) -> Result<InfluenceSimulation, AnalysisError> {
    let original_parent = snapshot.require(event_id)?.parent_id;
    let modified = snapshot.with_parent(event_id, new_parent)?;

    let before = spreader.compute(snapshot, event_id, max_depth)?;
    let after = spreader.compute(&modified, event_id, max_depth)?;

    let change = percent_change(before.total_influence, after.total_influence);
    let recommendations = influence_recommendations(change, thresholds);

    Ok(InfluenceSimulation {
        event_id: *event_id,
        original_parent,
        new_parent,
        max_depth: before.max_depth,
        original_total: before.total_influence,
        new_total: after.total_influence,
        original_reach: before.records.len(),
        new_reach: after.records.len(),
        percent_change: change,
        recommendations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Event;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn id(n: u128) -> EventId {
        EventId::new(Uuid::from_u128(n))
    }

    fn event(n: u128, parent: Option<u128>) -> Event {
        let base: DateTime<Utc> = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let start = base + Duration::minutes(n as i64);
        let e = Event::new(id(n), format!("node-{}", n), start, start + Duration::minutes(15)).unwrap();
        match parent {
            Some(p) => e.with_parent(id(p)),
            None => e,
        }
    }

    fn chain() -> EventSnapshot {
        // S(1) ← C1(2) ← C2(3)
        EventSnapshot::from_events(vec![event(1, None), event(2, Some(1)), event(3, Some(2))]).unwrap()
    }

    #[test]
    fn test_decay_example() {
        let report = InfluenceSpreader::new(0.7).compute(&chain(), &id(1), 2).unwrap();

        let scores: Vec<(EventId, u32, f64)> =
            report.records.iter().map(|r| (r.event_id, r.depth, r.score)).collect();
        assert_eq!(scores.len(), 3);
        assert_eq!((scores[0].0, scores[0].1), (id(1), 0));
        assert_eq!((scores[1].0, scores[1].1), (id(2), 1));
        assert_eq!((scores[2].0, scores[2].1), (id(3), 2));
        assert!((scores[1].2 - 0.7).abs() < 1e-12);
        assert!((scores[2].2 - 0.49).abs() < 1e-12);
        assert!((report.total_influence - 2.19).abs() < 1e-9);
    }

    #[test]
    fn test_depth_bound() {
        let report = InfluenceSpreader::new(0.7).compute(&chain(), &id(1), 1).unwrap();
        assert_eq!(report.records.len(), 2);
        assert!((report.total_influence - 1.7).abs() < 1e-9);

        let zero = InfluenceSpreader::new(0.7).compute(&chain(), &id(1), 0).unwrap();
        assert_eq!(zero.records.len(), 1);
        assert_eq!(zero.total_influence, 1.0);
    }

    #[test]
    fn test_ascends_to_parent() {
        let report = InfluenceSpreader::new(0.5).compute(&chain(), &id(3), 2).unwrap();
        let ids: Vec<EventId> = report.records.iter().map(|r| r.event_id).collect();
        assert_eq!(ids, vec![id(3), id(2), id(1)]);
        assert!((report.total_influence - 1.75).abs() < 1e-9);
    }

    #[test]
    fn test_two_cycle_counts_once() {
        let snapshot = EventSnapshot::from_events(vec![event(1, Some(2)), event(2, Some(1))]).unwrap();
        let report = InfluenceSpreader::new(0.7).compute(&snapshot, &id(1), 10).unwrap();

        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records.iter().filter(|r| r.event_id == id(1)).count(), 1);
        assert!((report.total_influence - 1.7).abs() < 1e-9);
    }

    #[test]
    fn test_self_parent() {
        let snapshot = EventSnapshot::from_events(vec![event(1, Some(1))]).unwrap();
        let report = InfluenceSpreader::new(0.7).compute(&snapshot, &id(1), 5).unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.total_influence, 1.0);
    }

    #[test]
    fn test_diamond_keeps_shallowest() {
        // 1 has children 2 and 3; 4 is a child of 2 and reachable from 3 via 1.
        let snapshot = EventSnapshot::from_events(vec![
            event(1, None),
            event(2, Some(1)),
            event(3, Some(1)),
            event(4, Some(2)),
        ])
        .unwrap();
        let report = InfluenceSpreader::new(0.7).compute(&snapshot, &id(3), 4).unwrap();

        let four = report.records.iter().find(|r| r.event_id == id(4)).unwrap();
        assert_eq!(four.depth, 3);
        assert_eq!(report.records.len(), 4);
    }

    #[test]
    fn test_depth_is_clamped() {
        let spreader = InfluenceSpreader::new(0.7).with_max_depth_limit(1);
        let report = spreader.compute(&chain(), &id(1), 50).unwrap();
        assert_eq!(report.max_depth, 1);
        assert_eq!(report.records.len(), 2);
    }

    #[test]
    fn test_unknown_source() {
        let err = InfluenceSpreader::default().compute(&chain(), &id(9), 2).unwrap_err();
        assert_eq!(err, AnalysisError::NotFound(id(9)));
    }

    #[test]
    fn test_expired_deadline() {
        let spreader = InfluenceSpreader::default().with_deadline(Deadline::after(std::time::Duration::ZERO));
        std::thread::sleep(std::time::Duration::from_millis(2));
        let err = spreader.compute(&chain(), &id(1), 2).unwrap_err();
        assert_eq!(err, AnalysisError::DeadlineExceeded);
    }

    fn forest() -> EventSnapshot {
        let mut events = vec![event(1, None)];
        for n in 2..=6 {
            events.push(event(n, Some(1)));
        }
        events.push(event(7, None));
        events.push(event(8, Some(7)));
        EventSnapshot::from_events(events).unwrap()
    }

    #[test]
    fn test_global_ranking() {
        let global = InfluenceSpreader::new(0.5).global(&forest(), 1, 2).unwrap();

        assert_eq!(global.event_count, 8);
        assert_eq!(global.top_influencers[0].event.id, id(1));
        assert!((global.max_influence - 3.5).abs() < 1e-9);
        assert_eq!(global.top_influencers.len(), 2);
        assert_eq!(
            global.distribution.high + global.distribution.medium + global.distribution.low,
            8
        );
        assert!(global.variance > 0.0);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let snapshot = forest();
        let sequential = InfluenceSpreader::new(0.7)
            .with_parallel_threshold(usize::MAX)
            .global(&snapshot, 3, 10)
            .unwrap();
        let parallel = InfluenceSpreader::new(0.7)
            .with_parallel_threshold(0)
            .global(&snapshot, 3, 10)
            .unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_global_empty_snapshot() {
        let global = InfluenceSpreader::default().global(&EventSnapshot::empty(), 3, 10).unwrap();
        assert!(global.top_influencers.is_empty());
        assert_eq!(global.max_influence, 0.0);
        assert_eq!(global.variance, 0.0);
    }

    #[test]
    fn test_network_links() {
        let network = InfluenceSpreader::default().network(&forest(), 2).unwrap();
        assert_eq!(network.nodes.len(), 8);
        assert_eq!(network.links.len(), 6);
        assert!(network.links.contains(&NetworkLink { source: id(7), target: id(8) }));
        let root = network.nodes.iter().find(|n| n.id == id(1)).unwrap();
        assert_eq!(root.bucket, InfluenceBucket::High);
    }

    #[test]
    fn test_simulate_detach() {
        let sim = simulate_influence(
            &InfluenceSpreader::new(0.7),
            &chain(),
            &id(2),
            None,
            2,
            &RecommendationThresholds::default(),
        )
        .unwrap();

        assert_eq!(sim.original_parent, Some(id(1)));
        assert!((sim.original_total - 2.4).abs() < 1e-9);
        assert!((sim.new_total - 1.7).abs() < 1e-9);
        assert_eq!(sim.new_reach, 2);
        let change = sim.percent_change.unwrap();
        assert!((change - (-29.166_666)).abs() < 1e-3);
        assert!(sim.recommendations[0].contains("decreases"));
    }

    #[test]
    fn test_simulate_unknown_parent() {
        let err = simulate_influence(
            &InfluenceSpreader::default(),
            &chain(),
            &id(2),
            Some(id(99)),
            2,
            &RecommendationThresholds::default(),
        )
        .unwrap_err();
        assert_eq!(err, AnalysisError::NotFound(id(99)));
    }
}
