//! Async facade over the analysis core.
//!
//! Each call fetches one snapshot from the store, then runs a synchronous
//! analysis over it under the policy's deadline. Precedence graphs are
//! cached by snapshot fingerprint, so repeated path queries against an
//! unchanged store skip the rebuild.

use chrono::{DateTime, Utc};
use lru::LruCache;
use parking_lot::RwLock;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::analysis::{
    shortest_hierarchy_path, simulate_gap, simulate_influence, EventPath, GapAnalyzer, GapReport,
    GapSimulation, GlobalInfluence, InfluenceNetwork, InfluenceReport, InfluenceSimulation,
    InfluenceSpreader, OverlapDetector, OverlapPair, PrecedenceGraph, PrecedenceStats,
};
use crate::error::AnalysisError;
use crate::policy::AnalysisPolicy;
use crate::snapshot::EventSnapshot;
use crate::store::EventStore;
use crate::types::{Deadline, Event, EventId, Gap, TimeWindow};

/// Precedence cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    /// Current number of cached graphs.
    pub len: usize,
    /// Maximum capacity.
    pub cap: usize,
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups that built a new graph.
    pub misses: u64,
}

type GraphCache = RwLock<LruCache<String, Arc<PrecedenceGraph>>>;

/// Temporal analyzer bound to an event store and a policy.
pub struct TemporalAnalyzer<S: EventStore> {
    store: Arc<S>,
    policy: AnalysisPolicy,
    cache: Option<GraphCache>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<S: EventStore + 'static> TemporalAnalyzer<S> {
    /// Create an analyzer. A zero `precedence_cache_entries` disables caching.
    pub fn new(store: Arc<S>, policy: AnalysisPolicy) -> Self {
        let cache = NonZeroUsize::new(policy.precedence_cache_entries)
            .map(|cap| RwLock::new(LruCache::new(cap)));
        Self {
            store,
            policy,
            cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Create an analyzer with the default policy.
    pub fn with_default_policy(store: Arc<S>) -> Self {
        Self::new(store, AnalysisPolicy::default())
    }

    /// The active policy.
    pub fn policy(&self) -> &AnalysisPolicy {
        &self.policy
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Fetch and validate the current snapshot.
    pub async fn snapshot(&self) -> Result<EventSnapshot, AnalysisError> {
        let events = self
            .store
            .get_all_events()
            .await
            .map_err(AnalysisError::from_store)?;
        EventSnapshot::from_events(events)
    }

    fn deadline(&self) -> Deadline {
        Deadline::from_millis(self.policy.analysis_timeout_ms)
    }

    fn spreader(&self, deadline: Deadline) -> InfluenceSpreader {
        InfluenceSpreader::from_policy(&self.policy).with_deadline(deadline)
    }

    /// Look up one event.
    pub async fn get_event(&self, id: &EventId) -> Result<Event, AnalysisError> {
        self.store
            .get_event(id)
            .await
            .map_err(AnalysisError::from_store)?
            .ok_or(AnalysisError::NotFound(*id))
    }

    /// Direct children of an existing event.
    pub async fn get_child_events(&self, parent_id: &EventId) -> Result<Vec<Event>, AnalysisError> {
        self.get_event(parent_id).await?;
        self.store
            .get_child_events(parent_id)
            .await
            .map_err(AnalysisError::from_store)
    }

    /// Overlapping pairs among events intersecting `[window_start, window_end)`.
    pub async fn find_overlaps(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<OverlapPair>, AnalysisError> {
        let window = TimeWindow::new(window_start, window_end)?;
        let snapshot = self.snapshot().await?;
        OverlapDetector::with_deadline(self.deadline()).find_overlaps(&snapshot, &window)
    }

    /// Gaps, globally or within a window.
    pub async fn find_gaps(
        &self,
        window: Option<TimeWindow>,
        min_gap_minutes: i64,
    ) -> Result<Vec<Gap>, AnalysisError> {
        let snapshot = self.snapshot().await?;
        GapAnalyzer::with_deadline(self.deadline()).find_gaps(
            &snapshot,
            window.as_ref(),
            min_gap_minutes,
        )
    }

    /// The longest gap, if any.
    pub async fn largest_gap(
        &self,
        window: Option<TimeWindow>,
        min_gap_minutes: i64,
    ) -> Result<Option<Gap>, AnalysisError> {
        let snapshot = self.snapshot().await?;
        GapAnalyzer::with_deadline(self.deadline()).largest_gap(
            &snapshot,
            window.as_ref(),
            min_gap_minutes,
        )
    }

    /// Gaps with statistics and recommendations.
    pub async fn gap_report(
        &self,
        window: Option<TimeWindow>,
        min_gap_minutes: i64,
    ) -> Result<GapReport, AnalysisError> {
        let gaps = self.find_gaps(window, min_gap_minutes).await?;
        Ok(GapReport::new(gaps, &self.policy.thresholds))
    }

    /// Gap impact of moving one event.
    pub async fn simulate_gap(
        &self,
        event_id: &EventId,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
    ) -> Result<GapSimulation, AnalysisError> {
        let snapshot = self.snapshot().await?;
        simulate_gap(
            &GapAnalyzer::with_deadline(self.deadline()),
            &snapshot,
            event_id,
            new_start,
            new_end,
            &self.policy.thresholds,
        )
    }

    fn precedence_graph(
        &self,
        snapshot: &EventSnapshot,
        deadline: &Deadline,
    ) -> Result<Arc<PrecedenceGraph>, AnalysisError> {
        if let Some(cache) = &self.cache {
            if let Some(graph) = cache.write().get(snapshot.snapshot_id()).cloned() {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(graph);
            }
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let graph = Arc::new(PrecedenceGraph::build(snapshot, deadline)?);
        if let Some(cache) = &self.cache {
            cache
                .write()
                .put(snapshot.snapshot_id().to_string(), Arc::clone(&graph));
        }
        Ok(graph)
    }

    /// Shortest precedence chain between two events.
    pub async fn shortest_precedence_path(
        &self,
        source: &EventId,
        target: &EventId,
    ) -> Result<Option<EventPath>, AnalysisError> {
        let snapshot = self.snapshot().await?;
        let deadline = self.deadline();
        let graph = self.precedence_graph(&snapshot, &deadline)?;
        graph.shortest_path(&snapshot, source, target, &deadline)
    }

    /// Node and edge counts of the current precedence graph.
    pub async fn precedence_stats(&self) -> Result<PrecedenceStats, AnalysisError> {
        let snapshot = self.snapshot().await?;
        Ok(self.precedence_graph(&snapshot, &self.deadline())?.stats())
    }

    /// Shortest parent/child chain between two events.
    pub async fn shortest_hierarchy_path(
        &self,
        source: &EventId,
        target: &EventId,
    ) -> Result<Option<EventPath>, AnalysisError> {
        let snapshot = self.snapshot().await?;
        shortest_hierarchy_path(&snapshot, source, target, &self.deadline())
    }

    /// Decayed influence of one event.
    pub async fn compute_influence(
        &self,
        event_id: &EventId,
        max_depth: u32,
    ) -> Result<InfluenceReport, AnalysisError> {
        let snapshot = self.snapshot().await?;
        self.spreader(self.deadline()).compute(&snapshot, event_id, max_depth)
    }

    /// Influence ranking across all events.
    pub async fn global_influence_analysis(&self) -> Result<GlobalInfluence, AnalysisError> {
        let snapshot = self.snapshot().await?;
        self.spreader(self.deadline()).global(
            &snapshot,
            self.policy.global_influence_depth,
            self.policy.top_influencers,
        )
    }

    /// Influence network for visualization.
    pub async fn influence_network(&self) -> Result<InfluenceNetwork, AnalysisError> {
        let snapshot = self.snapshot().await?;
        self.spreader(self.deadline())
            .network(&snapshot, self.policy.global_influence_depth)
    }

    /// Influence impact of re-parenting one event.
    pub async fn simulate_influence(
        &self,
        event_id: &EventId,
        new_parent: Option<EventId>,
        max_depth: u32,
    ) -> Result<InfluenceSimulation, AnalysisError> {
        let snapshot = self.snapshot().await?;
        simulate_influence(
            &self.spreader(self.deadline()),
            &snapshot,
            event_id,
            new_parent,
            max_depth,
            &self.policy.thresholds,
        )
    }

    /// Cache statistics, `None` when caching is disabled.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|cache| {
            let cache = cache.read();
            CacheStats {
                len: cache.len(),
                cap: cache.cap().get(),
                hits: self.hits.load(Ordering::Relaxed),
                misses: self.misses.load(Ordering::Relaxed),
            }
        })
    }

    /// Drop every cached graph.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.write().clear();
        }
    }
}
