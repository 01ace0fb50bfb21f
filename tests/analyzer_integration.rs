//! End-to-end tests for the analyzer over the in-memory store.
//!
//! Fixture: a one-day plan with a root event, two sessions under it and a
//! follow-up under the second session.
//!
//! ```text
//! 1 Planning   [08:00–09:00]
//! ├── 2 Design     [09:00–10:30]
//! └── 3 Build      [10:00–12:00]
//!     └── 4 Review [15:00–16:00]
//! 5 Retro      [20:00–20:30] (no parent)
//! ```

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use temporal_graph_kernel::analysis::GapChange;
use temporal_graph_kernel::{
    run_ingestion, AnalysisError, AnalysisPolicy, Event, EventId, EventStore, IngestRecord,
    IngestionJobRegistry, InMemoryEventStore, JobStatus, Severity, TemporalAnalyzer, TimeWindow,
};
use uuid::Uuid;

fn id(n: u128) -> EventId {
    EventId::new(Uuid::from_u128(n))
}

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, hour, minute, 0).unwrap()
}

fn event(n: u128, name: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Event {
    Event::new(id(n), name, start, end).unwrap()
}

fn plan_store() -> Arc<InMemoryEventStore> {
    let store = InMemoryEventStore::with_events(vec![
        event(1, "Planning", at(8, 0), at(9, 0)),
        event(2, "Design", at(9, 0), at(10, 30)).with_parent(id(1)),
        event(3, "Build", at(10, 0), at(12, 0)).with_parent(id(1)),
        event(4, "Review", at(15, 0), at(16, 0)).with_parent(id(3)),
        event(5, "Retro", at(20, 0), at(20, 30)),
    ])
    .unwrap();
    Arc::new(store)
}

fn analyzer() -> TemporalAnalyzer<InMemoryEventStore> {
    TemporalAnalyzer::with_default_policy(plan_store())
}

#[tokio::test]
async fn test_overlaps_in_morning_window() {
    let analyzer = analyzer();

    let pairs = analyzer.find_overlaps(at(8, 0), at(12, 0)).await.unwrap();

    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].event_a.id, id(2));
    assert_eq!(pairs[0].event_b.id, id(3));
    assert_eq!(pairs[0].overlap_minutes, 30);
}

#[tokio::test]
async fn test_overlaps_reject_inverted_window() {
    let analyzer = analyzer();

    let err = analyzer.find_overlaps(at(12, 0), at(8, 0)).await.unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidRange { .. }));
}

#[tokio::test]
async fn test_global_gap_report() {
    let analyzer = analyzer();

    let report = analyzer.gap_report(None, 0).await.unwrap();

    // 12:00 → 15:00 and 16:00 → 20:00.
    let minutes: Vec<i64> = report.gaps.iter().map(|g| g.duration_minutes).collect();
    assert_eq!(minutes, vec![240, 180]);
    assert_eq!(report.statistics.count, 2);
    assert_eq!(report.statistics.by_severity.high, 2);
    assert_eq!(report.statistics.average_minutes, 210.0);
}

#[tokio::test]
async fn test_min_gap_filter_and_largest() {
    let analyzer = analyzer();

    let gaps = analyzer.find_gaps(None, 200).await.unwrap();
    assert_eq!(gaps.len(), 1);
    assert_eq!(gaps[0].preceding.id, id(4));

    let largest = analyzer.largest_gap(None, 0).await.unwrap().unwrap();
    assert_eq!(largest.duration_minutes, 240);
    assert_eq!(largest.severity, Severity::High);

    assert!(analyzer.largest_gap(None, 1000).await.unwrap().is_none());
}

#[tokio::test]
async fn test_windowed_gaps_include_neighbors() {
    let analyzer = analyzer();
    let window = TimeWindow::new(at(13, 0), at(14, 0)).unwrap();

    let gaps = analyzer.find_gaps(Some(window), 0).await.unwrap();

    assert_eq!(gaps.len(), 1);
    assert_eq!(gaps[0].preceding.id, id(3));
    assert_eq!(gaps[0].succeeding.id, id(4));
}

#[tokio::test]
async fn test_simulate_gap_closes_afternoon() {
    let analyzer = analyzer();

    // Stretch Review back to 12:00.
    let simulation = analyzer
        .simulate_gap(&id(4), at(12, 0), at(16, 0))
        .await
        .unwrap();

    assert_eq!(simulation.original_gap_count, 2);
    assert_eq!(simulation.new_gap_count, 1);
    assert!(simulation
        .affected_gaps
        .iter()
        .any(|g| g.change == GapChange::Eliminated && g.preceding_id == id(3)));
}

#[tokio::test]
async fn test_precedence_path_and_cache() {
    let analyzer = analyzer();

    let path = analyzer
        .shortest_precedence_path(&id(1), &id(5))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(path.steps.len(), 2);
    assert_eq!(path.total_duration_minutes, 90);

    analyzer
        .shortest_precedence_path(&id(2), &id(4))
        .await
        .unwrap();
    let stats = analyzer.cache_stats().unwrap();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
}

#[tokio::test]
async fn test_cache_invalidated_by_new_event() {
    let store = plan_store();
    let analyzer = TemporalAnalyzer::with_default_policy(Arc::clone(&store));

    analyzer.precedence_stats().await.unwrap();
    store
        .add_event(event(6, "Late", at(22, 0), at(23, 0)))
        .unwrap();
    let stats = analyzer.precedence_stats().await.unwrap();

    assert_eq!(stats.node_count, 6);
    assert_eq!(analyzer.cache_stats().unwrap().misses, 2);
}

#[tokio::test]
async fn test_hierarchy_path_through_root() {
    let analyzer = analyzer();

    let path = analyzer
        .shortest_hierarchy_path(&id(2), &id(4))
        .await
        .unwrap()
        .unwrap();

    let ids: Vec<EventId> = path.steps.iter().map(|s| s.event.id).collect();
    assert_eq!(ids, vec![id(2), id(1), id(3), id(4)]);

    let none = analyzer
        .shortest_hierarchy_path(&id(2), &id(5))
        .await
        .unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn test_influence_of_root() {
    let analyzer = analyzer();

    let report = analyzer.compute_influence(&id(1), 2).await.unwrap();

    // 1.0 + 0.7 * 2 + 0.49
    assert_eq!(report.records.len(), 4);
    assert!((report.total_influence - 2.89).abs() < 1e-9);
}

#[tokio::test]
async fn test_global_influence_ranks_root_first() {
    let analyzer = analyzer();

    let global = analyzer.global_influence_analysis().await.unwrap();

    // Planning and Build tie at 2.89; snapshot order breaks the tie.
    assert_eq!(global.event_count, 5);
    assert_eq!(global.top_influencers[0].event.id, id(1));
    assert_eq!(global.top_influencers[1].event.id, id(3));
    assert!((global.max_influence - 2.89).abs() < 1e-9);
    assert!(global.variance > 0.0);
}

#[tokio::test]
async fn test_influence_network_links() {
    let analyzer = analyzer();

    let network = analyzer.influence_network().await.unwrap();

    assert_eq!(network.nodes.len(), 5);
    assert_eq!(network.links.len(), 3);
}

#[tokio::test]
async fn test_simulate_reparent() {
    let analyzer = analyzer();

    let simulation = analyzer
        .simulate_influence(&id(5), Some(id(4)), 2)
        .await
        .unwrap();

    assert_eq!(simulation.original_parent, None);
    assert_eq!(simulation.new_parent, Some(id(4)));
    assert!(simulation.new_total > simulation.original_total);
    assert_eq!(simulation.original_reach, 1);
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let analyzer = analyzer();
    let missing = id(99);

    assert!(matches!(
        analyzer.get_event(&missing).await,
        Err(AnalysisError::NotFound(_))
    ));
    assert!(matches!(
        analyzer.compute_influence(&missing, 2).await,
        Err(AnalysisError::NotFound(_))
    ));
    assert!(matches!(
        analyzer.shortest_precedence_path(&missing, &id(1)).await,
        Err(AnalysisError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_child_events() {
    let analyzer = analyzer();

    let children = analyzer.get_child_events(&id(1)).await.unwrap();
    let ids: Vec<EventId> = children.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![id(2), id(3)]);
}

#[tokio::test]
async fn test_expired_deadline_fails_fast() {
    let policy = AnalysisPolicy::default().with_timeout_ms(0);
    let analyzer = TemporalAnalyzer::new(plan_store(), policy);

    let err = analyzer.find_gaps(None, 0).await.unwrap_err();
    assert_eq!(err, AnalysisError::DeadlineExceeded);
}

#[tokio::test]
async fn test_ingestion_feeds_analysis() {
    let store = InMemoryEventStore::new();
    let registry = IngestionJobRegistry::new(4);
    let job = registry.create(3);

    let records = vec![
        IngestRecord {
            id: Some(id(10).to_string()),
            name: Some("Standup".into()),
            start: Some("2024-03-01T09:00:00Z".into()),
            end: Some("2024-03-01T09:15:00Z".into()),
            ..IngestRecord::default()
        },
        IngestRecord {
            id: Some(id(11).to_string()),
            name: Some("Focus".into()),
            start: Some("2024-03-01T11:15:00+01:00".into()),
            end: Some("2024-03-01T12:00:00+01:00".into()),
            ..IngestRecord::default()
        },
        IngestRecord {
            name: Some("Broken".into()),
            start: Some("not a timestamp".into()),
            ..IngestRecord::default()
        },
    ];

    let status = run_ingestion(&registry, &store, job, records).await;
    assert_eq!(
        status,
        JobStatus::Completed {
            accepted: 2,
            rejected: 1
        }
    );
    assert_eq!(registry.get(&job).unwrap().rejected_records[0].index, 2);

    let store = Arc::new(store);
    assert_eq!(store.get_all_events().await.unwrap().len(), 2);

    let analyzer = TemporalAnalyzer::with_default_policy(store);
    let gaps = analyzer.find_gaps(None, 0).await.unwrap();
    // 09:15Z to 10:15Z once the +01:00 offset is normalized.
    assert_eq!(gaps.len(), 1);
    assert_eq!(gaps[0].duration_minutes, 60);
}
