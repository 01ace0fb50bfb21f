//! Golden tests for the temporal kernel.
//!
//! These pin exact outputs for small hand-checked scenarios.

use chrono::{DateTime, TimeZone, Utc};
use temporal_graph_kernel::analysis::interval::{gap_minutes, overlap_minutes, overlaps};
use temporal_graph_kernel::{
    shortest_hierarchy_path, Deadline, Event, EventId, EventSnapshot, GapAnalyzer,
    InfluenceSpreader, OverlapDetector, PrecedenceGraph, Severity, TimeWindow,
};
use uuid::Uuid;

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn id(n: u128) -> EventId {
    EventId::new(Uuid::from_u128(n))
}

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, hour, minute, 0).unwrap()
}

fn event(n: u128, start: DateTime<Utc>, end: DateTime<Utc>) -> Event {
    Event::new(id(n), format!("E{}", n), start, end).unwrap()
}

/// E1[09:00–10:00], E2[10:00–11:00], E3[11:30–12:00], E4[09:00–09:30]
fn precedence_fixture() -> EventSnapshot {
    EventSnapshot::from_events(vec![
        event(1, at(9, 0), at(10, 0)),
        event(2, at(10, 0), at(11, 0)),
        event(3, at(11, 30), at(12, 0)),
        event(4, at(9, 0), at(9, 30)),
    ])
    .unwrap()
}

/// S → C1 → C2, each one hour, children an hour apart.
fn influence_chain() -> EventSnapshot {
    EventSnapshot::from_events(vec![
        event(1, at(8, 0), at(9, 0)),
        event(2, at(9, 0), at(10, 0)).with_parent(id(1)),
        event(3, at(10, 0), at(11, 0)).with_parent(id(2)),
    ])
    .unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Interval Golden Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn golden_touching_events_do_not_overlap() {
    let a = event(1, at(9, 0), at(10, 0));
    let b = event(2, at(10, 0), at(11, 0));

    assert!(!overlaps(&a, &b));
    assert_eq!(overlap_minutes(&a, &b), 0);
    assert_eq!(gap_minutes(&a, &b), 0);
}

#[test]
fn golden_gap_minutes_is_order_independent() {
    let a = event(1, at(9, 0), at(10, 0));
    let b = event(2, at(12, 15), at(13, 0));

    assert_eq!(gap_minutes(&a, &b), 135);
    assert_eq!(gap_minutes(&b, &a), 135);
}

#[test]
fn golden_severity_boundaries() {
    let cases = [
        (29, Severity::Low),
        (30, Severity::Medium),
        (119, Severity::Medium),
        (120, Severity::High),
        (479, Severity::High),
        (480, Severity::Critical),
    ];
    for (minutes, expected) in cases {
        assert_eq!(Severity::from_minutes(minutes), expected, "{} minutes", minutes);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Overlap and Gap Golden Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn golden_overlaps_in_fixture() {
    let snapshot = precedence_fixture();
    let window = TimeWindow::new(at(8, 0), at(13, 0)).unwrap();

    let pairs = OverlapDetector::new().find_overlaps(&snapshot, &window).unwrap();

    // Only E1 and E4 share time.
    assert_eq!(pairs.len(), 1);
    let ids = [pairs[0].event_a.id, pairs[0].event_b.id];
    assert!(ids.contains(&id(1)) && ids.contains(&id(4)));
    assert_eq!(pairs[0].overlap_minutes, 30);
}

#[test]
fn golden_global_gaps_in_fixture() {
    let snapshot = precedence_fixture();

    let gaps = GapAnalyzer::new().find_gaps(&snapshot, None, 0).unwrap();

    // Start order is E1/E4 (09:00), E2, E3; only E2 → E3 leaves a hole.
    assert_eq!(gaps.len(), 1);
    assert_eq!(gaps[0].preceding.id, id(2));
    assert_eq!(gaps[0].succeeding.id, id(3));
    assert_eq!(gaps[0].duration_minutes, 30);
    assert_eq!(gaps[0].severity, Severity::Medium);
}

#[test]
fn golden_gaps_are_adjacent_pairs_only() {
    let snapshot = EventSnapshot::from_events(vec![
        event(1, at(8, 0), at(9, 0)),
        event(2, at(10, 0), at(11, 0)),
        event(3, at(14, 0), at(15, 0)),
    ])
    .unwrap();

    let gaps = GapAnalyzer::new().find_gaps(&snapshot, None, 0).unwrap();

    assert_eq!(gaps.len(), 2);
    // Sorted by duration descending.
    assert_eq!(gaps[0].duration_minutes, 180);
    assert_eq!(gaps[1].duration_minutes, 60);
    assert!(gaps
        .iter()
        .all(|g| !(g.preceding.id == id(1) && g.succeeding.id == id(3))));
}

#[test]
fn golden_empty_window_inside_gap() {
    let snapshot = EventSnapshot::from_events(vec![
        event(1, at(8, 0), at(9, 0)),
        event(2, at(17, 0), at(18, 0)),
    ])
    .unwrap();
    let window = TimeWindow::new(at(12, 0), at(13, 0)).unwrap();

    let gaps = GapAnalyzer::new()
        .find_gaps(&snapshot, Some(&window), 0)
        .unwrap();

    assert_eq!(gaps.len(), 1);
    assert_eq!(gaps[0].duration_minutes, 480);
    assert_eq!(gaps[0].severity, Severity::Critical);
}

// ─────────────────────────────────────────────────────────────────────────────
// Path Golden Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn golden_precedence_path() {
    let snapshot = precedence_fixture();
    let graph = PrecedenceGraph::build(&snapshot, &Deadline::none()).unwrap();

    let path = graph
        .shortest_path(&snapshot, &id(1), &id(3), &Deadline::none())
        .unwrap()
        .expect("E1 precedes E3");

    let ids: Vec<EventId> = path.steps.iter().map(|s| s.event.id).collect();
    assert_eq!(ids, vec![id(1), id(3)]);
    assert_eq!(path.total_duration_minutes, 90);

    let reverse = graph
        .shortest_path(&snapshot, &id(3), &id(1), &Deadline::none())
        .unwrap();
    assert!(reverse.is_none());
}

#[test]
fn golden_hierarchy_path_walks_up_then_down() {
    let snapshot = EventSnapshot::from_events(vec![
        event(1, at(8, 0), at(9, 0)),
        event(2, at(9, 0), at(10, 0)).with_parent(id(1)),
        event(3, at(9, 0), at(9, 30)).with_parent(id(1)),
    ])
    .unwrap();

    let path = shortest_hierarchy_path(&snapshot, &id(2), &id(3), &Deadline::none())
        .unwrap()
        .expect("siblings share a parent");

    let ids: Vec<EventId> = path.steps.iter().map(|s| s.event.id).collect();
    assert_eq!(ids, vec![id(2), id(1), id(3)]);
    assert_eq!(path.total_duration_minutes, 150);
}

// ─────────────────────────────────────────────────────────────────────────────
// Influence Golden Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn golden_influence_chain() {
    let snapshot = influence_chain();

    let report = InfluenceSpreader::new(0.7)
        .compute(&snapshot, &id(1), 2)
        .unwrap();

    let scores: Vec<(EventId, u32)> = report.records.iter().map(|r| (r.event_id, r.depth)).collect();
    assert_eq!(scores, vec![(id(1), 0), (id(2), 1), (id(3), 2)]);
    assert!((report.records[1].score - 0.7).abs() < 1e-9);
    assert!((report.records[2].score - 0.49).abs() < 1e-9);
    assert!((report.total_influence - 2.19).abs() < 1e-9);
}

#[test]
fn golden_influence_cycle_terminates() {
    let snapshot = EventSnapshot::from_events(vec![
        event(1, at(8, 0), at(9, 0)).with_parent(id(2)),
        event(2, at(9, 0), at(10, 0)).with_parent(id(1)),
    ])
    .unwrap();

    let report = InfluenceSpreader::new(0.7)
        .compute(&snapshot, &id(1), 5)
        .unwrap();

    let source_count = report.records.iter().filter(|r| r.event_id == id(1)).count();
    assert_eq!(source_count, 1);
    assert_eq!(report.records.len(), 2);
    assert!((report.total_influence - 1.7).abs() < 1e-9);
}

#[test]
fn golden_snapshot_id_is_stable() {
    let a = precedence_fixture();
    let b = EventSnapshot::from_events(a.events().iter().rev().cloned().collect()).unwrap();

    assert_eq!(a.snapshot_id(), b.snapshot_id());
}
