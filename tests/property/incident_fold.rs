// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for the Incident Fold
//!
//! The fold is shared by the synchronous service and the asynchronous
//! snapshot projection, so these laws are what makes the two views agree.

use std::sync::Arc;

use proptest::prelude::*;
use tokio::sync::watch;
use uuid::Uuid;

use crate::fixtures::*;
use helpdesk_incidents::aggregate::{fold_events, IncidentDetails};
use helpdesk_incidents::config::DaemonConfig;
use helpdesk_incidents::event_store::{EventStore, InMemoryEventStore};
use helpdesk_incidents::events::{IncidentCategory, IncidentEvent, IncidentPriority};
use helpdesk_incidents::projection::incident_details::load_snapshot;
use helpdesk_incidents::projection::{
    AsyncProjection, IncidentDetailsSnapshotProjection, InMemoryProjectionStorage,
    ProjectionStorage, ShardStatus, ShardWorker,
};

// ============================================================================
// Strategies
// ============================================================================

fn arb_category() -> impl Strategy<Value = IncidentCategory> {
    prop_oneof![
        Just(IncidentCategory::Software),
        Just(IncidentCategory::Hardware),
        Just(IncidentCategory::Network),
        Just(IncidentCategory::Database),
    ]
}

fn arb_priority() -> impl Strategy<Value = IncidentPriority> {
    prop_oneof![
        Just(IncidentPriority::Critical),
        Just(IncidentPriority::High),
        Just(IncidentPriority::Medium),
        Just(IncidentPriority::Low),
    ]
}

/// Any event other than `IncidentLogged`; a tiny content alphabet makes
/// duplicate notes likely
fn arb_partial_event(id: Uuid) -> impl Strategy<Value = IncidentEvent> {
    prop_oneof![
        arb_category().prop_map(move |c| categorised_fixture(id, c)),
        arb_priority().prop_map(move |p| prioritised_fixture(id, p)),
        Just(agent_assigned_fixture(id)),
        ("[ab]{1,2}", any::<bool>())
            .prop_map(move |(content, visible)| agent_responded_fixture(id, &content, visible)),
        "[ab]{1,2}".prop_map(move |content| customer_responded_fixture(id, &content)),
        Just(resolved_fixture(id)),
        Just(acknowledged_fixture(id)),
        Just(closed_fixture(id)),
    ]
}

/// A well-formed stream: `IncidentLogged` followed by partial updates
fn arb_stream(id: Uuid) -> impl Strategy<Value = Vec<IncidentEvent>> {
    prop::collection::vec(arb_partial_event(id), 0..24).prop_map(move |rest| {
        let mut events = vec![logged_fixture(id)];
        events.extend(rest);
        events
    })
}

// ============================================================================
// Fold Laws
// ============================================================================

proptest! {
    /// Folding a prefix and then the suffix equals folding the whole stream
    #[test]
    fn prop_incremental_fold(
        events in arb_stream(incident_id()),
        split in any::<prop::sample::Index>(),
    ) {
        let k = split.index(events.len() + 1);
        let (prefix, suffix) = events.split_at(k);

        let incremental = fold_events(fold_events(None, prefix), suffix);
        let whole = IncidentDetails::from_events(&events);

        prop_assert_eq!(incremental, whole);
    }

    /// Same events, same state
    #[test]
    fn prop_fold_is_deterministic(events in arb_stream(incident_id())) {
        prop_assert_eq!(
            IncidentDetails::from_events(&events),
            IncidentDetails::from_events(&events)
        );
    }

    /// Version counts every applied event
    #[test]
    fn prop_version_counts_events(events in arb_stream(incident_id())) {
        let state = IncidentDetails::from_events(&events).expect("stream starts with logged");
        prop_assert_eq!(state.version, events.len() as u64);
    }

    /// Notes behave as a set in first-seen order
    #[test]
    fn prop_notes_have_no_duplicates(events in arb_stream(incident_id())) {
        let state = IncidentDetails::from_events(&events).expect("stream starts with logged");

        for (i, note) in state.notes.iter().enumerate() {
            prop_assert!(!state.notes[i + 1..].contains(note));
        }
    }

    /// Optional fields are set by their events only
    #[test]
    fn prop_category_is_last_categorised(events in arb_stream(incident_id())) {
        let expected = events.iter().rev().find_map(|e| match e {
            IncidentEvent::IncidentCategorised(c) => Some(c.category),
            _ => None,
        });

        let state = IncidentDetails::from_events(&events).expect("stream starts with logged");
        prop_assert_eq!(state.category, expected);
    }
}

// ============================================================================
// Synchronous vs Asynchronous Convergence
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Once the worker's progress reaches the stream's last sequence, the
    /// snapshot equals the synchronously folded aggregate
    #[test]
    fn prop_snapshot_converges_with_aggregate(
        first in arb_stream(parse_uuid(INCIDENT_ID_1)),
        second in arb_stream(parse_uuid(INCIDENT_ID_2)),
        batch_events_max in 1usize..8,
    ) {
        tokio_test::block_on(async {
            let store = Arc::new(InMemoryEventStore::new());
            let storage = Arc::new(InMemoryProjectionStorage::new("default"));
            let projection = Arc::new(IncidentDetailsSnapshotProjection::new());
            let shard = projection.shard_name();

            // Interleave the two streams one event at a time
            let mut a = first.iter();
            let mut b = second.iter();
            loop {
                let (next_a, next_b) = (a.next(), b.next());
                if next_a.is_none() && next_b.is_none() {
                    break;
                }
                for event in next_a.into_iter().chain(next_b) {
                    store
                        .append_events(event.incident_id(), vec![event.clone()], None)
                        .await
                        .unwrap();
                }
            }

            let (status, _rx) = watch::channel(ShardStatus::default());
            let worker = ShardWorker::new(
                projection,
                store.clone(),
                storage.clone(),
                DaemonConfig { batch_events_max, ..DaemonConfig::default() },
                Arc::new(status),
            );
            while worker.run_once().await.unwrap() > 0 {}

            let watermark = store.current_global_sequence().await.unwrap();
            assert_eq!(storage.progress(&shard).await.unwrap(), watermark);

            for (id, events) in [(INCIDENT_ID_1, &first), (INCIDENT_ID_2, &second)] {
                let id = parse_uuid(id);
                let snapshot = load_snapshot(storage.as_ref(), &shard, id)
                    .await
                    .unwrap()
                    .expect("snapshot exists");

                assert_eq!(snapshot.id, id);
                assert_eq!(Some(snapshot.aggregated), IncidentDetails::from_events(events));
            }
        });
    }
}
