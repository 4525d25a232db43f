//! Indexing worker simulation: leases, gaps and watermark tracking

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::fixtures::{activity_for, saved_item, test_store};
use nodestore::model::{
    ActivityFactory, ActivityId, ActivityKind, ActivityRecord, RecordFactory, RunningState,
};
use nodestore::{
    ActivityStatus, ActivityWatermark, DataStore, DataStoreConfig, InMemoryBackend, VersionCache,
};

fn short_lease_store(lease: Duration) -> DataStore {
    DataStore::new(
        Arc::new(InMemoryBackend::new()),
        Arc::new(VersionCache::new()),
        DataStoreConfig {
            activity_lease: lease,
            ..DataStoreConfig::default()
        },
    )
}

async fn appended(store: &DataStore, count: usize) -> Vec<ActivityId> {
    let (snapshot, _) = saved_item(store, "/Root/Indexed").await;
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        ids.push(
            store
                .append_activity(activity_for(ActivityKind::UpdateDocument, &snapshot))
                .await
                .unwrap(),
        );
    }
    ids
}

// ========== Ordered Drain ==========

#[tokio::test]
async fn test_worker_drains_log_and_tracks_watermark() {
    let store = test_store();
    let ids = appended(&store, 5).await;
    assert_eq!(ids, (1..=5).map(ActivityId).collect::<Vec<_>>());

    let claimed = store
        .claim_activities(ids[0], ids[4], 100, false, &RecordFactory)
        .await
        .unwrap();
    assert_eq!(claimed.len(), 5);
    assert!(claimed.iter().all(|r| r.state == RunningState::Running));
    assert!(claimed.iter().all(|r| !r.unprocessed));

    // Executions finish out of order; the watermark holds at the first
    // still-running id
    let mut watermark = ActivityWatermark::new();
    for record in &claimed {
        watermark.observe(record.id);
    }
    for id in [1u64, 2, 4, 5] {
        store
            .set_activity_state(ActivityId(id), RunningState::Done)
            .await
            .unwrap();
        watermark.applied(ActivityId(id));
    }
    assert_eq!(watermark.watermark(), ActivityId(2));
    assert_eq!(watermark.gaps(), vec![ActivityId(3)]);

    store
        .set_activity_state(ActivityId(3), RunningState::Done)
        .await
        .unwrap();
    watermark.applied(ActivityId(3));
    assert_eq!(watermark.watermark(), ActivityId(5));
    assert!(!watermark.has_gaps());

    // Everything is Done and behind the watermark, so compaction takes all
    assert_eq!(store.delete_finished_activities().await.unwrap(), 5);
    assert_eq!(store.last_activity_id().await.unwrap(), ActivityId(5));
}

// ========== Gap Claims ==========

#[tokio::test]
async fn test_gap_claim_returns_only_claimable_ids() {
    let store = test_store();
    appended(&store, 9).await;

    // 9 already executed, 8 never claimed, 7 still open
    store
        .set_activity_state(ActivityId(9), RunningState::Done)
        .await
        .unwrap();

    let claimed = store
        .claim_activity_gaps(
            vec![ActivityId(7), ActivityId(9)],
            false,
            &RecordFactory,
        )
        .await
        .unwrap();
    let claimed_ids: Vec<ActivityId> = claimed.iter().map(|r| r.id).collect();
    assert_eq!(claimed_ids, vec![ActivityId(7)]);
}

#[tokio::test]
async fn test_gap_claim_skips_unexpired_running() {
    let store = test_store();
    appended(&store, 3).await;

    // Another worker holds 2 inside its lease
    store
        .claim_activities(ActivityId(2), ActivityId(2), 1, false, &RecordFactory)
        .await
        .unwrap();

    let claimed = store
        .claim_activity_gaps(
            vec![ActivityId(1), ActivityId(2), ActivityId(3)],
            false,
            &RecordFactory,
        )
        .await
        .unwrap();
    let claimed_ids: Vec<ActivityId> = claimed.iter().map(|r| r.id).collect();
    assert_eq!(claimed_ids, vec![ActivityId(1), ActivityId(3)]);
}

#[tokio::test]
async fn test_claim_past_the_high_mark_is_empty() {
    let store = test_store();
    appended(&store, 3).await;

    // A consumer ahead of the log polls watermark+1 ..= last seen
    let claimed = store
        .claim_activities(ActivityId(6), ActivityId(3), 10, false, &RecordFactory)
        .await
        .unwrap();
    assert!(claimed.is_empty());
}

#[tokio::test]
async fn test_nonexistent_gap_ids_are_silently_absent() {
    let store = test_store();
    appended(&store, 2).await;

    let claimed = store
        .claim_activity_gaps(vec![ActivityId(17)], false, &RecordFactory)
        .await
        .unwrap();
    assert!(claimed.is_empty());
}

// ========== Lease Recovery ==========

#[tokio::test]
async fn test_expired_lease_is_reclaimable() {
    let store = short_lease_store(Duration::from_millis(20));
    let ids = appended(&store, 1).await;

    // Worker A claims and crashes before reporting Done
    let first = store
        .claim_activities(ids[0], ids[0], 1, false, &RecordFactory)
        .await
        .unwrap();
    assert_eq!(first.len(), 1);

    // Inside the lease nobody else may touch it
    let blocked = store
        .claim_activities(ids[0], ids[0], 1, false, &RecordFactory)
        .await
        .unwrap();
    assert!(blocked.is_empty());

    tokio::time::sleep(Duration::from_millis(40)).await;
    let reclaimed = store
        .claim_activities(ids[0], ids[0], 1, false, &RecordFactory)
        .await
        .unwrap();
    assert_eq!(reclaimed.len(), 1);
    assert_eq!(reclaimed[0].id, ids[0]);
}

#[tokio::test]
async fn test_only_the_unfinished_activity_is_reclaimed() {
    let store = short_lease_store(Duration::from_millis(20));
    let ids = appended(&store, 5).await;

    let claimed = store
        .claim_activities(ids[0], ids[4], 100, false, &RecordFactory)
        .await
        .unwrap();
    assert_eq!(claimed.len(), 5);

    // The worker finishes everything except 3, then goes silent
    for id in [1u64, 2, 4, 5] {
        store
            .set_activity_state(ActivityId(id), RunningState::Done)
            .await
            .unwrap();
    }

    tokio::time::sleep(Duration::from_millis(40)).await;
    let reclaimed = store
        .claim_activities(ids[0], ids[4], 100, false, &RecordFactory)
        .await
        .unwrap();
    let reclaimed_ids: Vec<ActivityId> = reclaimed.iter().map(|r| r.id).collect();
    assert_eq!(reclaimed_ids, vec![ActivityId(3)]);
}

#[tokio::test]
async fn test_refresh_keeps_lease_alive() {
    let store = short_lease_store(Duration::from_millis(30));
    let ids = appended(&store, 1).await;

    store
        .claim_activities(ids[0], ids[0], 1, false, &RecordFactory)
        .await
        .unwrap();

    // Heartbeat twice across what would otherwise be an expired window
    for _ in 0..2 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        store.refresh_activity_lease(ids.clone()).await.unwrap();
    }

    let stolen = store
        .claim_activities(ids[0], ids[0], 1, false, &RecordFactory)
        .await
        .unwrap();
    assert!(stolen.is_empty());
}

// ========== Restart Recovery ==========

#[tokio::test]
async fn test_executable_claim_separates_owned_work() {
    let store = test_store();
    appended(&store, 4).await;

    // Another worker legitimately holds 2; 3 was already applied
    store
        .claim_activities(ActivityId(2), ActivityId(2), 1, false, &RecordFactory)
        .await
        .unwrap();
    store
        .set_activity_state(ActivityId(3), RunningState::Done)
        .await
        .unwrap();

    let (executable, waiting) = store
        .claim_executable_activities(&RecordFactory, 100, Duration::from_secs(60))
        .await
        .unwrap();

    let executable_ids: Vec<ActivityId> = executable.iter().map(|r| r.id).collect();
    assert_eq!(executable_ids, vec![ActivityId(1), ActivityId(4)]);
    assert_eq!(waiting, vec![ActivityId(2)]);
    // Restart claims are recovery work
    assert!(executable.iter().all(|r| r.unprocessed));
}

#[tokio::test]
async fn test_restart_resumes_from_persisted_status() {
    let store = test_store();
    appended(&store, 5).await;

    // First life: applied 1, 2 and 5, then the process died
    let mut watermark = ActivityWatermark::new();
    for id in [1u64, 2, 5] {
        watermark.observe(ActivityId(id));
        watermark.applied(ActivityId(id));
        store
            .set_activity_state(ActivityId(id), RunningState::Done)
            .await
            .unwrap();
    }
    let persisted = serde_json::to_string(&watermark.status()).unwrap();

    // Second life: rebuild the position and execute the stragglers
    let status: ActivityStatus = serde_json::from_str(&persisted).unwrap();
    let mut watermark = ActivityWatermark::from_status(&status);
    assert_eq!(watermark.watermark(), ActivityId(2));

    let claimed = store
        .claim_activity_gaps(watermark.gaps(), true, &RecordFactory)
        .await
        .unwrap();
    for record in claimed {
        assert!(record.unprocessed);
        store
            .set_activity_state(record.id, RunningState::Done)
            .await
            .unwrap();
        watermark.applied(record.id);
    }
    assert_eq!(watermark.watermark(), ActivityId(5));
}

// ========== Factories ==========

/// Keeps only subtree removals, as an index maintenance pass would
struct RemovalsOnly;

impl ActivityFactory for RemovalsOnly {
    type Output = ActivityId;

    fn from_record(&self, record: ActivityRecord) -> Option<Self::Output> {
        (record.kind == ActivityKind::RemoveTree).then_some(record.id)
    }
}

#[tokio::test]
async fn test_factory_declined_records_are_dropped() {
    let store = test_store();
    let (snapshot, _) = saved_item(&store, "/Root/Indexed").await;
    store
        .append_activity(activity_for(ActivityKind::AddDocument, &snapshot))
        .await
        .unwrap();
    let removal = store
        .append_activity(activity_for(ActivityKind::RemoveTree, &snapshot))
        .await
        .unwrap();

    let claimed = store
        .claim_activities(ActivityId(1), removal, 100, false, &RemovalsOnly)
        .await
        .unwrap();
    assert_eq!(claimed, vec![removal]);
}

// ========== Full Reset ==========

#[tokio::test]
async fn test_delete_all_restarts_id_assignment() {
    let store = test_store();
    let (snapshot, _) = saved_item(&store, "/Root/Rebuilt").await;
    appended(&store, 3).await;

    store.delete_all_activities().await.unwrap();
    assert_eq!(store.last_activity_id().await.unwrap(), ActivityId::ZERO);

    let id = store
        .append_activity(activity_for(ActivityKind::Rebuild, &snapshot))
        .await
        .unwrap();
    assert_eq!(id, ActivityId(1));
}
