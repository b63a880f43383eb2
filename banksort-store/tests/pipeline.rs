//! End-to-end runs against the in-memory store.

use banksort_core::{AllocationConfig, AllocationPlan, ItemId, RawItem, SectionQuota, WriteTally};
use banksort_store::{
    Error, InMemoryStore, PersistConfig, QuestionSource, RunRequest, census, reconcile, run,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

const TEST_TYPE: &str = "EduTest";

fn fast_persist() -> PersistConfig {
    PersistConfig {
        max_retries: 0,
        ..PersistConfig::default()
    }
}

fn math_only(practice_instances: u32, target: usize) -> AllocationConfig {
    AllocationConfig {
        practice_instances,
        sections: vec![SectionQuota::new("Mathematics", target)],
    }
}

/// `n` Mathematics items numbered from 1, spread over two sub-skills.
fn math_items(n: usize) -> Vec<RawItem> {
    (1..=n)
        .map(|i| {
            let skill = if i % 2 == 0 { "Algebra" } else { "Geometry" };
            RawItem::new(i.to_string(), "Mathematics", skill, (i % 5 + 1) as i64)
        })
        .collect()
}

#[tokio::test]
async fn one_failed_write_is_counted_without_aborting() {
    let store = InMemoryStore::with_items(TEST_TYPE, math_items(50));
    store.fail_writes_for("27").await;
    // Everything beyond the diagnostic lands in a single practice set.
    let config = math_only(1, 50);

    let report = run(
        &store,
        &store,
        &config,
        &fast_persist(),
        &RunRequest::new(TEST_TYPE).with_seed(11),
        StdRng::seed_from_u64(11),
    )
    .await
    .unwrap();

    assert_eq!(report.summary.total, 50);
    assert_eq!(
        report.summary.writes,
        WriteTally::Completed {
            written: 49,
            failed: 1
        }
    );
    assert!(report.summary.to_string().contains("1 items could not be written"));

    let remaining = store.fetch_unassigned(TEST_TYPE).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id.as_str(), "27");
    assert_eq!(report.plan.len(), 50);
}

#[tokio::test]
async fn empty_pool_reports_zeros() {
    let store = InMemoryStore::new();

    let report = run(
        &store,
        &store,
        &AllocationConfig::default(),
        &fast_persist(),
        &RunRequest::new(TEST_TYPE),
        StdRng::seed_from_u64(0),
    )
    .await
    .unwrap();

    assert_eq!(report.summary.total, 0);
    assert_eq!(report.summary.practice.len(), 5);
    assert!(report.summary.practice.iter().all(|(_, n)| *n == 0));
    assert!(report.summary.drills.is_empty());
    assert_eq!(
        report.summary.writes,
        WriteTally::Completed {
            written: 0,
            failed: 0
        }
    );
    assert!(report.plan.is_empty());
}

#[tokio::test]
async fn unreachable_source_is_fatal_and_writes_nothing() {
    let store = InMemoryStore::with_items(TEST_TYPE, math_items(10));
    store.set_unavailable(true);

    let err = run(
        &store,
        &store,
        &AllocationConfig::default(),
        &fast_persist(),
        &RunRequest::new(TEST_TYPE),
        StdRng::seed_from_u64(0),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::SourceUnavailable(_)));
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn invalid_config_fails_before_fetching() {
    let store = InMemoryStore::with_items(TEST_TYPE, math_items(10));
    let config = math_only(0, 5);

    let err = run(
        &store,
        &store,
        &config,
        &fast_persist(),
        &RunRequest::new(TEST_TYPE),
        StdRng::seed_from_u64(0),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Allocation(_)));
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn dry_run_leaves_the_store_untouched() {
    let store = InMemoryStore::with_items(TEST_TYPE, math_items(30));

    let report = run(
        &store,
        &store,
        &math_only(2, 5),
        &fast_persist(),
        &RunRequest::new(TEST_TYPE).dry_run(true),
        StdRng::seed_from_u64(4),
    )
    .await
    .unwrap();

    assert_eq!(report.summary.total, 30);
    assert_eq!(report.summary.writes, WriteTally::Skipped);
    assert_eq!(store.write_count(), 0);
    assert_eq!(store.fetch_unassigned(TEST_TYPE).await.unwrap().len(), 30);
    assert_eq!(report.plan.len(), 30);
}

#[tokio::test]
async fn malformed_rows_are_skipped_and_stay_raw() {
    let mut items = math_items(8);
    items.push(RawItem::new("no-section", "", "Algebra", 2));
    items.push(RawItem::new("no-difficulty", "Mathematics", "Algebra", 0));
    let store = InMemoryStore::with_items(TEST_TYPE, items);

    let report = run(
        &store,
        &store,
        &math_only(1, 3),
        &fast_persist(),
        &RunRequest::new(TEST_TYPE),
        StdRng::seed_from_u64(8),
    )
    .await
    .unwrap();

    assert_eq!(report.summary.total, 8);
    assert_eq!(report.summary.rejected, 2);
    let remaining = store.fetch_unassigned(TEST_TYPE).await.unwrap();
    assert_eq!(remaining.len(), 2);
}

#[tokio::test]
async fn second_run_finds_nothing_left() {
    let store = InMemoryStore::with_items(TEST_TYPE, math_items(40));
    let config = math_only(3, 6);

    let first = run(
        &store,
        &store,
        &config,
        &fast_persist(),
        &RunRequest::new(TEST_TYPE),
        StdRng::seed_from_u64(1),
    )
    .await
    .unwrap();
    assert_eq!(first.summary.total, 40);

    let second = run(
        &store,
        &store,
        &config,
        &fast_persist(),
        &RunRequest::new(TEST_TYPE),
        StdRng::seed_from_u64(2),
    )
    .await
    .unwrap();
    assert_eq!(second.summary.total, 0);

    let labels = census(&store, TEST_TYPE).await.unwrap();
    assert_eq!(labels.total, 40);
    assert_eq!(labels.raw(), 0);
}

#[tokio::test]
async fn reconcile_repairs_failed_writes_and_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let plan_path = dir.path().join("plans").join("run.json");

    let store = InMemoryStore::with_items(TEST_TYPE, math_items(20));
    store.fail_writes_for("3").await;
    store.fail_writes_for("14").await;

    let report = run(
        &store,
        &store,
        &math_only(2, 4),
        &fast_persist(),
        &RunRequest::new(TEST_TYPE).with_seed(9),
        StdRng::seed_from_u64(9),
    )
    .await
    .unwrap();
    assert_eq!(report.summary.failed_writes(), 2);
    report.plan.save(&plan_path).unwrap();

    // An item added after the run is not in the plan.
    store
        .insert(TEST_TYPE, RawItem::new("late", "Mathematics", "Algebra", 1))
        .await;
    store.clear_failures().await;

    let plan = AllocationPlan::load(&plan_path).unwrap();
    let first = reconcile(&store, &store, &fast_persist(), &plan).await.unwrap();
    assert_eq!(first.repaired, 2);
    assert!(first.is_complete());
    assert_eq!(first.already_labeled, 18);
    assert_eq!(first.unplanned.len(), 1);
    assert_eq!(first.unplanned[0].as_str(), "late");

    let planned = plan.by_item();
    for id in ["3", "14"].map(ItemId::from) {
        let label = store.label_of(&id).await.unwrap();
        assert_eq!(label, planned[&id].to_string());
    }

    let second = reconcile(&store, &store, &fast_persist(), &plan).await.unwrap();
    assert_eq!(second.repaired, 0);
    assert_eq!(second.already_labeled, 20);
}
