//! Write path to search index, through the queue and a spawned projector

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{linked, memory_coordinator, sample_plan, small_plan, PLAN_ID};
use plandb::model::PlanPatch;
use plandb::observability::MetricsRegistry;
use plandb::projection::{spawn_projector, IndexProjector, ProjectionQueue};
use plandb::search::{MemorySearchIndex, SearchFacade};

async fn wait_for(search: &MemorySearchIndex, index: &str, count: usize) {
    for _ in 0..200 {
        if search.count(index) == count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn test_created_plan_becomes_searchable_with_joins() {
    let search = Arc::new(MemorySearchIndex::new());
    let queue = Arc::new(ProjectionQueue::new("plan_queue", 64));
    let handle = spawn_projector(
        queue.subscribe("indexer"),
        IndexProjector::new(search.clone(), "plans", Arc::new(MetricsRegistry::new())),
    );

    let (coordinator, _) = memory_coordinator();
    let coordinator = coordinator.with_queue(Arc::clone(&queue));
    coordinator.create(sample_plan()).unwrap();
    wait_for(&search, "plans", 8).await;

    let children = search
        .query("plans", "plan_join.parent", "27283xvx9sdf-507")
        .unwrap();
    let ids: Vec<&str> = children.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["1234512xvc1314sdfsd-506", "1234520xvc30sfs-505"]);
    assert!(children
        .iter()
        .all(|h| h.routing.as_deref() == Some("27283xvx9sdf-507")));

    let expensive = search.query("plans", "copay", "175").unwrap();
    assert_eq!(expensive.len(), 1);
    assert_eq!(expensive[0].source["plan_join"]["name"], "serviceCostShare");

    let roots = search.query("plans", "plan_join.name", "plan").unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].id, PLAN_ID);

    queue.close();
    let stats = handle.await.unwrap();
    assert_eq!(stats.failed, 0);
}

#[tokio::test]
async fn test_patch_and_delete_follow_through() {
    let search = Arc::new(MemorySearchIndex::new());
    let queue = Arc::new(ProjectionQueue::new("plan_queue", 64));
    let handle = spawn_projector(
        queue.subscribe("indexer"),
        IndexProjector::new(search.clone(), "plans", Arc::new(MetricsRegistry::new())),
    );

    let (coordinator, _) = memory_coordinator();
    let coordinator = coordinator.with_queue(Arc::clone(&queue));

    coordinator.create(small_plan("p1")).unwrap();
    coordinator
        .patch(
            "p1",
            PlanPatch {
                linked_plan_services: vec![linked("lps2", "s2", "scs2", 10)],
            },
        )
        .unwrap();
    wait_for(&search, "plans", 8).await;
    assert!(search.get("plans", "scs2").unwrap().is_some());

    coordinator.delete("p1").unwrap();
    wait_for(&search, "plans", 0).await;

    queue.close();
    let stats = handle.await.unwrap();
    assert_eq!(stats.processed, 3);
    // Children added by the patch have no standalone records but still leave the index.
    assert_eq!(search.count("plans"), 0);
}

#[test]
fn test_writes_succeed_without_a_projector() {
    let queue = Arc::new(ProjectionQueue::new("plan_queue", 1));
    let (coordinator, _) = memory_coordinator();
    let coordinator = coordinator.with_queue(queue);

    coordinator.create(small_plan("p1")).unwrap();
    coordinator.delete("p1").unwrap();

    let snapshot = coordinator.metrics().snapshot();
    assert_eq!(snapshot.projections_dropped, 2);
    assert_eq!(snapshot.projections_published, 0);
}
