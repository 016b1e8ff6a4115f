//! Index projector worker
//!
//! Consumes projection messages one at a time and mirrors each plan tree
//! into the search facade. Failures are logged and dropped; a later write of
//! the same plan re-projects it, and every index write is an upsert by id.

use std::sync::Arc;

use tokio::task::JoinHandle;

use super::errors::{ProjectionError, ProjectionResult};
use super::message::{ProjectionMessage, ProjectionOp};
use super::queue::Subscription;
use super::relation::project_nodes;
use crate::model::Plan;
use crate::observability::{log_event, Event, MetricsRegistry};
use crate::search::SearchFacade;

/// Counters reported when a projector task ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProjectorStats {
    pub processed: u64,
    pub documents: u64,
    pub failed: u64,
}

pub struct IndexProjector {
    search: Arc<dyn SearchFacade>,
    index: String,
    metrics: Arc<MetricsRegistry>,
}

impl IndexProjector {
    pub fn new(
        search: Arc<dyn SearchFacade>,
        index: impl Into<String>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            search,
            index: index.into(),
            metrics,
        }
    }

    /// Applies one message to the index. Returns the number of documents touched.
    pub fn project(&self, message: &ProjectionMessage) -> ProjectionResult<usize> {
        let plan: Plan =
            serde_json::from_slice(&message.payload).map_err(|source| ProjectionError::Decode {
                plan_id: message.plan_id.clone(),
                source,
            })?;

        match message.op {
            ProjectionOp::Upsert => self.upsert(&plan),
            ProjectionOp::Remove => self.remove(&plan),
        }
    }

    fn upsert(&self, plan: &Plan) -> ProjectionResult<usize> {
        let nodes = project_nodes(plan).map_err(|source| ProjectionError::Decode {
            plan_id: plan.object_id.clone(),
            source,
        })?;
        let count = nodes.len();

        for node in nodes {
            self.search
                .index(&self.index, &node.id, node.parent.as_deref(), node.document)
                .map_err(|source| ProjectionError::Search {
                    node_id: node.id.clone(),
                    source,
                })?;
        }
        Ok(count)
    }

    fn remove(&self, plan: &Plan) -> ProjectionResult<usize> {
        let ids = plan.node_ids();
        for id in &ids {
            self.search
                .remove(&self.index, id)
                .map_err(|source| ProjectionError::Search {
                    node_id: id.to_string(),
                    source,
                })?;
        }
        Ok(ids.len())
    }

    /// Projects a message, logging and counting the outcome.
    pub fn handle(&self, message: &ProjectionMessage, stats: &mut ProjectorStats) {
        stats.processed += 1;
        match self.project(message) {
            Ok(documents) => {
                stats.documents += documents as u64;
                self.metrics.increment_projections_indexed();
                let documents = documents.to_string();
                log_event(
                    Event::ProjectionIndexed,
                    &[
                        ("documents", documents.as_str()),
                        ("index", self.index.as_str()),
                        ("op", message.op.as_str()),
                        ("plan_id", message.plan_id.as_str()),
                    ],
                );
            }
            Err(e) => {
                stats.failed += 1;
                self.metrics.increment_projections_failed();
                let error = e.to_string();
                log_event(
                    Event::ProjectionFailed,
                    &[
                        ("error", error.as_str()),
                        ("op", message.op.as_str()),
                        ("plan_id", message.plan_id.as_str()),
                    ],
                );
            }
        }
    }
}

/// Runs a projector over a subscription until the queue closes.
pub fn spawn_projector(
    mut subscription: Subscription,
    projector: IndexProjector,
) -> JoinHandle<ProjectorStats> {
    tokio::spawn(async move {
        let mut stats = ProjectorStats::default();
        while let Some(message) = subscription.recv().await {
            projector.handle(&message, &mut stats);
        }
        let failed = stats.failed.to_string();
        let processed = stats.processed.to_string();
        log_event(
            Event::ProjectorStopped,
            &[
                ("consumer", subscription.consumer()),
                ("failed", failed.as_str()),
                ("processed", processed.as_str()),
            ],
        );
        stats
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::plan_fixtures as fixtures;
    use crate::projection::ProjectionQueue;
    use crate::search::{MemorySearchIndex, SearchError, SearchHit, SearchResult};
    use serde_json::Value;

    fn projector(search: Arc<MemorySearchIndex>) -> IndexProjector {
        IndexProjector::new(search, "plans", Arc::new(MetricsRegistry::new()))
    }

    #[test]
    fn test_upsert_indexes_every_node_with_routing() {
        let search = Arc::new(MemorySearchIndex::new());
        let projector = projector(Arc::clone(&search));

        let message = ProjectionMessage::upsert(&fixtures::plan("p1")).unwrap();
        assert_eq!(projector.project(&message).unwrap(), 5);
        assert_eq!(search.count("plans"), 5);

        let service = search.get("plans", "s1").unwrap().unwrap();
        assert_eq!(service.routing.as_deref(), Some("lps1"));
        assert_eq!(service.source["plan_join"]["name"], "service");
    }

    #[test]
    fn test_redelivery_is_idempotent() {
        let search = Arc::new(MemorySearchIndex::new());
        let projector = projector(Arc::clone(&search));
        let message = ProjectionMessage::upsert(&fixtures::plan("p1")).unwrap();

        projector.project(&message).unwrap();
        projector.project(&message).unwrap();
        assert_eq!(search.count("plans"), 5);
    }

    #[test]
    fn test_remove_drops_every_node() {
        let search = Arc::new(MemorySearchIndex::new());
        let projector = projector(Arc::clone(&search));
        let plan = fixtures::plan("p1");

        projector.project(&ProjectionMessage::upsert(&plan).unwrap()).unwrap();
        projector.project(&ProjectionMessage::remove(&plan).unwrap()).unwrap();
        assert_eq!(search.count("plans"), 0);
    }

    #[test]
    fn test_bad_payload_is_counted_not_raised() {
        let search = Arc::new(MemorySearchIndex::new());
        let projector = projector(Arc::clone(&search));
        let message = ProjectionMessage {
            op: ProjectionOp::Upsert,
            plan_id: "p1".to_string(),
            payload: b"not json".to_vec(),
        };

        assert!(matches!(
            projector.project(&message),
            Err(ProjectionError::Decode { .. })
        ));

        let mut stats = ProjectorStats::default();
        projector.handle(&message, &mut stats);
        assert_eq!(stats.failed, 1);
        assert_eq!(projector.metrics.snapshot().projections_failed, 1);
    }

    struct RejectingSearch;

    impl SearchFacade for RejectingSearch {
        fn index(&self, _: &str, _: &str, _: Option<&str>, _: Value) -> SearchResult<()> {
            Err(SearchError::Backend("cluster unavailable".to_string()))
        }

        fn remove(&self, _: &str, _: &str) -> SearchResult<()> {
            Ok(())
        }

        fn query(&self, _: &str, _: &str, _: &str) -> SearchResult<Vec<SearchHit>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_search_failure_names_node() {
        let projector = IndexProjector::new(
            Arc::new(RejectingSearch),
            "plans",
            Arc::new(MetricsRegistry::new()),
        );
        let message = ProjectionMessage::upsert(&fixtures::plan("p1")).unwrap();
        let err = projector.project(&message).unwrap_err();
        assert!(matches!(err, ProjectionError::Search { ref node_id, .. } if node_id == "p1"));
    }

    #[tokio::test]
    async fn test_spawned_projector_drains_until_close() {
        let search = Arc::new(MemorySearchIndex::new());
        let queue = ProjectionQueue::new("plan_queue", 8);
        let handle = spawn_projector(queue.subscribe("indexer"), projector(Arc::clone(&search)));

        queue.publish(ProjectionMessage::upsert(&fixtures::plan("p1")).unwrap());
        queue.publish(ProjectionMessage {
            op: ProjectionOp::Upsert,
            plan_id: "broken".to_string(),
            payload: Vec::new(),
        });
        queue.close();

        let stats = handle.await.unwrap();
        assert_eq!(stats.processed, 2);
        assert_eq!(stats.documents, 5);
        assert_eq!(stats.failed, 1);
        assert_eq!(search.count("plans"), 5);
    }
}
