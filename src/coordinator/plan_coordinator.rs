//! Plan coordinator
//!
//! Sequences decomposition, merge, fingerprinting and record-store calls for
//! each plan operation, then hands the committed tree to the projection
//! queue. Store calls run one after another with no surrounding transaction;
//! every record write is an overwrite, so retrying a failed operation is safe.

use std::sync::Arc;
use std::time::Duration;

use super::outcome::WriteOutcome;
use crate::decompose::{decompose, encode_record, read_record, reassemble};
use crate::errors::{PlanError, PlanResult};
use crate::fingerprint::fingerprint;
use crate::merge::merge_linked_services;
use crate::model::{Plan, PlanPatch, StoredRecord};
use crate::observability::{log_event, Event, MetricsRegistry};
use crate::projection::{ProjectionMessage, ProjectionQueue};
use crate::storage::{RecordStore, StoreError};

pub struct PlanCoordinator {
    store: Arc<dyn RecordStore>,
    queue: Option<Arc<ProjectionQueue>>,
    ttl: Option<Duration>,
    metrics: Arc<MetricsRegistry>,
}

impl PlanCoordinator {
    /// Coordinator with no projection queue and records that never expire.
    pub fn new(store: Arc<dyn RecordStore>, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            store,
            queue: None,
            ttl: None,
            metrics,
        }
    }

    pub fn with_queue(mut self, queue: Arc<ProjectionQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Expiry applied to every record written. `None` keeps records forever.
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Stores a new plan tree.
    pub fn create(&self, plan: Plan) -> PlanResult<WriteOutcome> {
        let id = plan.object_id.clone();
        self.create_tree(plan)
            .map_err(|e| self.report("create", &id, e))
    }

    /// Reads a whole plan by its root id.
    pub fn get(&self, id: &str) -> PlanResult<Plan> {
        reassemble(self.store.as_ref(), id).map_err(|e| self.report("get", id, e))
    }

    /// Reads any record by id, in its own shape.
    pub fn get_any(&self, id: &str) -> PlanResult<StoredRecord> {
        read_record(self.store.as_ref(), id).map_err(|e| self.report("get", id, e))
    }

    /// Every stored plan, in key order.
    ///
    /// Child records and anything else that does not decode into a complete
    /// plan are skipped.
    pub fn list(&self) -> PlanResult<Vec<Plan>> {
        self.list_plans().map_err(|e| self.report("list", "*", e))
    }

    /// Upserts linked services into a stored plan.
    pub fn patch(&self, id: &str, patch: PlanPatch) -> PlanResult<WriteOutcome> {
        self.patch_plan(id, patch)
            .map_err(|e| self.report("patch", id, e))
    }

    /// Replaces a stored plan wholesale, creating it if absent.
    pub fn replace(&self, id: &str, plan: Plan) -> PlanResult<WriteOutcome> {
        self.replace_plan(id, plan)
            .map_err(|e| self.report("replace", id, e))
    }

    /// Deletes a plan and every descendant record.
    pub fn delete(&self, id: &str) -> PlanResult<()> {
        self.delete_plan(id).map_err(|e| self.report("delete", id, e))
    }

    fn create_tree(&self, plan: Plan) -> PlanResult<WriteOutcome> {
        plan.validate().map_err(PlanError::Invalid)?;
        self.ensure_unclaimed(&plan.object_id, &plan.node_ids(), &[])?;

        let fingerprint = fingerprint(&plan)?;
        let records = self.write_tree(&plan)?;

        self.metrics.increment_plans_created();
        let records = records.to_string();
        log_event(
            Event::PlanCreated,
            &[
                ("fingerprint", fingerprint.as_str()),
                ("plan_id", plan.object_id.as_str()),
                ("records", records.as_str()),
            ],
        );
        self.publish(ProjectionMessage::upsert(&plan), &plan.object_id);

        Ok(WriteOutcome::Created { fingerprint })
    }

    fn list_plans(&self) -> PlanResult<Vec<Plan>> {
        let mut keys = self.store.list_keys("*")?;
        keys.sort();

        let mut plans = Vec::new();
        for key in keys {
            let bytes = match self.store.get(&key) {
                Ok(bytes) => bytes,
                Err(StoreError::NotFound(_)) => continue,
                Err(e) => return Err(e.into()),
            };
            if let Ok(plan) = serde_json::from_slice::<Plan>(&bytes) {
                if plan.is_complete() {
                    plans.push(plan);
                }
            }
        }
        Ok(plans)
    }

    fn patch_plan(&self, id: &str, patch: PlanPatch) -> PlanResult<WriteOutcome> {
        patch.validate().map_err(PlanError::Invalid)?;

        let current = reassemble(self.store.as_ref(), id)?;
        let current_fingerprint = fingerprint(&current)?;

        let mut merged = current.clone();
        merged.linked_plan_services = merge_linked_services(
            std::mem::take(&mut merged.linked_plan_services),
            patch.linked_plan_services,
        );
        merged.validate().map_err(PlanError::Invalid)?;

        let merged_fingerprint = fingerprint(&merged)?;
        if merged_fingerprint == current_fingerprint {
            return Ok(self.unchanged(id, merged_fingerprint));
        }
        self.ensure_unclaimed(id, &merged.node_ids(), &current.node_ids())?;

        // Only the root is rewritten; standalone children keep their old copies.
        let bytes = encode_record(&StoredRecord::Plan(merged.clone()))?;
        self.store.set(id, &bytes, self.ttl)?;
        self.metrics.add_records_written(1);
        self.metrics.increment_plans_updated();

        let services = merged.linked_plan_services.len().to_string();
        log_event(
            Event::PlanPatched,
            &[
                ("fingerprint", merged_fingerprint.as_str()),
                ("linked_services", services.as_str()),
                ("plan_id", id),
            ],
        );
        self.publish(ProjectionMessage::upsert(&merged), id);

        Ok(WriteOutcome::Updated {
            fingerprint: merged_fingerprint,
        })
    }

    fn replace_plan(&self, id: &str, plan: Plan) -> PlanResult<WriteOutcome> {
        if plan.object_id != id {
            return Err(PlanError::Invalid(format!(
                "objectId '{}' in body does not match '{}' in path",
                plan.object_id, id
            )));
        }
        plan.validate().map_err(PlanError::Invalid)?;

        let existing = match reassemble(self.store.as_ref(), id) {
            Ok(existing) => existing,
            Err(PlanError::NotFound(_)) => return self.create_tree(plan),
            Err(e) => return Err(e),
        };

        let incoming_fingerprint = fingerprint(&plan)?;
        if fingerprint(&existing)? == incoming_fingerprint {
            return Ok(self.unchanged(id, incoming_fingerprint));
        }
        self.ensure_unclaimed(id, &plan.node_ids(), &existing.node_ids())?;

        self.delete_tree(&existing)?;
        self.publish(ProjectionMessage::remove(&existing), id);
        let records = self.write_tree(&plan)?;
        self.metrics.increment_plans_updated();

        let records = records.to_string();
        log_event(
            Event::PlanReplaced,
            &[
                ("fingerprint", incoming_fingerprint.as_str()),
                ("plan_id", id),
                ("records", records.as_str()),
            ],
        );
        self.publish(ProjectionMessage::upsert(&plan), id);

        Ok(WriteOutcome::Updated {
            fingerprint: incoming_fingerprint,
        })
    }

    fn delete_plan(&self, id: &str) -> PlanResult<()> {
        let existing = reassemble(self.store.as_ref(), id)?;
        let records = self.delete_tree(&existing)?;
        self.metrics.increment_plans_deleted();

        let records = records.to_string();
        log_event(
            Event::PlanDeleted,
            &[("plan_id", id), ("records", records.as_str())],
        );
        self.publish(ProjectionMessage::remove(&existing), id);
        Ok(())
    }

    /// Fails with `Conflict` on the first id already stored by someone else.
    ///
    /// Ids in `owned` belong to the plan being rewritten and may be reused.
    fn ensure_unclaimed(&self, plan_id: &str, ids: &[&str], owned: &[&str]) -> PlanResult<()> {
        for &id in ids {
            if owned.contains(&id) {
                continue;
            }
            if self.store.exists(id)? {
                self.metrics.increment_conflicts();
                log_event(Event::PlanConflict, &[("object_id", id), ("plan_id", plan_id)]);
                return Err(PlanError::Conflict(id.to_string()));
            }
        }
        Ok(())
    }

    fn write_tree(&self, plan: &Plan) -> PlanResult<usize> {
        let records = decompose(plan);
        for (key, record) in &records {
            let bytes = encode_record(record)?;
            self.store.set(key, &bytes, self.ttl)?;
            self.metrics.add_records_written(1);
        }
        Ok(records.len())
    }

    /// Deletes descendants deepest-last-written first, then the root.
    ///
    /// A descendant that is already gone is skipped so an interrupted
    /// cascade can be finished by retrying.
    fn delete_tree(&self, plan: &Plan) -> PlanResult<usize> {
        let ids = plan.node_ids();
        let mut deleted = 0;

        for key in ids.iter().skip(1).rev() {
            match self.store.delete(key) {
                Ok(()) => deleted += 1,
                Err(StoreError::NotFound(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }
        self.store.delete(&plan.object_id)?;
        deleted += 1;

        self.metrics.add_records_deleted(deleted as u64);
        Ok(deleted)
    }

    fn unchanged(&self, id: &str, fingerprint: String) -> WriteOutcome {
        self.metrics.increment_plans_unchanged();
        log_event(
            Event::PlanUnchanged,
            &[("fingerprint", fingerprint.as_str()), ("plan_id", id)],
        );
        WriteOutcome::Unchanged { fingerprint }
    }

    fn publish(&self, message: serde_json::Result<ProjectionMessage>, id: &str) {
        let Some(queue) = &self.queue else {
            return;
        };

        let message = match message {
            Ok(message) => message,
            Err(e) => {
                self.metrics.increment_projections_dropped();
                let error = e.to_string();
                log_event(
                    Event::ProjectionDropped,
                    &[("error", error.as_str()), ("plan_id", id)],
                );
                return;
            }
        };
        let op = message.op;

        let report = queue.publish(message);
        if report.delivered > 0 {
            self.metrics.increment_projections_published();
            let delivered = report.delivered.to_string();
            log_event(
                Event::ProjectionPublished,
                &[
                    ("delivered", delivered.as_str()),
                    ("op", op.as_str()),
                    ("plan_id", id),
                    ("queue", queue.name()),
                ],
            );
        }
        if report.deferred > 0 {
            self.metrics.increment_projections_deferred();
            let deferred = report.deferred.to_string();
            log_event(
                Event::ProjectionDeferred,
                &[
                    ("deferred", deferred.as_str()),
                    ("op", op.as_str()),
                    ("plan_id", id),
                    ("queue", queue.name()),
                ],
            );
        }
        if report.dropped > 0 {
            self.metrics.increment_projections_dropped();
            let dropped = report.dropped.to_string();
            log_event(
                Event::ProjectionDropped,
                &[
                    ("dropped", dropped.as_str()),
                    ("op", op.as_str()),
                    ("plan_id", id),
                    ("queue", queue.name()),
                ],
            );
        }
    }

    /// Logs failures with context and passes every error through.
    fn report(&self, operation: &str, id: &str, err: PlanError) -> PlanError {
        if err.is_expected() {
            return err;
        }
        match &err {
            PlanError::Corrupt { reason, .. } => log_event(
                Event::RecordCorrupt,
                &[
                    ("key", id),
                    ("operation", operation),
                    ("reason", reason.as_str()),
                ],
            ),
            PlanError::Dependency(message) => log_event(
                Event::StoreFailure,
                &[
                    ("error", message.as_str()),
                    ("key", id),
                    ("operation", operation),
                ],
            ),
            _ => {}
        }
        err
    }
}
