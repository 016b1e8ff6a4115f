//! Metrics registry
//!
//! Counters only. Monotonic, reset on process start, relaxed atomics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters shared by the coordinator, the projector and the HTTP layer
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    plans_created: AtomicU64,
    plans_updated: AtomicU64,
    plans_unchanged: AtomicU64,
    plans_deleted: AtomicU64,
    conflicts: AtomicU64,
    records_written: AtomicU64,
    records_deleted: AtomicU64,
    records_purged: AtomicU64,
    projections_published: AtomicU64,
    projections_deferred: AtomicU64,
    projections_dropped: AtomicU64,
    projections_indexed: AtomicU64,
    projections_failed: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_plans_created(&self) {
        self.plans_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_plans_updated(&self) {
        self.plans_updated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_plans_unchanged(&self) {
        self.plans_unchanged.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_plans_deleted(&self) {
        self.plans_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_conflicts(&self) {
        self.conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_records_written(&self, count: u64) {
        self.records_written.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_records_deleted(&self, count: u64) {
        self.records_deleted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_records_purged(&self, count: u64) {
        self.records_purged.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_projections_published(&self) {
        self.projections_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_projections_deferred(&self) {
        self.projections_deferred.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_projections_dropped(&self) {
        self.projections_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_projections_indexed(&self) {
        self.projections_indexed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_projections_failed(&self) {
        self.projections_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            plans_created: self.plans_created.load(Ordering::Relaxed),
            plans_updated: self.plans_updated.load(Ordering::Relaxed),
            plans_unchanged: self.plans_unchanged.load(Ordering::Relaxed),
            plans_deleted: self.plans_deleted.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
            records_written: self.records_written.load(Ordering::Relaxed),
            records_deleted: self.records_deleted.load(Ordering::Relaxed),
            records_purged: self.records_purged.load(Ordering::Relaxed),
            projections_published: self.projections_published.load(Ordering::Relaxed),
            projections_deferred: self.projections_deferred.load(Ordering::Relaxed),
            projections_dropped: self.projections_dropped.load(Ordering::Relaxed),
            projections_indexed: self.projections_indexed.load(Ordering::Relaxed),
            projections_failed: self.projections_failed.load(Ordering::Relaxed),
        }
    }

    /// Current values as a JSON object with a fixed key order.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.snapshot()).unwrap_or(serde_json::Value::Null)
    }
}

/// A point-in-time copy of every counter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub plans_created: u64,
    pub plans_updated: u64,
    pub plans_unchanged: u64,
    pub plans_deleted: u64,
    pub conflicts: u64,
    pub records_written: u64,
    pub records_deleted: u64,
    pub records_purged: u64,
    pub projections_published: u64,
    pub projections_deferred: u64,
    pub projections_dropped: u64,
    pub projections_indexed: u64,
    pub projections_failed: u64,
}
