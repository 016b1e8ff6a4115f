//! Observable events
//!
//! Every log line the service emits names one of these.

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    BootStart,
    ConfigLoaded,
    StoreOpened,
    Serving,
    RecordsPurged,
    ShutdownComplete,

    // Plan writes
    PlanCreated,
    PlanConflict,
    PlanPatched,
    PlanReplaced,
    PlanUnchanged,
    PlanDeleted,

    // Failures surfaced as server errors
    RecordCorrupt,
    StoreFailure,

    // Projection pipeline
    ProjectionPublished,
    ProjectionDeferred,
    ProjectionDropped,
    ProjectionIndexed,
    ProjectionFailed,
    ProjectorStopped,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "PLANDB_STARTUP_BEGIN",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::StoreOpened => "STORE_OPENED",
            Event::Serving => "PLANDB_SERVING",
            Event::RecordsPurged => "RECORDS_PURGED",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",

            Event::PlanCreated => "PLAN_CREATED",
            Event::PlanConflict => "PLAN_CONFLICT",
            Event::PlanPatched => "PLAN_PATCHED",
            Event::PlanReplaced => "PLAN_REPLACED",
            Event::PlanUnchanged => "PLAN_UNCHANGED",
            Event::PlanDeleted => "PLAN_DELETED",

            Event::RecordCorrupt => "RECORD_CORRUPT",
            Event::StoreFailure => "STORE_FAILURE",

            Event::ProjectionPublished => "PROJECTION_PUBLISHED",
            Event::ProjectionDeferred => "PROJECTION_DEFERRED",
            Event::ProjectionDropped => "PROJECTION_DROPPED",
            Event::ProjectionIndexed => "PROJECTION_INDEXED",
            Event::ProjectionFailed => "PROJECTION_FAILED",
            Event::ProjectorStopped => "PROJECTOR_STOPPED",
        }
    }

    /// Default severity for this event.
    pub fn severity(&self) -> Severity {
        match self {
            Event::PlanConflict | Event::ProjectionDeferred | Event::ProjectionDropped => {
                Severity::Warn
            }
            Event::RecordCorrupt | Event::StoreFailure | Event::ProjectionFailed => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
