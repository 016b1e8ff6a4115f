//! Plan data model
//!
//! A plan is a small tree:
//!
//! ```text
//! Plan
//!  ├── planCostShares        (CostShare)
//!  └── linkedPlanServices[]  (LinkedPlanService)
//!       ├── linkedService          (Service)
//!       └── planserviceCostShares  (CostShare)
//! ```
//!
//! Every node carries an `objectId` that is unique across the whole store and an
//! `objectType` discriminant. Field order in these structs is the canonical
//! serialization order used for fingerprints, so it must not be reshuffled.

mod plan;
mod record;

pub use plan::{CostShare, LinkedPlanService, Plan, PlanPatch, Service};
pub use record::{RecordKind, StoredRecord};

#[cfg(test)]
pub(crate) use plan::fixtures as plan_fixtures;
