//! plandb - hierarchical plan document store
//!
//! Plans are stored as a root blob plus one standalone record per node in a
//! flat key-value store, and projected asynchronously into a join-aware
//! search index.

pub mod cli;
pub mod coordinator;
pub mod decompose;
pub mod errors;
pub mod fingerprint;
pub mod http_server;
pub mod merge;
pub mod model;
pub mod observability;
pub mod projection;
pub mod search;
pub mod storage;

pub use coordinator::{PlanCoordinator, WriteOutcome};
pub use errors::{PlanError, PlanResult};
