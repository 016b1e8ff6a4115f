//! Index projection
//!
//! Committed plan writes are published to a [`ProjectionQueue`]; an
//! [`IndexProjector`] task consumes them and keeps the search index
//! eventually consistent with the record store. Delivery is best-effort and
//! never feeds back into the write that produced it.

mod errors;
mod message;
mod projector;
mod queue;
mod relation;

pub use errors::{ProjectionError, ProjectionResult};
pub use message::{ProjectionMessage, ProjectionOp};
pub use projector::{spawn_projector, IndexProjector, ProjectorStats};
pub use queue::{ProjectionQueue, PublishReport, Subscription};
pub use relation::{project_nodes, JoinRelation, ProjectedNode};
