//! Consistency coordinator
//!
//! The single entry point for plan operations. Owns the record store, the
//! optional projection queue and the record TTL.

mod outcome;
mod plan_coordinator;

pub use outcome::WriteOutcome;
pub use plan_coordinator::PlanCoordinator;
