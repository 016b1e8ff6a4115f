//! # HTTP Server Module
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/metrics` - Counters
//! - `/v1/plan`, `/v1/plan/{objectId}`, `/v1/plans` - Plan CRUD
//! - `/v1/search` - Field lookup over the projected index

pub mod config;
mod errors;
pub mod observability_routes;
pub mod plan_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use errors::{ApiError, ApiResult, ErrorResponse};
pub use plan_routes::{plan_routes, PlanState};
pub use server::HttpServer;
