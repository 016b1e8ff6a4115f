//! Projection errors

use thiserror::Error;

use crate::search::SearchError;

pub type ProjectionResult<T> = Result<T, ProjectionError>;

#[derive(Debug, Error)]
pub enum ProjectionError {
    /// Message payload is not a serialized plan
    #[error("Undecodable projection payload for {plan_id}: {source}")]
    Decode {
        plan_id: String,
        #[source]
        source: serde_json::Error,
    },

    /// The search facade rejected a write
    #[error("Search write failed for {node_id}: {source}")]
    Search {
        node_id: String,
        #[source]
        source: SearchError,
    },
}
