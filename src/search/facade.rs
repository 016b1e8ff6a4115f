//! The search capability consumed by the projector and the HTTP layer

use serde::Serialize;
use serde_json::Value;

use super::errors::SearchResult;

/// One matching document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing: Option<String>,
    pub source: Value,
}

/// Document index with upsert-by-id writes and single-field equality lookup.
pub trait SearchFacade: Send + Sync {
    /// Insert or overwrite the document stored under `id`.
    ///
    /// `routing` places a child on the same shard as its parent.
    fn index(&self, index: &str, id: &str, routing: Option<&str>, document: Value)
        -> SearchResult<()>;

    /// Remove a document. Removing an absent id succeeds.
    fn remove(&self, index: &str, id: &str) -> SearchResult<()>;

    /// Documents whose `field` equals `value`.
    ///
    /// `field` may be a dotted path into nested objects. Strings compare
    /// verbatim; numbers and booleans compare by their JSON text.
    fn query(&self, index: &str, field: &str, value: &str) -> SearchResult<Vec<SearchHit>>;
}
