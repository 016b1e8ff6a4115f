//! Search facade errors

use thiserror::Error;

pub type SearchResult<T> = Result<T, SearchError>;

#[derive(Debug, Error)]
pub enum SearchError {
    /// Query against an index that was never created
    #[error("Index not found: {0}")]
    IndexNotFound(String),

    /// The search backend rejected or failed the call
    #[error("Search backend failure: {0}")]
    Backend(String),
}

impl SearchError {
    pub fn code(&self) -> &'static str {
        match self {
            SearchError::IndexNotFound(_) => "PLANDB_SEARCH_INDEX_NOT_FOUND",
            SearchError::Backend(_) => "PLANDB_SEARCH_BACKEND",
        }
    }
}
