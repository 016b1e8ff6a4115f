//! Search facade
//!
//! The projector writes denormalized plan nodes here; the HTTP layer reads
//! them back with single-field equality queries.

mod errors;
mod facade;
mod key;
mod memory;

pub use errors::{SearchError, SearchResult};
pub use facade::{SearchFacade, SearchHit};
pub use key::FieldKey;
pub use memory::MemorySearchIndex;
