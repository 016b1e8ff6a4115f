//! Record store capability and its in-process backends
//!
//! The plan engine only depends on the `RecordStore` trait: a flat key space
//! of opaque byte values with optional expiry. Two backends ship here:
//!
//! - `MemoryRecordStore`: a TTL-aware map, used by default and in tests
//! - `FileRecordStore`: an append-only, checksummed log replayed on open
//!
//! # File log design
//!
//! - Append-only (no in-place updates)
//! - CRC32 checksum verified on every record read
//! - Deletes are tombstone records
//! - Latest record wins for the same key
//! - Every append is fsynced before it is acknowledged

mod checksum;
mod errors;
mod file;
mod memory;
mod reader;
mod record;
mod store;
mod writer;

pub use checksum::compute_checksum;
pub use errors::{StoreError, StoreResult};
pub use file::FileRecordStore;
pub use memory::MemoryRecordStore;
pub use reader::LogReader;
pub use record::LogRecord;
pub use store::{expiry_from_ttl, KeyPattern, RecordStore};
pub use writer::{LogWriter, LOG_FILE_NAME};
