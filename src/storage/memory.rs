//! In-memory record store with expiry

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use super::errors::{StoreError, StoreResult};
use super::store::{expiry_from_ttl, is_expired, KeyPattern, RecordStore};

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at_ms: Option<i64>,
}

/// TTL-aware in-memory store.
///
/// Expired entries are invisible to reads and listings and are purged lazily
/// when the key is overwritten or deleted, or by `purge_expired`.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .map(|e| e.values().filter(|v| !is_expired(v.expires_at_ms)).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("memory store lock poisoned".to_string())
}

impl RecordStore for MemoryRecordStore {
    fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        match entries.get(key) {
            Some(entry) if !is_expired(entry.expires_at_ms) => Ok(entry.value.clone()),
            _ => Err(StoreError::NotFound(key.to_string())),
        }
    }

    fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> StoreResult<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                expires_at_ms: expiry_from_ttl(ttl),
            },
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        match entries.remove(key) {
            Some(entry) if !is_expired(entry.expires_at_ms) => Ok(()),
            _ => Err(StoreError::NotFound(key.to_string())),
        }
    }

    fn list_keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let pattern = KeyPattern::new(pattern)?;
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries
            .iter()
            .filter(|(k, e)| !is_expired(e.expires_at_ms) && pattern.matches(k))
            .map(|(k, _)| k.clone())
            .collect())
    }

    fn purge_expired(&self) -> StoreResult<usize> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        let before = entries.len();
        entries.retain(|_, e| !is_expired(e.expires_at_ms));
        Ok(before - entries.len())
    }
}
