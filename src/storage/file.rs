//! Durable record store backed by the append-only log
//!
//! On open the log is replayed front to back into an in-memory map (latest
//! record wins, tombstones remove, expired values are dropped) and then
//! compacted down to the live records. Reads are served from the map. Writes
//! hold the log lock across the append, the fsync and the map update, so the
//! map always agrees with what a replay would produce.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, RwLock};
use std::time::Duration;

use super::errors::{StoreError, StoreResult};
use super::reader::LogReader;
use super::record::LogRecord;
use super::store::{expiry_from_ttl, is_expired, KeyPattern, RecordStore};
use super::writer::LogWriter;

/// Dead records tolerated before an expiry sweep rewrites the log.
const COMPACT_MIN_DEAD_RECORDS: usize = 64;

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at_ms: Option<i64>,
}

struct LogState {
    writer: LogWriter,
    /// Records currently in the log file, live or not
    records: usize,
}

/// File-backed store. Survives restarts; refuses to open a corrupted log.
pub struct FileRecordStore {
    log: Mutex<LogState>,
    entries: RwLock<HashMap<String, Entry>>,
}

impl FileRecordStore {
    /// Opens (or creates) the store under `data_dir`.
    ///
    /// Fails with `StoreError::Corruption` if any record in the log is damaged.
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        let writer = LogWriter::open(data_dir)?;
        let (entries, records) = Self::replay(writer.path())?;

        let mut log = LogState { writer, records };
        if log.records > entries.len() {
            Self::rewrite(&mut log, &entries)?;
        }

        Ok(Self {
            log: Mutex::new(log),
            entries: RwLock::new(entries),
        })
    }

    fn replay(path: &Path) -> StoreResult<(HashMap<String, Entry>, usize)> {
        let mut entries = HashMap::new();
        let mut reader = LogReader::open(path)?;
        let mut records = 0;

        while let Some(record) = reader.read_next()? {
            records += 1;
            if record.is_tombstone || is_expired(record.expires_at_ms) {
                entries.remove(&record.key);
            } else {
                entries.insert(
                    record.key,
                    Entry {
                        value: record.value,
                        expires_at_ms: record.expires_at_ms,
                    },
                );
            }
        }

        Ok((entries, records))
    }

    /// Rewrites the log so it holds exactly the live entries, in key order.
    fn rewrite(log: &mut LogState, entries: &HashMap<String, Entry>) -> StoreResult<()> {
        let mut live: Vec<(&String, &Entry)> = entries
            .iter()
            .filter(|(_, e)| !is_expired(e.expires_at_ms))
            .collect();
        live.sort_by(|a, b| a.0.cmp(b.0));

        let records: Vec<LogRecord> = live
            .into_iter()
            .map(|(key, e)| LogRecord::live(key.as_str(), e.value.clone(), e.expires_at_ms))
            .collect();
        log.writer.rewrite(&records)?;
        log.records = records.len();
        Ok(())
    }

    /// Drops tombstones, overwritten values and expired values from the log.
    pub fn compact(&self) -> StoreResult<()> {
        let mut log = self.lock_log()?;
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Self::rewrite(&mut log, &entries)
    }

    /// Number of records in the log file, including dead ones.
    pub fn log_records(&self) -> usize {
        self.lock_log().map(|log| log.records).unwrap_or(0)
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

    fn lock_log(&self) -> StoreResult<MutexGuard<'_, LogState>> {
        self.log
            .lock()
            .map_err(|_| StoreError::Backend("log writer lock poisoned".to_string()))
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("file store index lock poisoned".to_string())
}

impl RecordStore for FileRecordStore {
    fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        match entries.get(key) {
            Some(entry) if !is_expired(entry.expires_at_ms) => Ok(entry.value.clone()),
            _ => Err(StoreError::NotFound(key.to_string())),
        }
    }

    fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> StoreResult<()> {
        let expires_at_ms = expiry_from_ttl(ttl);
        let mut log = self.lock_log()?;
        log.writer
            .append(&LogRecord::live(key, value.to_vec(), expires_at_ms))?;
        log.records += 1;

        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                expires_at_ms,
            },
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        let mut log = self.lock_log()?;
        let mut entries = self.entries.write().map_err(|_| poisoned())?;

        match entries.get(key) {
            Some(entry) if !is_expired(entry.expires_at_ms) => {}
            _ => return Err(StoreError::NotFound(key.to_string())),
        }
        log.writer.append(&LogRecord::tombstone(key))?;
        log.records += 1;
        entries.remove(key);
        Ok(())
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

    /// Drops expired entries and compacts the log once enough dead records
    /// have piled up.
    fn purge_expired(&self) -> StoreResult<usize> {
        let mut log = self.lock_log()?;
        let mut entries = self.entries.write().map_err(|_| poisoned())?;

        let before = entries.len();
        entries.retain(|_, e| !is_expired(e.expires_at_ms));
        let purged = before - entries.len();

        let dead = log.records.saturating_sub(entries.len());
        if dead >= COMPACT_MIN_DEAD_RECORDS.max(entries.len()) {
            Self::rewrite(&mut log, &entries)?;
        }
        Ok(purged)
    }
}
