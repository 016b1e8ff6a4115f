//! Append-only log writer with fsync enforcement
//!
//! A write is not acknowledged until the appended bytes are fsynced.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::errors::{StoreError, StoreResult};
use super::record::LogRecord;

/// File name of the record log inside `<data_dir>/data/`.
pub const LOG_FILE_NAME: &str = "records.log";

const COMPACT_FILE_NAME: &str = "records.log.compact";

/// Appends records to `<data_dir>/data/records.log`.
pub struct LogWriter {
    path: PathBuf,
    file: File,
    current_offset: u64,
}

impl LogWriter {
    /// Opens or creates the log, creating parent directories as needed.
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        let data_subdir = data_dir.join("data");
        let path = data_subdir.join(LOG_FILE_NAME);

        if !data_subdir.exists() {
            fs::create_dir_all(&data_subdir).map_err(|e| {
                StoreError::io(
                    format!("Failed to create data directory: {}", data_subdir.display()),
                    e,
                )
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(|e| StoreError::io(format!("Failed to open log: {}", path.display()), e))?;

        let current_offset = file
            .metadata()
            .map_err(|e| StoreError::io("Failed to read log metadata", e))?
            .len();

        Ok(Self {
            path,
            file,
            current_offset,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Appends one record and fsyncs. Returns the offset it was written at.
    pub fn append(&mut self, record: &LogRecord) -> StoreResult<u64> {
        let serialized = record.serialize();
        let offset = self.current_offset;

        self.file.write_all(&serialized).map_err(|e| {
            StoreError::io(format!("Failed to append record: {}", record.key), e)
        })?;

        self.file.sync_all().map_err(|e| {
            StoreError::io(format!("fsync failed after appending record: {}", record.key), e)
        })?;

        self.current_offset += serialized.len() as u64;
        Ok(offset)
    }

    /// Replaces the whole log with `records`.
    ///
    /// The new log is written and fsynced beside the old one, then renamed
    /// over it, so a crash leaves either the old or the new log intact.
    pub fn rewrite(&mut self, records: &[LogRecord]) -> StoreResult<()> {
        let compact_path = self.path.with_file_name(COMPACT_FILE_NAME);

        let mut compact = File::create(&compact_path).map_err(|e| {
            StoreError::io(format!("Failed to create log: {}", compact_path.display()), e)
        })?;
        let mut written = 0u64;
        for record in records {
            let serialized = record.serialize();
            compact.write_all(&serialized).map_err(|e| {
                StoreError::io(format!("Failed to rewrite record: {}", record.key), e)
            })?;
            written += serialized.len() as u64;
        }
        compact
            .sync_all()
            .map_err(|e| StoreError::io("fsync failed on rewritten log", e))?;
        drop(compact);

        fs::rename(&compact_path, &self.path).map_err(|e| {
            StoreError::io(format!("Failed to replace log: {}", self.path.display()), e)
        })?;
        if let Some(dir) = self.path.parent() {
            File::open(dir)
                .and_then(|d| d.sync_all())
                .map_err(|e| StoreError::io("fsync failed on data directory", e))?;
        }

        self.file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(format!("Failed to open log: {}", self.path.display()), e))?;
        self.current_offset = written;
        Ok(())
    }
}
