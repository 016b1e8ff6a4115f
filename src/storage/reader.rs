//! Sequential log reader with strict corruption detection
//!
//! Every record's checksum is validated. A torn or corrupted record stops the
//! scan with `StoreError::Corruption`; nothing after it is trusted.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::errors::{StoreError, StoreResult};
use super::record::{LogRecord, MIN_RECORD_SIZE};

/// Reader over a record log file.
pub struct LogReader {
    path: PathBuf,
    reader: BufReader<File>,
    current_offset: u64,
    file_size: u64,
}

impl LogReader {
    /// Opens the log file for reading.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let file = File::open(path)
            .map_err(|e| StoreError::io(format!("Failed to open log: {}", path.display()), e))?;

        let file_size = file
            .metadata()
            .map_err(|e| StoreError::io("Failed to read log metadata", e))?
            .len();

        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            current_offset: 0,
            file_size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Reads the next record.
    ///
    /// - `Ok(Some(record))` if a record was read
    /// - `Ok(None)` at end of file
    /// - `Err(Corruption)` on a short, oversized, or checksum-failing record
    pub fn read_next(&mut self) -> StoreResult<Option<LogRecord>> {
        if self.current_offset >= self.file_size {
            return Ok(None);
        }

        let remaining = self.file_size - self.current_offset;
        if remaining < MIN_RECORD_SIZE as u64 {
            return Err(StoreError::corruption(
                self.current_offset,
                format!(
                    "Truncated log: {} bytes remaining, minimum record size is {}",
                    remaining, MIN_RECORD_SIZE
                ),
            ));
        }

        let mut len_buf = [0u8; 4];
        self.reader.read_exact(&mut len_buf).map_err(|e| {
            StoreError::corruption(
                self.current_offset,
                format!("Failed to read record length: {}", e),
            )
        })?;
        let record_length = u32::from_le_bytes(len_buf) as u64;

        if record_length < MIN_RECORD_SIZE as u64 {
            return Err(StoreError::corruption(
                self.current_offset,
                format!("Invalid record length: {}", record_length),
            ));
        }
        if record_length > remaining {
            return Err(StoreError::corruption(
                self.current_offset,
                format!(
                    "Record length {} exceeds remaining file size {}",
                    record_length, remaining
                ),
            ));
        }

        let mut record_buf = vec![0u8; record_length as usize];
        record_buf[0..4].copy_from_slice(&len_buf);
        self.reader.read_exact(&mut record_buf[4..]).map_err(|e| {
            StoreError::corruption(
                self.current_offset,
                format!("Failed to read record body: {}", e),
            )
        })?;

        let (record, consumed) = LogRecord::deserialize(&record_buf)
            .map_err(|e| StoreError::corruption(self.current_offset, e.to_string()))?;

        self.current_offset += consumed as u64;
        Ok(Some(record))
    }

    /// Reads every remaining record. Any corruption fails the whole read.
    pub fn read_all(&mut self) -> StoreResult<Vec<LogRecord>> {
        let mut records = Vec::new();
        while let Some(record) = self.read_next()? {
            records.push(record);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::super::writer::LogWriter;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_empty_log() {
        let temp_dir = TempDir::new().unwrap();
        let path = {
            let writer = LogWriter::open(temp_dir.path()).unwrap();
            writer.path().to_path_buf()
        };

        let mut reader = LogReader::open(&path).unwrap();
        assert!(reader.read_next().unwrap().is_none());
    }

    #[test]
    fn test_read_in_append_order() {
        let temp_dir = TempDir::new().unwrap();
        let path = {
            let mut writer = LogWriter::open(temp_dir.path()).unwrap();
            writer.append(&LogRecord::live("a", b"1".to_vec(), None)).unwrap();
            writer.append(&LogRecord::tombstone("a")).unwrap();
            writer.path().to_path_buf()
        };

        let mut reader = LogReader::open(&path).unwrap();
        let records = reader.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert!(!records[0].is_tombstone);
        assert!(records[1].is_tombstone);
        assert_eq!(reader.current_offset(), std::fs::metadata(&path).unwrap().len());
    }

    #[test]
    fn test_trailing_garbage_is_corruption() {
        let temp_dir = TempDir::new().unwrap();
        let path = {
            let mut writer = LogWriter::open(temp_dir.path()).unwrap();
            writer.append(&LogRecord::live("a", b"1".to_vec(), None)).unwrap();
            writer.path().to_path_buf()
        };
        let mut contents = std::fs::read(&path).unwrap();
        contents.extend_from_slice(&[1, 2, 3]);
        std::fs::write(&path, contents).unwrap();

        let mut reader = LogReader::open(&path).unwrap();
        assert!(reader.read_next().unwrap().is_some());
        let err = reader.read_next().unwrap_err();
        assert_eq!(err.code(), "PLANDB_STORE_CORRUPTION");
    }
}
