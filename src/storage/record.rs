//! On-disk log record format
//!
//! ```text
//! +------------------+
//! | Record Length    | (u32 LE, whole record including this field)
//! +------------------+
//! | Key              | (length-prefixed string)
//! +------------------+
//! | Expires At       | (i64 LE unix millis, 0 = never)
//! +------------------+
//! | Tombstone Flag   | (u8: 0 = live, 1 = deleted)
//! +------------------+
//! | Value            | (length-prefixed bytes)
//! +------------------+
//! | Checksum         | (u32 LE)
//! +------------------+
//! ```
//!
//! Checksum covers all bytes except the checksum itself.

use std::io::{self, Read};

use super::checksum::{compute_checksum, verify_checksum};

/// Smallest possible record: length + empty key + expiry + flag + empty value + checksum.
pub const MIN_RECORD_SIZE: usize = 4 + 4 + 8 + 1 + 4 + 4;

/// One entry of the append-only log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub key: String,
    /// Absolute expiry in unix millis
    pub expires_at_ms: Option<i64>,
    pub is_tombstone: bool,
    /// Empty for tombstones
    pub value: Vec<u8>,
}

impl LogRecord {
    pub fn live(key: impl Into<String>, value: Vec<u8>, expires_at_ms: Option<i64>) -> Self {
        Self {
            key: key.into(),
            expires_at_ms,
            is_tombstone: false,
            value,
        }
    }

    pub fn tombstone(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            expires_at_ms: None,
            is_tombstone: true,
            value: Vec::new(),
        }
    }

    fn serialize_body(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(4 + self.key.len() + 8 + 1 + 4 + self.value.len());

        buf.extend_from_slice(&(self.key.len() as u32).to_le_bytes());
        buf.extend_from_slice(self.key.as_bytes());

        buf.extend_from_slice(&self.expires_at_ms.unwrap_or(0).to_le_bytes());

        buf.push(if self.is_tombstone { 1 } else { 0 });

        buf.extend_from_slice(&(self.value.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.value);

        buf
    }

    /// Serialize the complete record, including length prefix and checksum.
    pub fn serialize(&self) -> Vec<u8> {
        let body = self.serialize_body();
        let record_length = (4 + body.len() + 4) as u32;

        let mut record = Vec::with_capacity(record_length as usize);
        record.extend_from_slice(&record_length.to_le_bytes());
        record.extend_from_slice(&body);
        let checksum = compute_checksum(&record);
        record.extend_from_slice(&checksum.to_le_bytes());

        record
    }

    /// Deserialize a record from bytes, verifying checksum.
    ///
    /// Returns the record and the number of bytes consumed.
    pub fn deserialize(data: &[u8]) -> io::Result<(Self, usize)> {
        if data.len() < MIN_RECORD_SIZE {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "Record too short"));
        }

        let record_length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;

        if record_length < MIN_RECORD_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid record length: {}", record_length),
            ));
        }

        if data.len() < record_length {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "Record truncated: expected {} bytes, got {}",
                    record_length,
                    data.len()
                ),
            ));
        }

        let checksum_offset = record_length - 4;
        let stored_checksum = u32::from_le_bytes([
            data[checksum_offset],
            data[checksum_offset + 1],
            data[checksum_offset + 2],
            data[checksum_offset + 3],
        ]);
        if !verify_checksum(&data[0..checksum_offset], stored_checksum) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Checksum mismatch: stored {:08x}", stored_checksum),
            ));
        }

        let mut cursor = io::Cursor::new(&data[4..checksum_offset]);

        fn read_bytes<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
            let mut len_buf = [0u8; 4];
            reader.read_exact(&mut len_buf)?;
            let mut buf = vec![0u8; u32::from_le_bytes(len_buf) as usize];
            reader.read_exact(&mut buf)?;
            Ok(buf)
        }

        let key = String::from_utf8(read_bytes(&mut cursor)?).map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("Invalid UTF-8 key: {}", e))
        })?;

        let mut expiry_buf = [0u8; 8];
        cursor.read_exact(&mut expiry_buf)?;
        let expires_at_ms = match i64::from_le_bytes(expiry_buf) {
            0 => None,
            at => Some(at),
        };

        let mut tombstone_buf = [0u8; 1];
        cursor.read_exact(&mut tombstone_buf)?;
        let is_tombstone = tombstone_buf[0] != 0;

        let value = read_bytes(&mut cursor)?;

        Ok((
            Self {
                key,
                expires_at_ms,
                is_tombstone,
                value,
            },
            record_length,
        ))
    }
}
