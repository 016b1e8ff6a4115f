//! Content fingerprints for conditional reads and no-op write detection
//!
//! A fingerprint is the lowercase hex SHA-256 digest of a value's JSON
//! serialization. Struct fields serialize in declaration order, so two equal
//! values always produce the same bytes and therefore the same token.

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Fingerprint computation failed because the value could not be serialized.
#[derive(Debug, Error)]
#[error("Failed to serialize value for fingerprint: {0}")]
pub struct FingerprintError(#[from] serde_json::Error);

pub type FingerprintResult<T> = Result<T, FingerprintError>;

/// Computes the fingerprint of a value.
pub fn fingerprint<T: Serialize + ?Sized>(value: &T) -> FingerprintResult<String> {
    let bytes = serde_json::to_vec(value)?;
    Ok(fingerprint_bytes(&bytes))
}

/// Computes the fingerprint of already-canonical bytes.
pub fn fingerprint_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Renders a fingerprint as a strong ETag header value.
pub fn etag(fingerprint: &str) -> String {
    format!("\"{}\"", fingerprint)
}

/// Checks an `If-None-Match` header value against the current fingerprint.
///
/// Accepts bare or quoted tokens, weak validators (`W/"..."`), comma-separated
/// lists, and `*`.
pub fn token_matches(client_token: &str, current: &str) -> bool {
    client_token.split(',').any(|candidate| {
        let candidate = candidate.trim();
        if candidate == "*" {
            return true;
        }
        let candidate = candidate.strip_prefix("W/").unwrap_or(candidate);
        let candidate = candidate.trim_matches('"');
        !candidate.is_empty() && candidate == current
    })
}
