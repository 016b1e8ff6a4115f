//! The record store capability
//!
//! A flat namespace of keys to opaque byte values. Values are understood only
//! by the decomposition engine; the store never looks inside them.

use std::time::Duration;

use chrono::Utc;
use regex::Regex;

use super::errors::{StoreError, StoreResult};

/// Key-value capability consumed by the plan engine.
///
/// Implementations must be safe for concurrent use. Every call may block on
/// I/O; callers perform them sequentially.
pub trait RecordStore: Send + Sync {
    /// Fetch the value stored at `key`.
    ///
    /// Returns `StoreError::NotFound` if the key is absent or expired.
    fn get(&self, key: &str) -> StoreResult<Vec<u8>>;

    /// Store `value` at `key`, overwriting any previous value.
    ///
    /// `ttl` of `None` means the value never expires.
    fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> StoreResult<()>;

    /// Remove `key`. Returns `StoreError::NotFound` if it was absent.
    fn delete(&self, key: &str) -> StoreResult<()>;

    /// List live keys matching a glob pattern (`*` and `?` wildcards).
    fn list_keys(&self, pattern: &str) -> StoreResult<Vec<String>>;

    /// Reclaims space held by expired values. Returns how many were dropped.
    fn purge_expired(&self) -> StoreResult<usize> {
        Ok(0)
    }

    /// Whether a live value exists at `key`.
    fn exists(&self, key: &str) -> StoreResult<bool> {
        match self.get(key) {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Converts a TTL into an absolute expiry in unix milliseconds.
///
/// A TTL too large to represent never expires.
pub fn expiry_from_ttl(ttl: Option<Duration>) -> Option<i64> {
    let ttl = ttl?;
    let millis = i64::try_from(ttl.as_millis()).ok()?;
    Utc::now().timestamp_millis().checked_add(millis)
}

/// Whether an absolute expiry has passed.
pub(crate) fn is_expired(expires_at_ms: Option<i64>) -> bool {
    match expires_at_ms {
        Some(at) => Utc::now().timestamp_millis() >= at,
        None => false,
    }
}

/// Compiled glob pattern for key listing.
#[derive(Debug, Clone)]
pub struct KeyPattern {
    regex: Regex,
}

impl KeyPattern {
    /// Compile a glob. `*` matches any run of characters, `?` exactly one.
    pub fn new(pattern: &str) -> StoreResult<Self> {
        let mut expr = String::with_capacity(pattern.len() + 8);
        expr.push('^');
        for c in pattern.chars() {
            match c {
                '*' => expr.push_str(".*"),
                '?' => expr.push('.'),
                c => expr.push_str(&regex::escape(&c.to_string())),
            }
        }
        expr.push('$');

        let regex = Regex::new(&expr)
            .map_err(|e| StoreError::Backend(format!("Invalid key pattern '{}': {}", pattern, e)))?;
        Ok(Self { regex })
    }

    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_matches_everything() {
        let pattern = KeyPattern::new("*").unwrap();
        assert!(pattern.matches(""));
        assert!(pattern.matches("plan-1"));
    }

    #[test]
    fn test_prefix_and_single_char() {
        let pattern = KeyPattern::new("lps?-*").unwrap();
        assert!(pattern.matches("lps1-a"));
        assert!(!pattern.matches("lps-a"));
        assert!(!pattern.matches("xlps1-a"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let pattern = KeyPattern::new("a.b+c").unwrap();
        assert!(pattern.matches("a.b+c"));
        assert!(!pattern.matches("aXbbc"));
    }

    #[test]
    fn test_expiry() {
        assert!(!is_expired(None));
        assert!(!is_expired(expiry_from_ttl(Some(Duration::from_secs(60)))));
        assert!(is_expired(Some(Utc::now().timestamp_millis() - 1)));
    }

    #[test]
    fn test_huge_ttl_never_expires() {
        assert_eq!(expiry_from_ttl(Some(Duration::from_secs(u64::MAX))), None);
        assert_eq!(expiry_from_ttl(Some(Duration::from_millis(i64::MAX as u64))), None);
        assert!(!is_expired(expiry_from_ttl(Some(Duration::from_secs(u64::MAX)))));
    }
}
