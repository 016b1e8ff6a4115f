//! Plan engine error taxonomy
//!
//! `NotFound`, `Conflict` and `Invalid` are expected outcomes returned to the
//! caller as-is. `Corrupt` and `Dependency` are failures: they are logged with
//! context where they occur and surface as a generic server error.

use thiserror::Error;

use crate::fingerprint::FingerprintError;
use crate::storage::StoreError;

/// Result type for plan engine operations
pub type PlanResult<T> = Result<T, PlanError>;

/// Plan engine errors
#[derive(Debug, Error)]
pub enum PlanError {
    /// No record at the requested id
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Create on an id that already exists
    #[error("Record already exists: {0}")]
    Conflict(String),

    /// Request body is structurally valid JSON but not an acceptable plan
    #[error("Invalid plan: {0}")]
    Invalid(String),

    /// Stored bytes do not decode into the expected shape
    #[error("Corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },

    /// The store, queue, or index call itself failed
    #[error("Dependency failure: {0}")]
    Dependency(String),
}

impl PlanError {
    pub fn corrupt(id: impl Into<String>, reason: impl ToString) -> Self {
        PlanError::Corrupt {
            id: id.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this is an expected outcome rather than a failure.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            PlanError::NotFound(_) | PlanError::Conflict(_) | PlanError::Invalid(_)
        )
    }
}

impl From<StoreError> for PlanError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(key) => PlanError::NotFound(key),
            other => PlanError::Dependency(format!("{} ({})", other, other.code())),
        }
    }
}

impl From<FingerprintError> for PlanError {
    fn from(err: FingerprintError) -> Self {
        PlanError::Dependency(err.to_string())
    }
}
