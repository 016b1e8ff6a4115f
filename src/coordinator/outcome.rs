//! Result of a plan write

/// What a write did, with the fingerprint of the plan now stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Created { fingerprint: String },
    Updated { fingerprint: String },
    /// The request matched the stored plan; nothing was written.
    Unchanged { fingerprint: String },
}

impl WriteOutcome {
    pub fn fingerprint(&self) -> &str {
        match self {
            WriteOutcome::Created { fingerprint }
            | WriteOutcome::Updated { fingerprint }
            | WriteOutcome::Unchanged { fingerprint } => fingerprint,
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, WriteOutcome::Unchanged { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WriteOutcome::Created { .. } => "created",
            WriteOutcome::Updated { .. } => "updated",
            WriteOutcome::Unchanged { .. } => "unchanged",
        }
    }
}
