use serde::{Deserialize, Serialize};

/// Result of (re)creating the one-current-fact partial unique index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintReport {
    pub ok: bool,
    pub message: String,
}

/// Result of the duplicate-current-fact cleanup pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Rows demoted because a newer current row existed for the same
    /// (user, fingerprint).
    pub cleaned: usize,
}
