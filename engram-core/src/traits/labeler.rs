use std::time::Duration;

use crate::errors::FingerprintError;

/// Optional external classifier used only when the deterministic pass
/// produces nothing. One bounded call per classification; its output
/// still passes the value-signature guard.
pub trait IFingerprintLabeler: Send + Sync {
    /// Returns a canonical fingerprint label, or `None` when the model
    /// declines to commit.
    fn label(&self, content: &str, deadline: Duration)
        -> Result<Option<String>, FingerprintError>;
}
