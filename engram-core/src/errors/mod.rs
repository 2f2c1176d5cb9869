//! Error types for the Engram workspace.
//!
//! One thiserror enum per domain, unified under `EngramError`. Store
//! operations are atomic (committed id or error); retrieval is
//! best-effort and records non-fatal anomalies in telemetry instead of
//! failing.

mod embedding_error;
mod fingerprint_error;
mod retrieval_error;
mod storage_error;

pub use embedding_error::EmbeddingError;
pub use fingerprint_error::FingerprintError;
pub use retrieval_error::RetrievalError;
pub use storage_error::StorageError;

/// Workspace-wide error umbrella.
#[derive(Debug, thiserror::Error)]
pub enum EngramError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Fingerprint(#[from] FingerprintError),

    /// Missing/empty user id, empty query, non-string query after
    /// coercion. Reported, never retried.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Anything else, propagated with context.
    #[error("internal error: {context}")]
    Internal { context: String },
}

impl EngramError {
    /// Convenience constructor for input validation failures.
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for internal errors with context.
    pub fn internal(context: impl Into<String>) -> Self {
        Self::Internal {
            context: context.into(),
        }
    }
}

pub type EngramResult<T> = Result<T, EngramError>;
