/// Embedding client errors. `Timeout` is a distinct kind so the store
/// path can map it to `embedding_status = 'pending'` (retryable via
/// backfill) instead of `'failed'`.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("embedding call exceeded {deadline_ms}ms deadline")]
    Timeout { deadline_ms: u64 },

    #[error("embedding provider error (HTTP {status:?}): {message}")]
    Provider {
        status: Option<u16>,
        message: String,
    },

    #[error("embedding has {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("no embedding API credential configured")]
    MissingCredential,

    #[error("embedding input is empty after normalization")]
    EmptyInput,
}

impl EmbeddingError {
    /// Whether a store-time failure with this error should leave the row
    /// retryable (`pending`) rather than terminal (`failed`). Timeouts
    /// and connection-level failures (no HTTP status) qualify; a
    /// provider that answered with an error does not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Provider { status: None, .. }
        )
    }
}
