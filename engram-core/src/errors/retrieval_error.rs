/// Retrieval pipeline errors. Only query-embedding failure aborts a
/// retrieval; row-level anomalies are filtered and telemetered instead.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    /// No query vector means nothing to score. The caller decides
    /// whether to proceed without memory.
    #[error("query embedding failed: {message}")]
    QueryEmbeddingFailed { message: String },

    /// Retrieval was asked to run for an unidentifiable tenant.
    #[error("user isolation violated: {reason}")]
    IsolationViolation { reason: String },
}
