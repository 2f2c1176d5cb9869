use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::EmbeddingError;

/// A produced embedding with its provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingVector {
    pub vector: Vec<f32>,
    pub dimensions: usize,
    pub model: String,
    pub elapsed_ms: u64,
}

/// An embedding provider. Implementations must honor the deadline and
/// report its expiry as `EmbeddingError::Timeout`; the caller maps
/// timeout and non-timeout failures to different row statuses.
pub trait IEmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str, deadline: Duration) -> Result<EmbeddingVector, EmbeddingError>;

    /// Provider/version tag recorded on embedded rows.
    fn model(&self) -> &str;

    fn dimensions(&self) -> usize;
}
