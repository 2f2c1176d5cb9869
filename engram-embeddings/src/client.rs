//! The embedding client: truncation, deadline plumbing, and the cached
//! query path. Status mapping stays with the caller; the client only
//! promises that a timeout surfaces as the distinct `Timeout` kind.

use std::time::Duration;

use tracing::debug;

use engram_core::config::EmbeddingConfig;
use engram_core::errors::EmbeddingError;
use engram_core::traits::{EmbeddingVector, IEmbeddingProvider};

use crate::cache::QueryEmbeddingCache;
use crate::providers::HttpEmbeddingProvider;

pub struct EmbeddingClient {
    provider: Box<dyn IEmbeddingProvider>,
    config: EmbeddingConfig,
    query_cache: QueryEmbeddingCache,
}

impl EmbeddingClient {
    /// Production client over the HTTP provider.
    pub fn new(config: EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let provider = Box::new(HttpEmbeddingProvider::new(&config)?);
        Ok(Self::with_provider(config, provider))
    }

    /// Client over an explicit provider (tests, offline mode).
    pub fn with_provider(config: EmbeddingConfig, provider: Box<dyn IEmbeddingProvider>) -> Self {
        let query_cache = QueryEmbeddingCache::new(config.query_cache_size);
        Self {
            provider,
            config,
            query_cache,
        }
    }

    /// Embed arbitrary content under a deadline. Input is truncated to
    /// the configured maximum before transport.
    pub fn embed(&self, text: &str, deadline: Duration) -> Result<EmbeddingVector, EmbeddingError> {
        let truncated = truncate_chars(text, self.config.max_content_chars);
        let trimmed = truncated.trim();
        if trimmed.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }
        if truncated.len() < text.len() {
            debug!(
                original_chars = text.chars().count(),
                max = self.config.max_content_chars,
                "embedding input truncated"
            );
        }
        self.provider.embed(trimmed, deadline)
    }

    /// Embed a retrieval query through the tenant-scoped cache.
    pub fn embed_query(
        &self,
        user_id: &str,
        text: &str,
        deadline: Duration,
    ) -> Result<EmbeddingVector, EmbeddingError> {
        if let Some(vector) = self.query_cache.get(user_id, text) {
            debug!(user_id, "query embedding cache hit");
            return Ok(EmbeddingVector {
                dimensions: vector.len(),
                vector,
                model: self.provider.model().to_string(),
                elapsed_ms: 0,
            });
        }
        let result = self.embed(text, deadline)?;
        self.query_cache
            .insert(user_id, text, result.vector.clone());
        Ok(result)
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    pub fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    pub fn inline_deadline(&self) -> Duration {
        Duration::from_millis(self.config.inline_timeout_ms)
    }

    pub fn backfill_deadline(&self) -> Duration {
        Duration::from_millis(self.config.backfill_timeout_ms)
    }
}

/// Truncate on a char boundary without scanning the whole string.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::HashedEmbeddingProvider;

    fn offline_client(dims: usize) -> EmbeddingClient {
        let config = EmbeddingConfig {
            dimensions: dims,
            max_content_chars: 50,
            ..Default::default()
        };
        EmbeddingClient::with_provider(config, Box::new(HashedEmbeddingProvider::new(dims)))
    }

    #[test]
    fn empty_input_is_rejected() {
        let client = offline_client(64);
        let err = client.embed("   ", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, EmbeddingError::EmptyInput));
    }

    #[test]
    fn long_input_is_truncated_not_rejected() {
        let client = offline_client(64);
        let long = "word ".repeat(100);
        let result = client.embed(&long, Duration::from_secs(1)).unwrap();
        assert_eq!(result.dimensions, 64);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo");
        assert_eq!(truncate_chars("short", 50), "short");
    }

    #[test]
    fn query_cache_serves_repeat_lookups() {
        let client = offline_client(64);
        let first = client
            .embed_query("u1", "what is my color", Duration::from_secs(1))
            .unwrap();
        let second = client
            .embed_query("u1", "what is my color", Duration::from_secs(1))
            .unwrap();
        assert_eq!(first.vector, second.vector);
    }
}
