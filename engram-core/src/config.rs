//! Configuration for every component, with the closed option set and its
//! defaults. Structs derive serde so deployments can load them from TOML;
//! `EngramConfig::from_env` covers the environment-variable surface
//! (database path, embedding credential, feature flags).

use serde::{Deserialize, Serialize};

use crate::constants::EMBEDDING_DIMENSIONS;

/// Retrieval pipeline tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Prefilter fetch cap.
    pub max_candidates: usize,
    /// Results returned when the caller does not ask for a count.
    pub default_top_k: usize,
    /// Similarity floor for ordinary queries.
    pub min_similarity: f64,
    /// Similarity floor for personal-fact queries.
    pub min_similarity_personal: f64,
    /// Similarity floor for explicit memory-recall queries.
    pub min_similarity_recall: f64,
    /// Smooth recency decay window, in days.
    pub recency_boost_days: f64,
    /// Weight of the recency component outside recall mode.
    pub recency_boost_weight: f64,
    /// Weight of the fingerprint-confidence component.
    pub confidence_weight: f64,
    /// Deadline for the query embedding call.
    pub query_embedding_timeout_ms: u64,
    /// Token budget applied when the caller does not supply one.
    pub default_token_budget: usize,
    /// Age window for the embedding-lag augmentation query, in seconds.
    pub lag_window_secs: u64,
    /// Weight of the adaptive priority-centroid boost.
    pub centroid_boost_weight: f64,
    /// Whether the adaptive priority centroid participates in scoring.
    pub adaptive_centroid: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_candidates: 500,
            default_top_k: 10,
            min_similarity: 0.25,
            min_similarity_personal: 0.18,
            min_similarity_recall: 0.10,
            recency_boost_days: 7.0,
            recency_boost_weight: 0.10,
            confidence_weight: 0.05,
            query_embedding_timeout_ms: 5_000,
            default_token_budget: 2_000,
            lag_window_secs: 120,
            centroid_boost_weight: 0.15,
            adaptive_centroid: false,
        }
    }
}

/// Embedding client tuning and provider coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Required vector dimensionality.
    pub dimensions: usize,
    /// Deadline for the store-time inline embed.
    pub inline_timeout_ms: u64,
    /// Deadline for a backfill-worker embed.
    pub backfill_timeout_ms: u64,
    /// Input text is truncated to this many characters before transport.
    pub max_content_chars: usize,
    /// Provider endpoint URL.
    pub api_url: String,
    /// Bearer credential. Never serialized; comes from the environment.
    #[serde(skip_serializing, default)]
    pub api_key: String,
    /// Provider/version tag recorded on every embedded row.
    pub model: String,
    /// Bound on the per-process query-embedding cache.
    pub query_cache_size: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimensions: EMBEDDING_DIMENSIONS,
            inline_timeout_ms: 5_000,
            backfill_timeout_ms: 10_000,
            max_content_chars: 8_000,
            api_url: "https://api.openai.com/v1/embeddings".to_string(),
            api_key: String::new(),
            model: "text-embedding-3-small".to_string(),
            query_cache_size: 512,
        }
    }
}

/// Supersession transaction discipline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupersessionConfig {
    /// Bounded retry count on conflict.
    pub max_retries: u32,
    /// Backoff between retries.
    pub retry_delay_ms: u64,
    /// Minimum fingerprint confidence for the supersession path.
    pub min_confidence: f64,
}

impl Default for SupersessionConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 100,
            min_confidence: 0.85,
        }
    }
}

/// Backfill worker pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackfillConfig {
    /// Rows processed per run when the caller does not specify.
    pub default_limit: usize,
    /// Wall-clock budget per run when the caller does not specify.
    pub default_max_seconds: u64,
    /// Sleep between rows, for rate hygiene.
    pub throttle_ms: u64,
    /// Rows stuck in `processing` longer than this are reset to `pending`.
    pub processing_reclaim_secs: u64,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            default_max_seconds: 20,
            throttle_ms: 100,
            processing_reclaim_secs: 600,
        }
    }
}

/// Top-level configuration for a MemoryService.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngramConfig {
    /// SQLite database path. Empty means in-memory (tests).
    pub database_path: String,
    /// Allow non-vault retrievals to also read `truth-general` rows.
    pub cross_mode_enabled: bool,
    /// Enable the bounded external classifier fallback for fingerprints.
    pub classifier_fallback_enabled: bool,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub supersession: SupersessionConfig,
    pub backfill: BackfillConfig,
}

impl EngramConfig {
    /// Build a config from the environment.
    ///
    /// Recognized variables: `ENGRAM_DATABASE_PATH`, `ENGRAM_EMBEDDING_API_URL`,
    /// `ENGRAM_EMBEDDING_API_KEY`, `ENGRAM_EMBEDDING_MODEL`,
    /// `ENGRAM_CROSS_MODE`, `ENGRAM_CLASSIFIER_FALLBACK`,
    /// `ENGRAM_ADAPTIVE_CENTROID`. Unset variables keep their defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = std::env::var("ENGRAM_DATABASE_PATH") {
            config.database_path = path;
        }
        if let Ok(url) = std::env::var("ENGRAM_EMBEDDING_API_URL") {
            config.embedding.api_url = url;
        }
        if let Ok(key) = std::env::var("ENGRAM_EMBEDDING_API_KEY") {
            config.embedding.api_key = key;
        }
        if let Ok(model) = std::env::var("ENGRAM_EMBEDDING_MODEL") {
            config.embedding.model = model;
        }
        config.cross_mode_enabled = env_flag("ENGRAM_CROSS_MODE");
        config.classifier_fallback_enabled = env_flag("ENGRAM_CLASSIFIER_FALLBACK");
        config.retrieval.adaptive_centroid = env_flag("ENGRAM_ADAPTIVE_CENTROID");
        config
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "yes" | "on"))
        .unwrap_or(false)
}
