use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EmbeddingStatus, MemoryMetadata, Mode};

/// A persisted memory row. Field-for-field mirror of the `memories`
/// table; `embedding` is decoded from its BLOB column on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Dense integer identifier, monotonically assigned by the database.
    pub id: i64,
    /// Opaque tenant string. Non-empty at every boundary.
    pub user_id: String,
    /// Partition tag.
    pub mode: Mode,
    /// Soft classification hint; a prefilter, never a correctness key.
    pub category: Option<String>,
    /// Free text of the memory.
    pub content: String,
    /// Estimated tokens, for budget accounting.
    pub token_count: i64,
    /// The embedding vector, when decoded.
    pub embedding: Option<Vec<f32>>,
    pub embedding_status: EmbeddingStatus,
    pub embedding_model: Option<String>,
    pub embedding_updated_at: Option<DateTime<Utc>>,
    /// Canonical fact key, e.g. `user_phone_number`.
    pub fact_fingerprint: Option<String>,
    pub fingerprint_confidence: Option<f64>,
    /// A superseded row has `false` plus `superseded_by`/`superseded_at`.
    pub is_current: bool,
    pub superseded_by: Option<i64>,
    pub superseded_at: Option<DateTime<Utc>>,
    /// Adaptive importance; bumped on use, capped at 1.0.
    pub relevance_score: f64,
    pub usage_frequency: i64,
    pub last_accessed: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub metadata: MemoryMetadata,
}

impl MemoryRecord {
    /// Whether this row carries a scoreable vector.
    pub fn has_ready_embedding(&self) -> bool {
        self.embedding_status == EmbeddingStatus::Ready && self.embedding.is_some()
    }

    /// Age of the row at `now`.
    pub fn age_at(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created_at
    }
}

impl PartialEq for MemoryRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
