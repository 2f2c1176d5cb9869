use serde::{Deserialize, Serialize};

use crate::memory::EmbeddingStatus;

/// One backfill run's bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackfillOptions {
    /// Row count ceiling.
    pub limit: usize,
    /// Wall-clock ceiling.
    pub max_seconds: u64,
    /// Which statuses are eligible for (re-)embedding.
    pub status_filter: Vec<EmbeddingStatus>,
}

impl Default for BackfillOptions {
    fn default() -> Self {
        Self {
            limit: 20,
            max_seconds: 20,
            status_filter: vec![EmbeddingStatus::Pending, EmbeddingStatus::Failed],
        }
    }
}

/// What a backfill run accomplished.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackfillReport {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Eligible rows still waiting after the run.
    pub remaining: u64,
    pub seconds_elapsed: f64,
}
