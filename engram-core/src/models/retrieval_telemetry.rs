use serde::{Deserialize, Serialize};

use crate::memory::MemoryRecord;

/// Wall-clock milliseconds spent in each pipeline phase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhaseLatency {
    pub embed_ms: u64,
    pub prefilter_ms: u64,
    pub scoring_ms: u64,
    pub total_ms: u64,
}

/// Per-retrieval counters and identifiers. Emitted for every call,
/// including empty results and errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalTelemetry {
    /// `semantic`, `lag_fallback`, or `none`.
    pub method: String,
    pub correlation_id: String,
    pub query_length: usize,
    pub mode: String,
    pub categories_filter: Option<Vec<String>>,
    pub candidates_considered: usize,
    pub candidates_with_embeddings: usize,
    pub vectors_compared: usize,
    pub candidates_above_threshold: usize,
    pub results_injected: usize,
    pub injected_ids: Vec<i64>,
    pub top_scores: Vec<f64>,
    pub token_budget: usize,
    pub tokens_used: i64,
    pub fallback_used: bool,
    pub fallback_reason: Option<String>,
    pub safety_critical_detected: bool,
    pub safety_memories_boosted: usize,
    /// Rows the isolation sentinel filtered. Non-zero is a critical
    /// security event; it is logged as such and recorded here.
    pub wrong_user_memories_filtered: usize,
    /// Candidates dropped because their stored vector failed to decode.
    pub unparseable_embeddings: usize,
    pub latency: PhaseLatency,
    pub success: bool,
    pub error: Option<String>,
}

/// A memory selected for injection, with its scoring trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedMemory {
    pub record: MemoryRecord,
    /// Raw similarity before boosts (cosine or text-heuristic).
    pub similarity: f64,
    /// Final hybrid score that ordered the result.
    pub score: f64,
}

/// What a retrieval returns: the bounded ranked window plus the full
/// telemetry for the operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalOutcome {
    pub memories: Vec<RetrievedMemory>,
    pub telemetry: RetrievalTelemetry,
}

impl RetrievalOutcome {
    /// An empty outcome carrying only telemetry.
    pub fn empty(telemetry: RetrievalTelemetry) -> Self {
        Self {
            memories: Vec::new(),
            telemetry,
        }
    }

    pub fn success(&self) -> bool {
        self.telemetry.success
    }
}
