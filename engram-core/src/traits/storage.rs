use crate::errors::EngramResult;
use crate::memory::{EmbeddingStatus, MemoryRecord};
use crate::models::{
    BackfillOptions, CandidateFilter, CleanupReport, ConstraintReport, MemoryDraft, StoreReceipt,
};

/// The storage seam. The engine exclusively owns writes; retrieval is
/// read-only plus the best-effort access counters.
pub trait IMemoryStore: Send + Sync {
    // --- Store path ---

    /// Plain insert: `is_current = true`, no replacement of prior rows.
    fn insert(&self, draft: &MemoryDraft) -> EngramResult<StoreReceipt>;

    /// Supersession insert. The caller has already cleared the safety
    /// gate; the engine runs the demote-insert-backfill transaction and
    /// retries bounded conflicts internally.
    fn insert_superseding(&self, draft: &MemoryDraft) -> EngramResult<StoreReceipt>;

    /// Transition a row's embedding lifecycle. `Ready` requires the
    /// vector; a failure message is written into row metadata.
    fn mark_embedding(
        &self,
        id: i64,
        status: EmbeddingStatus,
        vector: Option<&[f32]>,
        model: Option<&str>,
        error: Option<&str>,
    ) -> EngramResult<()>;

    fn get(&self, id: i64) -> EngramResult<Option<MemoryRecord>>;

    /// Every row (current and history) for one fact of one user.
    fn find_by_fingerprint(
        &self,
        user_id: &str,
        fingerprint: &str,
    ) -> EngramResult<Vec<MemoryRecord>>;

    // --- Retrieval reads ---

    /// The SQL prefilter. Rows come back ordered by
    /// `relevance_score DESC, created_at DESC`, capped.
    fn get_candidates(&self, filter: &CandidateFilter) -> EngramResult<Vec<MemoryRecord>>;

    /// Rows created within the lag window that have no ready embedding
    /// yet, honoring the same mode visibility as `filter`.
    fn recent_unembedded(
        &self,
        filter: &CandidateFilter,
        window_secs: u64,
    ) -> EngramResult<Vec<MemoryRecord>>;

    /// Bump `usage_frequency`, `relevance_score` (capped at 1.0) and
    /// `last_accessed` on the given rows. Monotonic; safe to interleave.
    fn record_access(&self, ids: &[i64]) -> EngramResult<()>;

    // --- Backfill ---

    /// Atomically pick the newest eligible unembedded row and mark it
    /// `processing`, so a second worker cannot claim it.
    fn claim_backfill_row(&self, options: &BackfillOptions) -> EngramResult<Option<MemoryRecord>>;

    /// Eligible rows still waiting (for the report's `remaining`).
    fn count_unembedded(&self, options: &BackfillOptions) -> EngramResult<u64>;

    /// Reset rows stuck in `processing` longer than the given age back
    /// to `pending`. Returns how many were reclaimed.
    fn reclaim_stuck_processing(&self, older_than_secs: u64) -> EngramResult<usize>;

    // --- Adaptive centroid ---

    fn load_centroid(&self, user_id: &str) -> EngramResult<Option<Vec<f32>>>;

    /// Fold engaged-memory vectors into the user's running mean.
    fn update_centroid(&self, user_id: &str, vectors: &[Vec<f32>]) -> EngramResult<()>;

    // --- Maintenance ---

    fn create_supersession_constraint(&self) -> EngramResult<ConstraintReport>;

    fn cleanup_duplicate_current_facts(&self) -> EngramResult<CleanupReport>;
}
