//! Pipeline-wide properties: the token budget is a hard ceiling for any
//! ranked list, and budget selection never reorders what it keeps.

use chrono::Utc;
use engram_core::memory::{EmbeddingStatus, MemoryMetadata, MemoryRecord, Mode};
use engram_core::models::RetrievedMemory;
use engram_retrieval::budget::select_within_budget;
use proptest::prelude::*;

fn scored(id: i64, tokens: i64, score: f64) -> RetrievedMemory {
    RetrievedMemory {
        record: MemoryRecord {
            id,
            user_id: "prop".to_string(),
            mode: Mode::general(),
            category: None,
            content: format!("memory {id}"),
            token_count: tokens,
            embedding: None,
            embedding_status: EmbeddingStatus::Ready,
            embedding_model: None,
            embedding_updated_at: None,
            fact_fingerprint: None,
            fingerprint_confidence: None,
            is_current: true,
            superseded_by: None,
            superseded_at: None,
            relevance_score: 0.5,
            usage_frequency: 0,
            last_accessed: None,
            created_at: Utc::now(),
            metadata: MemoryMetadata::default(),
        },
        similarity: score,
        score,
    }
}

proptest! {
    #[test]
    fn budget_ceiling_holds(
        token_counts in prop::collection::vec(0_i64..600, 0..40),
        budget in 0_usize..2000,
        top_k in 0_usize..30,
    ) {
        let ranked: Vec<_> = token_counts
            .iter()
            .enumerate()
            .map(|(i, t)| scored(i as i64, *t, 1.0 - i as f64 * 0.01))
            .collect();
        let (selected, used) = select_within_budget(ranked, top_k, budget);

        prop_assert!(used <= budget as i64);
        prop_assert!(selected.len() <= top_k);
        let sum: i64 = selected.iter().map(|m| m.record.token_count).sum();
        prop_assert_eq!(sum, used);
    }

    #[test]
    fn selection_preserves_rank_order(
        token_counts in prop::collection::vec(1_i64..300, 1..20),
    ) {
        let ranked: Vec<_> = token_counts
            .iter()
            .enumerate()
            .map(|(i, t)| scored(i as i64, *t, 100.0 - i as f64))
            .collect();
        let (selected, _) = select_within_budget(ranked, 10, 1000);
        for pair in selected.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
    }
}
