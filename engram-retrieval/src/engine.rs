//! RetrievalEngine: orchestrates the full pipeline.
//!
//! Stage 0: domain/recall detection + synonym expansion.
//! Stage 1: query embedding (short deadline; failure aborts retrieval).
//! Stage 2: SQL prefilter, isolation sentinel, lag augmentation.
//! Stage 3: cosine / text-heuristic scoring.
//! Stage 4: boost pipeline (safety → ordinal → recall → hybrid).
//! Stage 5: threshold + sort. Stage 6: token-budget selection.
//! Stage 8: telemetry, emitted on every path.

use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use engram_core::config::RetrievalConfig;
use engram_core::constants::{LAG_FALLBACK_RESULT_CAP, MAX_CANDIDATE_CAP};
use engram_core::errors::{EngramError, EngramResult, RetrievalError};
use engram_core::memory::MemoryRecord;
use engram_core::models::{
    CandidateFilter, RetrievalOptions, RetrievalOutcome, RetrievalTelemetry, RetrievedMemory,
};
use engram_core::traits::IMemoryStore;
use engram_embeddings::EmbeddingClient;

use crate::{boosts, budget, domain, expansion, recall, scoring};

/// The main retrieval engine.
pub struct RetrievalEngine<'a> {
    storage: &'a dyn IMemoryStore,
    embeddings: &'a EmbeddingClient,
    config: RetrievalConfig,
}

/// Internal scoring carrier, one per surviving candidate.
struct ScoredCandidate {
    record: MemoryRecord,
    similarity: f64,
    boosted: f64,
    hybrid: f64,
}

impl<'a> RetrievalEngine<'a> {
    pub fn new(
        storage: &'a dyn IMemoryStore,
        embeddings: &'a EmbeddingClient,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            storage,
            embeddings,
            config,
        }
    }

    /// Run the full pipeline for one query.
    pub fn retrieve(
        &self,
        query: &str,
        options: &RetrievalOptions,
    ) -> EngramResult<RetrievalOutcome> {
        let total_start = Instant::now();

        // Input validation. A blank tenant would turn the prefilter
        // into a cross-user scan, so it is an isolation error, not a
        // soft failure.
        if options.user_id.trim().is_empty() {
            return Err(RetrievalError::IsolationViolation {
                reason: "retrieval requires a non-empty user_id".to_string(),
            }
            .into());
        }
        let query = query.trim();
        if query.is_empty() {
            return Err(EngramError::invalid_input("query must be a non-empty string"));
        }

        let mut telemetry = RetrievalTelemetry {
            method: "semantic".to_string(),
            correlation_id: Uuid::new_v4().to_string(),
            query_length: query.chars().count(),
            mode: options.mode.to_string(),
            token_budget: options.token_budget,
            ..Default::default()
        };

        // Stage 0: domain + recall detection, synonym expansion.
        let safety = domain::detect(query, options.categories.clone());
        telemetry.safety_critical_detected = safety.detected;
        telemetry.categories_filter = safety.categories.clone();
        let recall_mode = recall::is_memory_recall(query);
        let personal = recall::is_personal_query(query);
        // Synonyms feed the embedding input only.
        let embed_input = expansion::expand_for_embedding(query);
        debug!(
            recall_mode,
            personal,
            safety = safety.detected,
            "query analysis complete"
        );

        // Stage 1: embed the query.
        let embed_start = Instant::now();
        let deadline = Duration::from_millis(self.config.query_embedding_timeout_ms);
        let query_vector =
            match self
                .embeddings
                .embed_query(&options.user_id, &embed_input, deadline)
            {
                Ok(embedded) => embedded.vector,
                Err(e) => {
                    warn!(error = %e, "query embedding failed, retrieval aborted");
                    telemetry.latency.embed_ms = embed_start.elapsed().as_millis() as u64;
                    telemetry.latency.total_ms = total_start.elapsed().as_millis() as u64;
                    telemetry.method = "none".to_string();
                    telemetry.error = Some(
                        RetrievalError::QueryEmbeddingFailed {
                            message: e.to_string(),
                        }
                        .to_string(),
                    );
                    return Ok(RetrievalOutcome::empty(telemetry));
                }
            };
        telemetry.latency.embed_ms = embed_start.elapsed().as_millis() as u64;

        // Stage 2: SQL prefilter.
        let prefilter_start = Instant::now();
        let filter = CandidateFilter::semantic(
            options.user_id.clone(),
            options.mode.clone(),
            self.config.max_candidates.min(MAX_CANDIDATE_CAP),
        )
        .with_categories(safety.categories.clone())
        .with_cross_mode(options.allow_cross_mode)
        .with_all_modes(options.include_all_modes);

        let mut candidates = self.storage.get_candidates(&filter)?;
        telemetry.wrong_user_memories_filtered +=
            enforce_isolation(&mut candidates, &options.user_id);

        // Stage 2c: embedding-lag augmentation, same visibility rules.
        let mut recent = self
            .storage
            .recent_unembedded(&filter, self.config.lag_window_secs)?;
        telemetry.wrong_user_memories_filtered += enforce_isolation(&mut recent, &options.user_id);
        telemetry.latency.prefilter_ms = prefilter_start.elapsed().as_millis() as u64;

        telemetry.candidates_considered = candidates.len() + recent.len();
        telemetry.candidates_with_embeddings = candidates
            .iter()
            .filter(|r| r.has_ready_embedding())
            .count();

        // Early exit: nothing to score at all.
        if candidates.is_empty() && recent.is_empty() {
            telemetry.method = "none".to_string();
            telemetry.success = true;
            telemetry.latency.total_ms = total_start.elapsed().as_millis() as u64;
            debug!("no candidates, returning empty result");
            return Ok(RetrievalOutcome::empty(telemetry));
        }

        // Pure fallback: rows exist but none are embedded yet.
        let pure_fallback = candidates.is_empty();
        if pure_fallback {
            telemetry.method = "lag_fallback".to_string();
            telemetry.fallback_used = true;
            telemetry.fallback_reason = Some("embedding_missing".to_string());
        }

        // Stage 3: scoring.
        let scoring_start = Instant::now();
        let now = Utc::now();
        let mut scored: Vec<ScoredCandidate> = Vec::with_capacity(candidates.len() + recent.len());
        for record in candidates {
            match &record.embedding {
                Some(embedding) => {
                    telemetry.vectors_compared += 1;
                    let similarity = scoring::cosine_similarity(embedding, &query_vector);
                    scored.push(ScoredCandidate {
                        record,
                        similarity,
                        boosted: 0.0,
                        hybrid: 0.0,
                    });
                }
                None => {
                    // Ready status without a decodable vector.
                    telemetry.unparseable_embeddings += 1;
                }
            }
        }
        for record in recent {
            let similarity = scoring::text_match_score(query, &record, recall_mode, now);
            scored.push(ScoredCandidate {
                record,
                similarity,
                boosted: 0.0,
                hybrid: 0.0,
            });
        }

        // Stage 4: the boost pipeline, in this exact order.
        let centroid = if self.config.adaptive_centroid {
            self.storage.load_centroid(&options.user_id)?
        } else {
            None
        };
        let query_ordinal = boosts::find_ordinal(query);
        for candidate in &mut scored {
            let safety_boost = boosts::safety_boost(&candidate.record);
            if safety_boost > 0.0 {
                telemetry.safety_memories_boosted += 1;
            }
            candidate.boosted = candidate.similarity
                + safety_boost
                + boosts::ordinal_boost(query_ordinal, &candidate.record)
                + boosts::explicit_recall_boost(recall_mode, &candidate.record);
            candidate.hybrid = candidate.boosted
                + boosts::recency_component(&candidate.record, recall_mode, &self.config, now)
                + boosts::confidence_component(&candidate.record, &self.config)
                + boosts::centroid_component(
                    &candidate.record,
                    centroid.as_deref(),
                    &self.config,
                );
        }

        // Stage 5: threshold on the boosted similarity, sort by hybrid.
        let threshold = if recall_mode || pure_fallback {
            self.config.min_similarity_recall
        } else if personal {
            self.config.min_similarity_personal
        } else {
            self.config.min_similarity
        };
        scored.retain(|c| c.boosted >= threshold);
        telemetry.candidates_above_threshold = scored.len();
        scored.sort_by(|a, b| {
            b.hybrid
                .partial_cmp(&a.hybrid)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        // Stage 6: token-budget window. The fallback path caps result
        // count defensively.
        let top_k = if pure_fallback {
            options.top_k.min(LAG_FALLBACK_RESULT_CAP)
        } else {
            options.top_k
        };
        let ranked: Vec<RetrievedMemory> = scored
            .into_iter()
            .map(|c| RetrievedMemory {
                record: c.record,
                similarity: c.similarity,
                score: c.hybrid,
            })
            .collect();
        let (selected, tokens_used) =
            budget::select_within_budget(ranked, top_k, options.token_budget);

        telemetry.latency.scoring_ms = scoring_start.elapsed().as_millis() as u64;
        telemetry.results_injected = selected.len();
        telemetry.injected_ids = selected.iter().map(|m| m.record.id).collect();
        telemetry.top_scores = selected.iter().take(5).map(|m| m.score).collect();
        telemetry.tokens_used = tokens_used;
        telemetry.success = true;
        telemetry.latency.total_ms = total_start.elapsed().as_millis() as u64;

        info!(
            results = telemetry.results_injected,
            tokens = telemetry.tokens_used,
            budget = telemetry.token_budget,
            method = %telemetry.method,
            "retrieval complete"
        );

        Ok(RetrievalOutcome {
            memories: selected,
            telemetry,
        })
    }
}

/// Stage 2b: the user-isolation sentinel. The SQL filter should make
/// this a no-op; any hit is a critical security event that is filtered
/// out, counted, and logged.
fn enforce_isolation(rows: &mut Vec<MemoryRecord>, user_id: &str) -> usize {
    let before = rows.len();
    rows.retain(|r| r.user_id == user_id);
    let filtered = before - rows.len();
    if filtered > 0 {
        error!(
            filtered,
            user_id, "cross-user rows leaked past the prefilter; filtered"
        );
    }
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use engram_core::config::EmbeddingConfig;
    use engram_core::constants::EMBEDDING_DIMENSIONS;
    use engram_core::memory::{EmbeddingStatus, Mode};
    use engram_core::models::MemoryDraft;
    use engram_embeddings::providers::HashedEmbeddingProvider;
    use engram_storage::StorageEngine;

    fn offline_client() -> EmbeddingClient {
        EmbeddingClient::with_provider(
            EmbeddingConfig::default(),
            Box::new(HashedEmbeddingProvider::new(EMBEDDING_DIMENSIONS)),
        )
    }

    fn store_embedded(
        storage: &StorageEngine,
        client: &EmbeddingClient,
        user: &str,
        content: &str,
        tokens: i64,
    ) -> i64 {
        let receipt = storage
            .insert(&MemoryDraft::new(user, Mode::general(), content).with_token_count(tokens))
            .unwrap();
        let embedded = client.embed(content, Duration::from_secs(1)).unwrap();
        storage
            .mark_embedding(
                receipt.id,
                EmbeddingStatus::Ready,
                Some(&embedded.vector),
                Some(&embedded.model),
                None,
            )
            .unwrap();
        receipt.id
    }

    #[test]
    fn blank_user_is_an_isolation_error() {
        let storage = StorageEngine::open_in_memory().unwrap();
        let client = offline_client();
        let engine = RetrievalEngine::new(&storage, &client, RetrievalConfig::default());
        let options = RetrievalOptions::new("  ", Mode::general());
        assert!(engine.retrieve("anything", &options).is_err());
    }

    #[test]
    fn empty_query_is_invalid_input() {
        let storage = StorageEngine::open_in_memory().unwrap();
        let client = offline_client();
        let engine = RetrievalEngine::new(&storage, &client, RetrievalConfig::default());
        let options = RetrievalOptions::new("u1", Mode::general());
        assert!(engine.retrieve("   ", &options).is_err());
    }

    #[test]
    fn empty_store_exits_early_with_telemetry() {
        let storage = StorageEngine::open_in_memory().unwrap();
        let client = offline_client();
        let engine = RetrievalEngine::new(&storage, &client, RetrievalConfig::default());
        let options = RetrievalOptions::new("u1", Mode::general());

        let outcome = engine.retrieve("what is my color?", &options).unwrap();
        assert!(outcome.memories.is_empty());
        assert!(outcome.telemetry.success);
        assert_eq!(outcome.telemetry.method, "none");
        assert_eq!(outcome.telemetry.candidates_considered, 0);
    }

    #[test]
    fn retrieval_is_tenant_isolated() {
        let storage = StorageEngine::open_in_memory().unwrap();
        let client = offline_client();
        store_embedded(&storage, &client, "alice", "my favorite color is blue", 10);
        store_embedded(&storage, &client, "bob", "my favorite color is red", 10);

        let engine = RetrievalEngine::new(&storage, &client, RetrievalConfig::default());
        let options = RetrievalOptions::new("alice", Mode::general());
        let outcome = engine
            .retrieve("what is my favorite color?", &options)
            .unwrap();

        assert!(!outcome.memories.is_empty());
        assert!(outcome
            .memories
            .iter()
            .all(|m| m.record.user_id == "alice"));
        assert!(outcome.memories[0].record.content.contains("blue"));
        assert_eq!(outcome.telemetry.wrong_user_memories_filtered, 0);
    }

    #[test]
    fn unembedded_rows_surface_through_lag_fallback() {
        let storage = StorageEngine::open_in_memory().unwrap();
        let client = offline_client();
        storage
            .insert(
                &MemoryDraft::new("u1", Mode::general(), "remember token ZEBRA-ANCHOR-123")
                    .with_token_count(8),
            )
            .unwrap();

        let engine = RetrievalEngine::new(&storage, &client, RetrievalConfig::default());
        let options = RetrievalOptions::new("u1", Mode::general());
        let outcome = engine
            .retrieve("what is my ZEBRA-ANCHOR-123 token?", &options)
            .unwrap();

        assert_eq!(outcome.memories.len(), 1);
        assert!(outcome.telemetry.fallback_used);
        assert_eq!(
            outcome.telemetry.fallback_reason.as_deref(),
            Some("embedding_missing")
        );
        assert_eq!(outcome.telemetry.method, "lag_fallback");
        assert!(outcome.memories[0].similarity >= 0.95);
    }

    #[test]
    fn token_budget_is_enforced() {
        let storage = StorageEngine::open_in_memory().unwrap();
        let client = offline_client();
        for i in 0..8 {
            store_embedded(
                &storage,
                &client,
                "u1",
                &format!("my favorite color is blue variant {i}"),
                200,
            );
        }

        let engine = RetrievalEngine::new(&storage, &client, RetrievalConfig::default());
        let options = RetrievalOptions::new("u1", Mode::general())
            .with_top_k(20)
            .with_token_budget(500);
        let outcome = engine
            .retrieve("what is my favorite color?", &options)
            .unwrap();

        assert!(outcome.telemetry.tokens_used <= 500);
        assert!(outcome.memories.len() <= 2);
        let sum: i64 = outcome
            .memories
            .iter()
            .map(|m| m.record.token_count)
            .sum();
        assert!(sum <= 500);
    }

    #[test]
    fn telemetry_counts_scoring_work() {
        let storage = StorageEngine::open_in_memory().unwrap();
        let client = offline_client();
        store_embedded(&storage, &client, "u1", "my favorite color is blue", 10);
        store_embedded(&storage, &client, "u1", "I live in Lisbon", 10);

        let engine = RetrievalEngine::new(&storage, &client, RetrievalConfig::default());
        let options = RetrievalOptions::new("u1", Mode::general());
        let outcome = engine
            .retrieve("what is my favorite color?", &options)
            .unwrap();

        assert_eq!(outcome.telemetry.candidates_considered, 2);
        assert_eq!(outcome.telemetry.candidates_with_embeddings, 2);
        assert_eq!(outcome.telemetry.vectors_compared, 2);
        assert!(outcome.telemetry.success);
        assert!(!outcome.telemetry.correlation_id.is_empty());
    }
}
