//! MemoryService: the operation surface. Store is atomic (committed id
//! or error) with a bounded inline embed bolted on after the commit;
//! retrieval is best-effort; the adaptive update runs on a detached
//! thread off the request path.

use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use engram_core::config::EngramConfig;
use engram_core::errors::{EngramError, EngramResult};
use engram_core::memory::EmbeddingStatus;
use engram_core::models::{
    BackfillOptions, BackfillReport, CleanupReport, ConstraintReport, MemoryDraft,
    RetrievalOptions, RetrievalOutcome, StoreReceipt,
};
use engram_core::traits::{IFingerprintLabeler, IMemoryStore};
use engram_embeddings::{BackfillWorker, EmbeddingClient};
use engram_fingerprint::FingerprintClassifier;
use engram_observability::TelemetryLog;
use engram_retrieval::RetrievalEngine;
use engram_storage::StorageEngine;
use engram_tokens::TokenCounter;

use crate::request::StoreRequest;

pub struct MemoryService {
    storage: Arc<StorageEngine>,
    embeddings: Arc<EmbeddingClient>,
    classifier: FingerprintClassifier,
    tokens: TokenCounter,
    config: EngramConfig,
    telemetry: Arc<Mutex<TelemetryLog>>,
}

impl MemoryService {
    /// Open a service from configuration: file-backed storage (or
    /// in-memory when no path is set) and the HTTP embedding provider.
    pub fn open(config: EngramConfig) -> EngramResult<Self> {
        let storage = if config.database_path.is_empty() {
            StorageEngine::open_in_memory()?
        } else {
            StorageEngine::open_with(
                Path::new(&config.database_path),
                config.supersession.clone(),
            )?
        };
        let embeddings = EmbeddingClient::new(config.embedding.clone())?;
        Ok(Self::with_components(
            config,
            Arc::new(storage),
            Arc::new(embeddings),
            None,
        ))
    }

    /// Assemble from explicit components (tests, offline providers,
    /// custom classifier fallback).
    pub fn with_components(
        config: EngramConfig,
        storage: Arc<StorageEngine>,
        embeddings: Arc<EmbeddingClient>,
        labeler: Option<Box<dyn IFingerprintLabeler>>,
    ) -> Self {
        let mut classifier = FingerprintClassifier::new();
        if config.classifier_fallback_enabled {
            if let Some(labeler) = labeler {
                classifier = classifier.with_labeler(labeler);
            }
        }
        Self {
            storage,
            embeddings,
            classifier,
            tokens: TokenCounter::default(),
            config,
            telemetry: Arc::new(Mutex::new(TelemetryLog::new())),
        }
    }

    /// Store a memory: classify, count tokens, supersede when the
    /// safety gate clears, then attempt the bounded inline embed.
    pub fn store(&self, request: StoreRequest) -> EngramResult<StoreReceipt> {
        self.store_inner(request, true)
    }

    /// Plain insert, no replacement of prior rows regardless of
    /// classification.
    pub fn store_without_supersession(&self, request: StoreRequest) -> EngramResult<StoreReceipt> {
        self.store_inner(request, false)
    }

    fn store_inner(&self, request: StoreRequest, allow_supersession: bool) -> EngramResult<StoreReceipt> {
        if request.user_id.trim().is_empty() {
            return Err(EngramError::invalid_input("user_id must be a non-empty string"));
        }
        if request.content.trim().is_empty() {
            return Err(EngramError::invalid_input("content must be a non-empty string"));
        }

        let decision = self.classifier.classify(&request.content);
        let token_count = request
            .token_count
            .unwrap_or_else(|| self.tokens.count_cached(&request.content) as i64);

        // Store-time content analysis rides along in metadata so the
        // lag fallback can match codes without an embedding.
        let mut metadata = request.metadata.unwrap_or_default();
        if metadata.anchors.is_empty() {
            metadata.anchors = engram_retrieval::scoring::extract_anchor_tokens(&request.content);
        }
        if metadata.ordinal.is_none() {
            metadata.ordinal =
                engram_retrieval::boosts::find_ordinal(&request.content).map(str::to_string);
        }

        let draft = MemoryDraft {
            user_id: request.user_id.trim().to_string(),
            mode: request.mode,
            category: request.category,
            content: request.content,
            token_count,
            fingerprint: decision.clone(),
            metadata,
        };

        // The conservative default: misclassification must never delete
        // a real fact, so anything short of the full gate is a plain
        // insert.
        let gate_cleared = allow_supersession
            && decision.clears_gate(self.config.supersession.min_confidence);
        let mut receipt = if gate_cleared {
            self.storage.insert_superseding(&draft)?
        } else {
            self.storage.insert(&draft)?
        };

        info!(
            id = receipt.id,
            superseded = receipt.superseded.len(),
            fingerprint = receipt.fingerprint.as_deref().unwrap_or("-"),
            "memory stored"
        );

        receipt.embedding_status = self.embed_inline(receipt.id, &draft.content);
        Ok(receipt)
    }

    /// The bounded inline embed. Timeouts and connection failures leave
    /// the row retryable for backfill; provider errors mark it failed
    /// with the error recorded. The store itself already committed;
    /// nothing here can undo it.
    fn embed_inline(&self, id: i64, content: &str) -> EmbeddingStatus {
        match self
            .embeddings
            .embed(content, self.embeddings.inline_deadline())
        {
            Ok(embedded) => {
                match self.storage.mark_embedding(
                    id,
                    EmbeddingStatus::Ready,
                    Some(&embedded.vector),
                    Some(&embedded.model),
                    None,
                ) {
                    Ok(()) => EmbeddingStatus::Ready,
                    Err(e) => {
                        warn!(id, error = %e, "failed to persist inline embedding");
                        EmbeddingStatus::Pending
                    }
                }
            }
            Err(e) if e.is_retryable() => {
                warn!(id, error = %e, "inline embed retryable failure, leaving pending");
                if let Err(mark_err) =
                    self.storage
                        .mark_embedding(id, EmbeddingStatus::Pending, None, None, None)
                {
                    warn!(id, error = %mark_err, "failed to mark row pending");
                }
                EmbeddingStatus::Pending
            }
            Err(e) => {
                warn!(id, error = %e, "inline embed failed");
                if let Err(mark_err) = self.storage.mark_embedding(
                    id,
                    EmbeddingStatus::Failed,
                    None,
                    None,
                    Some(&e.to_string()),
                ) {
                    warn!(id, error = %mark_err, "failed to mark row failed");
                }
                EmbeddingStatus::Failed
            }
        }
    }

    /// Retrieval options seeded with this service's configured
    /// defaults.
    pub fn retrieval_options(
        &self,
        user_id: impl Into<String>,
        mode: engram_core::memory::Mode,
    ) -> RetrievalOptions {
        RetrievalOptions::new(user_id, mode)
            .with_top_k(self.config.retrieval.default_top_k)
            .with_token_budget(self.config.retrieval.default_token_budget)
    }

    /// Run the retrieval pipeline and dispatch the non-blocking
    /// adaptive update for whatever it returned.
    pub fn retrieve(
        &self,
        query: &str,
        options: RetrievalOptions,
    ) -> EngramResult<RetrievalOutcome> {
        let mut options = options;
        // Cross-mode reads are a deployment-level feature flag on top of
        // the per-request option.
        if !self.config.cross_mode_enabled {
            options.allow_cross_mode = false;
        }

        let engine = RetrievalEngine::new(
            self.storage.as_ref(),
            self.embeddings.as_ref(),
            self.config.retrieval.clone(),
        );
        let outcome = engine.retrieve(query, &options)?;

        self.dispatch_adaptive_update(&outcome);

        if let Ok(mut log) = self.telemetry.lock() {
            log.record(outcome.telemetry.clone());
        }
        Ok(outcome)
    }

    /// Fire-and-forget usage counters and centroid update. Never on the
    /// request path's critical latency.
    fn dispatch_adaptive_update(&self, outcome: &RetrievalOutcome) {
        if outcome.memories.is_empty() {
            return;
        }
        let ids: Vec<i64> = outcome.memories.iter().map(|m| m.record.id).collect();
        let vectors: Vec<Vec<f32>> = if self.config.retrieval.adaptive_centroid {
            outcome
                .memories
                .iter()
                .filter_map(|m| m.record.embedding.clone())
                .collect()
        } else {
            Vec::new()
        };
        let user_id = outcome
            .memories
            .first()
            .map(|m| m.record.user_id.clone())
            .unwrap_or_default();

        let storage = Arc::clone(&self.storage);
        std::thread::spawn(move || {
            if let Err(e) = storage.record_access(&ids) {
                warn!(error = %e, "adaptive access update failed");
            }
            if !vectors.is_empty() {
                if let Err(e) = storage.update_centroid(&user_id, &vectors) {
                    warn!(error = %e, "centroid update failed");
                }
            }
        });
    }

    /// One bounded backfill run.
    pub fn backfill(&self, options: BackfillOptions) -> EngramResult<BackfillReport> {
        let worker = BackfillWorker::new(
            self.storage.as_ref(),
            self.embeddings.as_ref(),
            self.config.backfill.clone(),
        );
        worker.run(&options)
    }

    pub fn create_supersession_constraint(&self) -> EngramResult<ConstraintReport> {
        self.storage.create_supersession_constraint()
    }

    pub fn cleanup_duplicate_current_facts(&self) -> EngramResult<CleanupReport> {
        self.storage.cleanup_duplicate_current_facts()
    }

    /// The bounded telemetry history.
    pub fn telemetry(&self) -> Arc<Mutex<TelemetryLog>> {
        Arc::clone(&self.telemetry)
    }

    /// Direct storage access for maintenance tooling and tests.
    pub fn storage(&self) -> &StorageEngine {
        self.storage.as_ref()
    }
}
