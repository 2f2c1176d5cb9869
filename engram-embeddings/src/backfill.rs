//! Resumable backfill worker: one row at a time under a count and
//! wall-clock budget. Row-level failures never abort the run; the row
//! is marked `failed` with the error in its metadata and the loop moves
//! on.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use engram_core::config::BackfillConfig;
use engram_core::errors::EngramResult;
use engram_core::memory::EmbeddingStatus;
use engram_core::models::{BackfillOptions, BackfillReport};
use engram_core::traits::IMemoryStore;

use crate::client::EmbeddingClient;

pub struct BackfillWorker<'a> {
    storage: &'a dyn IMemoryStore,
    client: &'a EmbeddingClient,
    config: BackfillConfig,
}

impl<'a> BackfillWorker<'a> {
    pub fn new(
        storage: &'a dyn IMemoryStore,
        client: &'a EmbeddingClient,
        config: BackfillConfig,
    ) -> Self {
        Self {
            storage,
            client,
            config,
        }
    }

    /// One bounded run. Exits when the count limit, the wall-clock
    /// budget, or the eligible rows are exhausted.
    pub fn run(&self, options: &BackfillOptions) -> EngramResult<BackfillReport> {
        let started = Instant::now();
        let budget = Duration::from_secs(options.max_seconds);

        // Rows whose worker died mid-call come back first.
        let reclaimed = self
            .storage
            .reclaim_stuck_processing(self.config.processing_reclaim_secs)?;
        if reclaimed > 0 {
            info!(reclaimed, "reset stuck processing rows to pending");
        }

        let mut report = BackfillReport::default();
        while report.processed < options.limit && started.elapsed() < budget {
            let Some(row) = self.storage.claim_backfill_row(options)? else {
                break;
            };
            debug!(id = row.id, "backfilling embedding");

            match self.client.embed(&row.content, self.client.backfill_deadline()) {
                Ok(embedded) => {
                    match self.storage.mark_embedding(
                        row.id,
                        EmbeddingStatus::Ready,
                        Some(&embedded.vector),
                        Some(&embedded.model),
                        None,
                    ) {
                        Ok(()) => report.succeeded += 1,
                        Err(e) => {
                            warn!(id = row.id, error = %e, "failed to persist backfilled embedding");
                            report.failed += 1;
                        }
                    }
                }
                Err(e) => {
                    warn!(id = row.id, error = %e, "backfill embed failed");
                    if let Err(mark_err) = self.storage.mark_embedding(
                        row.id,
                        EmbeddingStatus::Failed,
                        None,
                        None,
                        Some(&e.to_string()),
                    ) {
                        warn!(id = row.id, error = %mark_err, "failed to mark row failed");
                    }
                    report.failed += 1;
                }
            }

            report.processed += 1;
            // Rate hygiene between rows.
            std::thread::sleep(Duration::from_millis(self.config.throttle_ms));
        }

        report.remaining = self.storage.count_unembedded(options)?;
        report.seconds_elapsed = started.elapsed().as_secs_f64();

        info!(
            processed = report.processed,
            succeeded = report.succeeded,
            failed = report.failed,
            remaining = report.remaining,
            "backfill run complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use engram_core::config::EmbeddingConfig;
    use engram_core::constants::EMBEDDING_DIMENSIONS;
    use engram_core::errors::EmbeddingError;
    use engram_core::memory::Mode;
    use engram_core::models::MemoryDraft;
    use engram_core::traits::{EmbeddingVector, IEmbeddingProvider};
    use engram_storage::StorageEngine;

    use crate::providers::HashedEmbeddingProvider;

    /// Fails the first `failures` calls, then succeeds.
    struct FlakyProvider {
        failures: usize,
        calls: AtomicUsize,
        inner: HashedEmbeddingProvider,
    }

    impl IEmbeddingProvider for FlakyProvider {
        fn embed(
            &self,
            text: &str,
            deadline: Duration,
        ) -> Result<EmbeddingVector, EmbeddingError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(EmbeddingError::Provider {
                    status: Some(500),
                    message: "transient".to_string(),
                })
            } else {
                self.inner.embed(text, deadline)
            }
        }
        fn model(&self) -> &str {
            self.inner.model()
        }
        fn dimensions(&self) -> usize {
            self.inner.dimensions()
        }
    }

    fn fast_config() -> BackfillConfig {
        BackfillConfig {
            throttle_ms: 0,
            ..Default::default()
        }
    }

    fn offline_client() -> EmbeddingClient {
        EmbeddingClient::with_provider(
            EmbeddingConfig::default(),
            Box::new(HashedEmbeddingProvider::new(EMBEDDING_DIMENSIONS)),
        )
    }

    #[test]
    fn backfill_embeds_pending_rows() {
        let storage = StorageEngine::open_in_memory().unwrap();
        for i in 0..3 {
            storage
                .insert(&MemoryDraft::new("u1", Mode::general(), format!("fact {i}")))
                .unwrap();
        }

        let client = offline_client();
        let worker = BackfillWorker::new(&storage, &client, fast_config());
        let report = worker.run(&BackfillOptions::default()).unwrap();

        assert_eq!(report.processed, 3);
        assert_eq!(report.succeeded, 3);
        assert_eq!(report.failed, 0);
        assert_eq!(report.remaining, 0);
    }

    #[test]
    fn row_failure_is_contained() {
        let storage = StorageEngine::open_in_memory().unwrap();
        let first = storage
            .insert(&MemoryDraft::new("u1", Mode::general(), "one fact"))
            .unwrap();
        let second = storage
            .insert(&MemoryDraft::new("u1", Mode::general(), "another fact"))
            .unwrap();

        let client = EmbeddingClient::with_provider(
            EmbeddingConfig::default(),
            Box::new(FlakyProvider {
                failures: 1,
                calls: AtomicUsize::new(0),
                inner: HashedEmbeddingProvider::new(EMBEDDING_DIMENSIONS),
            }),
        );
        let worker = BackfillWorker::new(&storage, &client, fast_config());
        let report = worker.run(&BackfillOptions::default()).unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);

        let statuses: Vec<EmbeddingStatus> = [first.id, second.id]
            .iter()
            .map(|id| storage.get(*id).unwrap().unwrap().embedding_status)
            .collect();
        assert!(statuses.contains(&EmbeddingStatus::Failed));
        assert!(statuses.contains(&EmbeddingStatus::Ready));

        let failed_row = [first.id, second.id]
            .into_iter()
            .map(|id| storage.get(id).unwrap().unwrap())
            .find(|r| r.embedding_status == EmbeddingStatus::Failed)
            .unwrap();
        assert!(failed_row.metadata.embedding_error.is_some());
    }

    #[test]
    fn count_limit_bounds_the_run() {
        let storage = StorageEngine::open_in_memory().unwrap();
        for i in 0..5 {
            storage
                .insert(&MemoryDraft::new("u1", Mode::general(), format!("fact {i}")))
                .unwrap();
        }

        let client = offline_client();
        let worker = BackfillWorker::new(&storage, &client, fast_config());
        let report = worker
            .run(&BackfillOptions {
                limit: 2,
                ..Default::default()
            })
            .unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.remaining, 3);
    }
}
