//! End-to-end scenarios against a real storage engine and the
//! deterministic offline embedding provider.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use engram::{
    BackfillOptions, EngramConfig, MemoryMetadata, MemoryService, Mode, StoreRequest,
};
use engram_core::constants::EMBEDDING_DIMENSIONS;
use engram_core::errors::EmbeddingError;
use engram_core::traits::{EmbeddingVector, IEmbeddingProvider, IMemoryStore};
use engram_embeddings::providers::HashedEmbeddingProvider;
use engram_embeddings::EmbeddingClient;
use engram_storage::StorageEngine;

/// Provider that fails its first `failures` calls, then defers to the
/// hashed provider. Failure kind is connection-level, so rows stay
/// retryable.
struct FlakyProvider {
    failures: usize,
    calls: AtomicUsize,
    inner: HashedEmbeddingProvider,
}

impl FlakyProvider {
    fn new(failures: usize) -> Self {
        Self {
            failures,
            calls: AtomicUsize::new(0),
            inner: HashedEmbeddingProvider::new(EMBEDDING_DIMENSIONS),
        }
    }
}

impl IEmbeddingProvider for FlakyProvider {
    fn embed(&self, text: &str, deadline: Duration) -> Result<EmbeddingVector, EmbeddingError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
            Err(EmbeddingError::Provider {
                status: None,
                message: "connection refused".to_string(),
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

fn service_with(provider: Box<dyn IEmbeddingProvider>) -> MemoryService {
    let config = EngramConfig::default();
    let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
    let embeddings = Arc::new(EmbeddingClient::with_provider(
        config.embedding.clone(),
        provider,
    ));
    MemoryService::with_components(config, storage, embeddings, None)
}

fn offline_service() -> MemoryService {
    service_with(Box::new(HashedEmbeddingProvider::new(EMBEDDING_DIMENSIONS)))
}

#[test]
fn supersession_linearizability() {
    let service = offline_service();

    let first = service
        .store(StoreRequest::new(
            "u1",
            Mode::general(),
            "my phone is 555-111-2222",
        ))
        .unwrap();
    assert_eq!(first.fingerprint.as_deref(), Some("user_phone_number"));
    assert!(first.superseded.is_empty());

    let second = service
        .store(StoreRequest::new(
            "u1",
            Mode::general(),
            "my phone is 555-333-4444",
        ))
        .unwrap();
    assert_eq!(second.superseded, vec![first.id]);

    let rows = service
        .storage()
        .find_by_fingerprint("u1", "user_phone_number")
        .unwrap();
    assert_eq!(rows.len(), 2);

    let current: Vec<_> = rows.iter().filter(|r| r.is_current).collect();
    assert_eq!(current.len(), 1);
    assert!(current[0].content.contains("555-333-4444"));

    let superseded = rows.iter().find(|r| !r.is_current).unwrap();
    assert!(superseded.content.contains("555-111-2222"));
    assert_eq!(superseded.superseded_by, Some(second.id));
}

#[test]
fn value_signature_guard_blocks_negations() {
    let service = offline_service();

    let real = service
        .store(StoreRequest::new(
            "u1",
            Mode::general(),
            "my phone is 555-111-2222",
        ))
        .unwrap();

    // No digit signature: classified as nothing, supersedes nothing.
    let negation = service
        .store(StoreRequest::new("u1", Mode::general(), "I don't have a phone"))
        .unwrap();
    assert_eq!(negation.fingerprint, None);
    assert!(negation.superseded.is_empty());

    let phone = service.storage().get(real.id).unwrap().unwrap();
    assert!(phone.is_current);
    let inserted = service.storage().get(negation.id).unwrap().unwrap();
    assert_eq!(inserted.fact_fingerprint, None);
}

#[test]
fn store_without_supersession_never_demotes() {
    let service = offline_service();
    let first = service
        .store(StoreRequest::new(
            "u1",
            Mode::general(),
            "my phone is 555-111-2222",
        ))
        .unwrap();

    // Same fact kind, but the caller opted out of supersession.
    let second = service
        .store_without_supersession(StoreRequest::new(
            "u1",
            Mode::general(),
            "my phone is 555-333-4444",
        ))
        .unwrap();
    assert!(second.superseded.is_empty());
    assert_eq!(second.fingerprint, None);

    let original = service.storage().get(first.id).unwrap().unwrap();
    assert!(original.is_current);
}

#[test]
fn cross_user_isolation() {
    let service = offline_service();
    service
        .store(StoreRequest::new(
            "user-a",
            Mode::general(),
            "my favorite color is blue",
        ))
        .unwrap();
    service
        .store(StoreRequest::new(
            "user-b",
            Mode::general(),
            "my favorite color is red",
        ))
        .unwrap();

    let outcome = service
        .retrieve(
            "what is my favorite color?",
            service.retrieval_options("user-a", Mode::general()),
        )
        .unwrap();

    assert!(!outcome.memories.is_empty());
    assert!(outcome.memories.iter().all(|m| m.record.user_id == "user-a"));
    assert!(outcome.memories[0].record.content.contains("blue"));
    assert_eq!(outcome.telemetry.wrong_user_memories_filtered, 0);
}

#[test]
fn token_budget_window() {
    let service = offline_service();
    for i in 0..50 {
        service
            .store(
                StoreRequest::new(
                    "u1",
                    Mode::general(),
                    format!("notes about project alpha, item number {i}"),
                )
                .with_token_count(200),
            )
            .unwrap();
    }

    let options = service
        .retrieval_options("u1", Mode::general())
        .with_top_k(20)
        .with_token_budget(1000);
    let outcome = service
        .retrieve("notes about project alpha", options)
        .unwrap();

    assert!(outcome.memories.len() <= 5);
    assert!(outcome.telemetry.tokens_used <= 1000);
    let sum: i64 = outcome.memories.iter().map(|m| m.record.token_count).sum();
    assert!(sum <= 1000);
}

#[test]
fn explicit_recall_priority() {
    // Inline embedding fails, so the just-stored memory is bridged by
    // the lag fallback where the explicit-storage override applies.
    let service = service_with(Box::new(FlakyProvider::new(1)));

    let mut metadata = MemoryMetadata::default();
    metadata.explicit_storage_request = true;
    service
        .store(
            StoreRequest::new("u1", Mode::general(), "remember token ZEBRA-ANCHOR-123")
                .with_metadata(metadata),
        )
        .unwrap();

    let outcome = service
        .retrieve(
            "what did I tell you to remember?",
            service.retrieval_options("u1", Mode::general()),
        )
        .unwrap();

    assert!(!outcome.memories.is_empty());
    let top = &outcome.memories[0];
    assert!(top.record.content.contains("ZEBRA-ANCHOR-123"));
    assert!(top.similarity >= 0.95);
    assert!(outcome.telemetry.fallback_used);
}

#[test]
fn ordinal_disambiguation() {
    let service = offline_service();
    service
        .store(StoreRequest::new(
            "u1",
            Mode::general(),
            "my first access code is AAA-111",
        ))
        .unwrap();
    service
        .store(StoreRequest::new(
            "u1",
            Mode::general(),
            "my second access code is BBB-222",
        ))
        .unwrap();

    let outcome = service
        .retrieve(
            "what's my second code?",
            service.retrieval_options("u1", Mode::general()),
        )
        .unwrap();

    assert!(!outcome.memories.is_empty());
    assert!(outcome.memories[0].record.content.contains("BBB-222"));
    if let Some(other) = outcome
        .memories
        .iter()
        .find(|m| m.record.content.contains("AAA-111"))
    {
        assert!(outcome.memories[0].score > other.score);
    }
}

#[test]
fn safety_escalation_for_dining_queries() {
    let service = offline_service();
    service
        .store(
            StoreRequest::new(
                "u1",
                Mode::general(),
                "severe peanut allergy, carries an epipen",
            )
            .with_category("health_wellness"),
        )
        .unwrap();
    for i in 0..5 {
        service
            .store(StoreRequest::new(
                "u1",
                Mode::general(),
                format!("enjoys trying new restaurants, note {i}"),
            ))
            .unwrap();
    }

    let outcome = service
        .retrieve(
            "can I eat peanut dishes tonight?",
            service.retrieval_options("u1", Mode::general()),
        )
        .unwrap();

    assert!(outcome.telemetry.safety_critical_detected);
    assert!(outcome.telemetry.safety_memories_boosted >= 1);
    assert!(outcome
        .memories
        .iter()
        .any(|m| m.record.content.contains("peanut allergy")));
}

#[test]
fn mode_containment() {
    let service = offline_service();
    service
        .store(StoreRequest::new(
            "u1",
            Mode::new("business"),
            "quarterly revenue target is ambitious",
        ))
        .unwrap();
    service
        .store(StoreRequest::new(
            "u1",
            Mode::general(),
            "weekend plans include hiking",
        ))
        .unwrap();

    let outcome = service
        .retrieve(
            "quarterly revenue target",
            service.retrieval_options("u1", Mode::new("business")),
        )
        .unwrap();
    assert!(!outcome.memories.is_empty());
    assert!(outcome
        .memories
        .iter()
        .all(|m| m.record.mode.as_str() == "business"));

    // Vault mode reads across partitions of the same user.
    let outcome = service
        .retrieve(
            "quarterly revenue target",
            service.retrieval_options("u1", Mode::vault()),
        )
        .unwrap();
    assert!(outcome
        .memories
        .iter()
        .any(|m| m.record.mode.as_str() == "business"));
}

#[test]
fn unreachable_provider_degrades_to_pending_then_backfills() {
    // First call (inline) hits a connection failure; backfill's call
    // succeeds.
    let service = service_with(Box::new(FlakyProvider::new(1)));

    let receipt = service
        .store(StoreRequest::new("u1", Mode::general(), "I live in Lisbon"))
        .unwrap();
    assert_eq!(receipt.embedding_status, engram::EmbeddingStatus::Pending);

    let report = service.backfill(BackfillOptions::default()).unwrap();
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.remaining, 0);

    let row = service.storage().get(receipt.id).unwrap().unwrap();
    assert!(row.has_ready_embedding());
}

#[test]
fn store_then_immediate_retrieve_bridges_embedding_lag() {
    let service = service_with(Box::new(FlakyProvider::new(1)));
    service
        .store(StoreRequest::new(
            "u1",
            Mode::general(),
            "the garden project starts in April",
        ))
        .unwrap();

    let outcome = service
        .retrieve(
            "when does the garden project start?",
            service.retrieval_options("u1", Mode::general()),
        )
        .unwrap();

    assert!(!outcome.memories.is_empty());
    assert!(outcome.memories[0].record.content.contains("garden"));
    assert_eq!(
        outcome.telemetry.fallback_reason.as_deref(),
        Some("embedding_missing")
    );
}

#[test]
fn oversized_content_is_stored_and_embedded() {
    let service = offline_service();
    let long = "long fact ".repeat(1000);
    assert!(long.len() > 8000);
    let receipt = service
        .store(StoreRequest::new("u1", Mode::general(), long))
        .unwrap();
    assert_eq!(receipt.embedding_status, engram::EmbeddingStatus::Ready);
}

#[test]
fn concurrent_stores_of_one_fact_leave_one_current_row() {
    let service = Arc::new(offline_service());
    let mut handles = Vec::new();
    for i in 0..4 {
        let service = Arc::clone(&service);
        handles.push(std::thread::spawn(move || {
            service
                .store(StoreRequest::new(
                    "u1",
                    Mode::general(),
                    format!("my phone is 555-000-000{i}"),
                ))
                .unwrap();
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let rows = service
        .storage()
        .find_by_fingerprint("u1", "user_phone_number")
        .unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows.iter().filter(|r| r.is_current).count(), 1);
}

#[test]
fn adaptive_counters_update_off_the_request_path() {
    let service = offline_service();
    let receipt = service
        .store(StoreRequest::new(
            "u1",
            Mode::general(),
            "my favorite color is blue",
        ))
        .unwrap();

    let outcome = service
        .retrieve(
            "what is my favorite color?",
            service.retrieval_options("u1", Mode::general()),
        )
        .unwrap();
    assert!(!outcome.memories.is_empty());

    // The update is detached; poll briefly for it to land.
    let mut updated = false;
    for _ in 0..50 {
        let row = service.storage().get(receipt.id).unwrap().unwrap();
        if row.usage_frequency > 0 {
            updated = true;
            break;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    assert!(updated);
}

#[test]
fn telemetry_is_always_recorded() {
    let service = offline_service();
    // Empty store: early-exit path still records telemetry.
    service
        .retrieve(
            "anything at all",
            service.retrieval_options("u1", Mode::general()),
        )
        .unwrap();
    service
        .store(StoreRequest::new("u1", Mode::general(), "a fact to find"))
        .unwrap();
    service
        .retrieve(
            "a fact to find",
            service.retrieval_options("u1", Mode::general()),
        )
        .unwrap();

    let telemetry = service.telemetry();
    let log = telemetry.lock().unwrap();
    assert_eq!(log.count(), 2);
    assert!(log.entries().iter().all(|e| e.success));
    assert_eq!(log.isolation_violations(), 0);
}

#[test]
fn file_backed_storage_reads_through_the_read_pool() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memories.db");
    let config = EngramConfig::default();
    let storage = Arc::new(StorageEngine::open(&path).unwrap());
    let embeddings = Arc::new(EmbeddingClient::with_provider(
        config.embedding.clone(),
        Box::new(HashedEmbeddingProvider::new(EMBEDDING_DIMENSIONS)),
    ));
    let service = MemoryService::with_components(config, storage, embeddings, None);

    service
        .store(StoreRequest::new(
            "u1",
            Mode::general(),
            "my favorite color is blue",
        ))
        .unwrap();
    let outcome = service
        .retrieve(
            "what is my favorite color?",
            service.retrieval_options("u1", Mode::general()),
        )
        .unwrap();
    assert!(!outcome.memories.is_empty());
    assert!(outcome.memories[0].record.content.contains("blue"));
}

#[test]
fn blank_user_and_blank_query_are_rejected() {
    let service = offline_service();
    assert!(service
        .store(StoreRequest::new("  ", Mode::general(), "content"))
        .is_err());
    assert!(service
        .store(StoreRequest::new("u1", Mode::general(), "   "))
        .is_err());
    assert!(service
        .retrieve("  ", service.retrieval_options("u1", Mode::general()))
        .is_err());
    assert!(service
        .retrieve("query", service.retrieval_options("", Mode::general()))
        .is_err());
}
