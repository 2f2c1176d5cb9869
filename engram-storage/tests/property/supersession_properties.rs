//! Supersession history is lossless: after storing N values of one
//! fact in sequence, every row survives, exactly one is current, and
//! `superseded_by` chains them in insertion order.

use engram_core::memory::Mode;
use engram_core::models::{FingerprintDecision, FingerprintMethod, MemoryDraft};
use engram_core::traits::IMemoryStore;
use engram_storage::StorageEngine;
use proptest::prelude::*;

fn fact_draft(content: &str) -> MemoryDraft {
    MemoryDraft::new("prop-user", Mode::general(), content)
        .with_token_count(8)
        .with_fingerprint(FingerprintDecision {
            fingerprint: Some("user_residence".to_string()),
            confidence: 0.9,
            method: FingerprintMethod::Deterministic,
            value_signature: true,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn history_is_lossless_and_exclusive(values in prop::collection::vec("[a-z ]{5,40}", 1..8)) {
        let engine = StorageEngine::open_in_memory().unwrap();
        let mut ids = Vec::new();
        for value in &values {
            let receipt = engine
                .insert_superseding(&fact_draft(&format!("I live in {value}")))
                .unwrap();
            ids.push(receipt.id);
        }

        let rows = engine.find_by_fingerprint("prop-user", "user_residence").unwrap();
        prop_assert_eq!(rows.len(), values.len());

        let current: Vec<_> = rows.iter().filter(|r| r.is_current).collect();
        prop_assert_eq!(current.len(), 1);
        prop_assert_eq!(current[0].id, *ids.last().unwrap());

        // Each superseded row points at its direct replacement.
        for window in ids.windows(2) {
            let older = rows.iter().find(|r| r.id == window[0]).unwrap();
            prop_assert_eq!(older.superseded_by, Some(window[1]));
            prop_assert!(!older.is_current);
            prop_assert!(older.superseded_at.is_some());
        }
    }
}
