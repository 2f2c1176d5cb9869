use serde::{Deserialize, Serialize};

use crate::memory::{MemoryMetadata, Mode};

use super::FingerprintDecision;

/// A fully-resolved memory ready for insertion: content classified,
/// tokens counted. The storage engine consumes this and nothing else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryDraft {
    pub user_id: String,
    pub mode: Mode,
    pub category: Option<String>,
    pub content: String,
    pub token_count: i64,
    pub fingerprint: FingerprintDecision,
    pub metadata: MemoryMetadata,
}

impl MemoryDraft {
    pub fn new(user_id: impl Into<String>, mode: Mode, content: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            mode,
            category: None,
            content: content.into(),
            token_count: 0,
            fingerprint: FingerprintDecision::none(),
            metadata: MemoryMetadata::default(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_fingerprint(mut self, decision: FingerprintDecision) -> Self {
        self.fingerprint = decision;
        self
    }

    pub fn with_metadata(mut self, metadata: MemoryMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_token_count(mut self, tokens: i64) -> Self {
        self.token_count = tokens;
        self
    }
}
