use engram_core::memory::{MemoryMetadata, Mode};

/// One conversational fact to store, as the orchestrator sees it. The
/// service classifies it, counts its tokens, and decides the
/// supersession path.
#[derive(Debug, Clone)]
pub struct StoreRequest {
    pub user_id: String,
    pub mode: Mode,
    pub content: String,
    pub category: Option<String>,
    /// Caller-supplied token count; estimated when absent.
    pub token_count: Option<i64>,
    pub metadata: Option<MemoryMetadata>,
}

impl StoreRequest {
    pub fn new(user_id: impl Into<String>, mode: Mode, content: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            mode,
            content: content.into(),
            category: None,
            token_count: None,
            metadata: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_token_count(mut self, tokens: i64) -> Self {
        self.token_count = Some(tokens);
        self
    }

    pub fn with_metadata(mut self, metadata: MemoryMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
