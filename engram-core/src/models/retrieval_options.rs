use serde::{Deserialize, Serialize};

use crate::errors::{EngramError, EngramResult};
use crate::memory::Mode;

/// Immutable per-request retrieval options. Constructed once, validated
/// once; every pipeline stage reads from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalOptions {
    pub user_id: String,
    pub mode: Mode,
    /// Result count ceiling.
    pub top_k: usize,
    /// Hard ceiling on the summed token_count of returned memories.
    pub token_budget: usize,
    /// Optional category narrowing. Safety-domain detection may widen
    /// this; it never narrows a `None` (all-categories) request.
    pub categories: Option<Vec<String>>,
    /// Also read `truth-general` rows in a non-vault mode.
    pub allow_cross_mode: bool,
    /// Read every mode of the user (vault-style override).
    pub include_all_modes: bool,
}

impl RetrievalOptions {
    pub fn new(user_id: impl Into<String>, mode: Mode) -> Self {
        Self {
            user_id: user_id.into(),
            mode,
            top_k: 10,
            token_budget: 2_000,
            categories: None,
            allow_cross_mode: false,
            include_all_modes: false,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_token_budget(mut self, budget: usize) -> Self {
        self.token_budget = budget;
        self
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = Some(categories);
        self
    }

    pub fn with_cross_mode(mut self, allow: bool) -> Self {
        self.allow_cross_mode = allow;
        self
    }

    pub fn with_all_modes(mut self, include: bool) -> Self {
        self.include_all_modes = include;
        self
    }

    /// Reject unidentifiable tenants up front. A blank user id would
    /// otherwise turn the prefilter into a cross-user scan.
    pub fn validate(&self) -> EngramResult<()> {
        if self.user_id.trim().is_empty() {
            return Err(EngramError::invalid_input(
                "user_id must be a non-empty string",
            ));
        }
        Ok(())
    }
}
