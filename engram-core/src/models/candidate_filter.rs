use serde::{Deserialize, Serialize};

use crate::memory::Mode;

/// Prefilter specification handed to the storage engine by retrieval.
///
/// `user_id` always constrains first; the rest narrow the scan. Mode
/// handling: vault mode reads everything its user owns; otherwise the
/// request mode applies strictly, optionally widened to also include the
/// general partition when cross-mode is permitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateFilter {
    pub user_id: String,
    pub mode: Mode,
    /// Widen a strict mode filter to also include `truth-general`.
    pub allow_cross_mode: bool,
    /// Drop the mode filter entirely (vault behavior, explicit override).
    pub include_all_modes: bool,
    /// Optional category narrowing; `None` means all categories.
    pub categories: Option<Vec<String>>,
    /// Require a ready embedding (the semantic path). The lag
    /// augmentation query runs with this false.
    pub require_embedding: bool,
    /// Exclude superseded history rows.
    pub only_current: bool,
    /// Fetch cap.
    pub max_candidates: usize,
}

impl CandidateFilter {
    /// The standard semantic-retrieval prefilter.
    pub fn semantic(user_id: impl Into<String>, mode: Mode, max_candidates: usize) -> Self {
        Self {
            user_id: user_id.into(),
            mode,
            allow_cross_mode: false,
            include_all_modes: false,
            categories: None,
            require_embedding: true,
            only_current: true,
            max_candidates,
        }
    }

    pub fn with_categories(mut self, categories: Option<Vec<String>>) -> Self {
        self.categories = categories;
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
}
