use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured metadata carried on every memory row, serialized as the
/// JSON `metadata` column. Known fields are typed; anything else rides
/// in `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryMetadata {
    /// Set when the user explicitly asked for this to be remembered
    /// ("remember that ..."). Drives the explicit-recall boost.
    #[serde(default, skip_serializing_if = "is_false")]
    pub explicit_storage_request: bool,

    /// High-entropy anchor tokens extracted at store time (codes,
    /// identifiers) for the text-match fallback.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anchors: Vec<String>,

    /// Ordinal word present in the original content, if any
    /// ("first", "second", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordinal: Option<String>,

    /// Verbatim user phrase the memory was distilled from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_phrase: Option<String>,

    /// Last embedding failure message, written on `failed` status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_error: Option<String>,

    /// When the embedding failure was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_time: Option<DateTime<Utc>>,

    /// Opaque fields preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl MemoryMetadata {
    /// Parse from the JSON column; a NULL or unparseable column yields
    /// the default (empty) metadata.
    pub fn from_json(raw: Option<&str>) -> Self {
        raw.and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or_default()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
