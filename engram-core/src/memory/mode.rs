use std::fmt;

use serde::{Deserialize, Serialize};

/// Partition tag for a user's memories. Partitioning affects retrieval
/// visibility, not fact identity: supersession crosses modes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mode(String);

impl Mode {
    /// Default partition.
    pub const GENERAL: &'static str = "truth-general";
    /// Vault partition; reads across all of its user's modes.
    pub const VAULT: &'static str = "site-monkeys";

    pub fn new(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            Self::general()
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn general() -> Self {
        Self(Self::GENERAL.to_string())
    }

    pub fn vault() -> Self {
        Self(Self::VAULT.to_string())
    }

    /// Vault mode reads across every partition of its user.
    pub fn is_vault(&self) -> bool {
        self.0 == Self::VAULT
    }

    pub fn is_general(&self) -> bool {
        self.0 == Self::GENERAL
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Mode {
    fn default() -> Self {
        Self::general()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Mode {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}
