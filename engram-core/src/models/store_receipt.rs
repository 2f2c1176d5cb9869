use serde::{Deserialize, Serialize};

use crate::memory::EmbeddingStatus;

/// What a committed store produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreReceipt {
    /// Id of the inserted row.
    pub id: i64,
    /// Rows demoted to history by this insert, oldest first.
    pub superseded: Vec<i64>,
    /// Fingerprint recorded on the row, if any.
    pub fingerprint: Option<String>,
    /// Where the inline embed left the row.
    pub embedding_status: EmbeddingStatus,
}
