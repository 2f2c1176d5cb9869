//! # engram-storage
//!
//! SQLite persistence for the memory store. Owns all writes, the
//! one-current-fact invariant, and the supersession transaction. Reads
//! go through a WAL read pool; writes serialize on a single writer
//! connection, which is what makes `BEGIN IMMEDIATE` an adequate stand-in
//! for row locking on the supersession path.

pub mod engine;
pub mod migrations;
pub mod pool;
pub mod queries;

pub use engine::StorageEngine;

use engram_core::errors::{EngramError, StorageError};

/// Wrap a low-level SQLite message into the workspace error type.
pub(crate) fn to_storage_err(message: impl Into<String>) -> EngramError {
    StorageError::Sqlite {
        message: message.into(),
    }
    .into()
}
