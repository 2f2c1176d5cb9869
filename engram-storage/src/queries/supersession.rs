//! The supersession transaction: demote every current row for the fact
//! across all of the user's modes, insert the replacement, back-fill the
//! `superseded_by` chain. One `BEGIN IMMEDIATE` transaction on the
//! writer; the partial unique index backstops the invariant if anything
//! races in from another process.

use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode};
use tracing::debug;

use engram_core::errors::{EngramResult, StorageError};
use engram_core::memory::EmbeddingStatus;
use engram_core::models::{MemoryDraft, StoreReceipt};

use super::memory_crud::{format_ts, insert_row};
use crate::to_storage_err;

/// One supersession attempt. The engine retries bounded conflicts.
pub fn insert_superseding(conn: &Connection, draft: &MemoryDraft) -> EngramResult<StoreReceipt> {
    let fingerprint = draft
        .fingerprint
        .fingerprint
        .as_deref()
        .ok_or_else(|| to_storage_err("supersession path requires a fingerprint".to_string()))?;

    conn.execute_batch("BEGIN IMMEDIATE")
        .map_err(|e| classify(e, draft, fingerprint))?;

    match run_transaction(conn, draft, fingerprint) {
        Ok(receipt) => {
            conn.execute_batch("COMMIT")
                .map_err(|e| classify(e, draft, fingerprint))?;
            Ok(receipt)
        }
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            Err(e)
        }
    }
}

fn run_transaction(
    conn: &Connection,
    draft: &MemoryDraft,
    fingerprint: &str,
) -> EngramResult<StoreReceipt> {
    // Step 1: the current rows for this fact, across all modes.
    // Partitioning is for retrieval, not for fact identity.
    let mut stmt = conn
        .prepare(
            "SELECT id FROM memories
             WHERE user_id = ?1 AND fact_fingerprint = ?2 AND is_current = 1
             ORDER BY id ASC",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let prior: Vec<i64> = stmt
        .query_map(params![draft.user_id, fingerprint], |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<Result<_, _>>()
        .map_err(|e| to_storage_err(e.to_string()))?;
    drop(stmt);

    // Step 2: demote them. `superseded_by` is back-filled after the
    // insert, once the replacement id exists.
    let now = format_ts(Utc::now());
    for id in &prior {
        conn.execute(
            "UPDATE memories SET is_current = 0, superseded_at = ?2 WHERE id = ?1",
            params![id, now],
        )
        .map_err(|e| classify(e, draft, fingerprint))?;
    }

    // Step 3: insert the replacement as the new current fact.
    let new_id =
        insert_row(conn, draft, true).map_err(|e| reclassify_engram(e, draft, fingerprint))?;

    // Step 4: chain history to the replacement.
    for id in &prior {
        conn.execute(
            "UPDATE memories SET superseded_by = ?2 WHERE id = ?1",
            params![id, new_id],
        )
        .map_err(|e| classify(e, draft, fingerprint))?;
    }

    debug!(
        user_id = %draft.user_id,
        fingerprint,
        new_id,
        superseded = prior.len(),
        "supersession committed"
    );

    Ok(StoreReceipt {
        id: new_id,
        superseded: prior,
        fingerprint: Some(fingerprint.to_string()),
        embedding_status: EmbeddingStatus::Pending,
    })
}

/// Map SQLite failures to the retry taxonomy: busy/locked becomes a
/// retryable conflict, a unique-index hit becomes the (normally
/// impossible) constraint violation, everything else stays a plain
/// storage error.
fn classify(
    e: rusqlite::Error,
    draft: &MemoryDraft,
    fingerprint: &str,
) -> engram_core::errors::EngramError {
    match &e {
        rusqlite::Error::SqliteFailure(ffi, _) => match ffi.code {
            ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
                StorageError::SupersessionConflict {
                    attempts: 1,
                    message: e.to_string(),
                }
                .into()
            }
            ErrorCode::ConstraintViolation => StorageError::ConstraintViolation {
                user_id: draft.user_id.clone(),
                fingerprint: fingerprint.to_string(),
            }
            .into(),
            _ => to_storage_err(e.to_string()),
        },
        _ => to_storage_err(e.to_string()),
    }
}

/// `insert_row` already wraps its errors; re-inspect the message for the
/// two cases the retry loop cares about.
fn reclassify_engram(
    e: engram_core::errors::EngramError,
    draft: &MemoryDraft,
    fingerprint: &str,
) -> engram_core::errors::EngramError {
    let message = e.to_string();
    if message.contains("UNIQUE constraint failed") {
        StorageError::ConstraintViolation {
            user_id: draft.user_id.clone(),
            fingerprint: fingerprint.to_string(),
        }
        .into()
    } else if message.contains("database is locked") || message.contains("database is busy") {
        StorageError::SupersessionConflict {
            attempts: 1,
            message,
        }
        .into()
    } else {
        e
    }
}

/// Whether an error should be retried by the engine's bounded loop.
pub fn is_retryable(e: &engram_core::errors::EngramError) -> bool {
    matches!(
        e,
        engram_core::errors::EngramError::Storage(
            StorageError::SupersessionConflict { .. } | StorageError::ConstraintViolation { .. }
        )
    )
}
