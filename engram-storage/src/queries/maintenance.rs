//! Idempotent maintenance: (re)create the one-current-fact constraint
//! and repair any duplicate current rows it would reject.

use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::warn;

use engram_core::errors::EngramResult;
use engram_core::models::{CleanupReport, ConstraintReport};

use super::memory_crud::format_ts;
use crate::to_storage_err;

/// Create the partial unique index if it is missing. Fails gracefully
/// when duplicates exist; run the cleanup first in that case.
pub fn create_supersession_constraint(conn: &Connection) -> EngramResult<ConstraintReport> {
    let result = conn.execute_batch(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_memories_current_fact
            ON memories (user_id, fact_fingerprint)
            WHERE is_current = 1 AND fact_fingerprint IS NOT NULL",
    );
    match result {
        Ok(()) => Ok(ConstraintReport {
            ok: true,
            message: "one-current-fact constraint present".to_string(),
        }),
        Err(e) => {
            warn!(error = %e, "constraint creation failed, duplicates likely present");
            Ok(ConstraintReport {
                ok: false,
                message: e.to_string(),
            })
        }
    }
}

/// Demote all but the newest current row within each duplicated
/// (user, fingerprint) group, chaining them to the keeper.
pub fn cleanup_duplicate_current_facts(conn: &Connection) -> EngramResult<CleanupReport> {
    let mut stmt = conn
        .prepare(
            "SELECT user_id, fact_fingerprint FROM memories
             WHERE is_current = 1 AND fact_fingerprint IS NOT NULL
             GROUP BY user_id, fact_fingerprint
             HAVING COUNT(*) > 1",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let groups: Vec<(String, String)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<Result<_, _>>()
        .map_err(|e| to_storage_err(e.to_string()))?;
    drop(stmt);

    let now = format_ts(Utc::now());
    let mut cleaned = 0;
    for (user_id, fingerprint) in groups {
        let keeper: i64 = conn
            .query_row(
                "SELECT id FROM memories
                 WHERE user_id = ?1 AND fact_fingerprint = ?2 AND is_current = 1
                 ORDER BY created_at DESC, id DESC LIMIT 1",
                params![user_id, fingerprint],
                |row| row.get(0),
            )
            .map_err(|e| to_storage_err(e.to_string()))?;

        cleaned += conn
            .execute(
                "UPDATE memories SET is_current = 0, superseded_at = ?3, superseded_by = ?4
                 WHERE user_id = ?1 AND fact_fingerprint = ?2 AND is_current = 1 AND id != ?4",
                params![user_id, fingerprint, now, keeper],
            )
            .map_err(|e| to_storage_err(e.to_string()))?;
    }

    Ok(CleanupReport { cleaned })
}
