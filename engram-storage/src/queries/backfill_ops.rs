//! Row claims for the backfill worker. The `processing` marker is the
//! claim: a second worker's selection skips it, and a sweeper reclaims
//! rows whose worker died mid-call.

use chrono::{Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use engram_core::errors::EngramResult;
use engram_core::memory::{EmbeddingStatus, MemoryRecord};
use engram_core::models::BackfillOptions;

use super::memory_crud::{format_ts, get_memory};
use crate::to_storage_err;

fn status_placeholders(options: &BackfillOptions) -> (String, Vec<rusqlite::types::Value>) {
    let placeholders = vec!["?"; options.status_filter.len().max(1)].join(", ");
    let values = if options.status_filter.is_empty() {
        vec![rusqlite::types::Value::Text(
            EmbeddingStatus::Pending.as_str().to_string(),
        )]
    } else {
        options
            .status_filter
            .iter()
            .map(|s| rusqlite::types::Value::Text(s.as_str().to_string()))
            .collect()
    };
    (placeholders, values)
}

/// Atomically select the newest eligible row and mark it `processing`.
/// The claim timestamp rides on `embedding_updated_at` so the sweeper
/// can age it.
pub fn claim_next(conn: &Connection, options: &BackfillOptions) -> EngramResult<Option<MemoryRecord>> {
    let (placeholders, mut values) = status_placeholders(options);

    conn.execute_batch("BEGIN IMMEDIATE")
        .map_err(|e| to_storage_err(e.to_string()))?;

    let claim = (|| -> EngramResult<Option<i64>> {
        let sql = format!(
            "SELECT id FROM memories
             WHERE embedding IS NULL
               AND embedding_status IN ({placeholders})
               AND content IS NOT NULL
             ORDER BY created_at DESC
             LIMIT 1"
        );
        let id: Option<i64> = conn
            .query_row(&sql, rusqlite::params_from_iter(values.drain(..)), |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| to_storage_err(e.to_string()))?;

        if let Some(id) = id {
            conn.execute(
                "UPDATE memories SET embedding_status = ?2, embedding_updated_at = ?3 WHERE id = ?1",
                params![
                    id,
                    EmbeddingStatus::Processing.as_str(),
                    format_ts(Utc::now())
                ],
            )
            .map_err(|e| to_storage_err(e.to_string()))?;
        }
        Ok(id)
    })();

    match claim {
        Ok(id) => {
            conn.execute_batch("COMMIT")
                .map_err(|e| to_storage_err(e.to_string()))?;
            match id {
                Some(id) => get_memory(conn, id),
                None => Ok(None),
            }
        }
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            Err(e)
        }
    }
}

/// Eligible rows still waiting.
pub fn count_eligible(conn: &Connection, options: &BackfillOptions) -> EngramResult<u64> {
    let (placeholders, values) = status_placeholders(options);
    let sql = format!(
        "SELECT COUNT(*) FROM memories
         WHERE embedding IS NULL
           AND embedding_status IN ({placeholders})
           AND content IS NOT NULL"
    );
    conn.query_row(&sql, rusqlite::params_from_iter(values), |row| {
        row.get::<_, i64>(0)
    })
    .map(|n| n as u64)
    .map_err(|e| to_storage_err(e.to_string()))
}

/// Reset rows stuck in `processing` longer than the given age back to
/// `pending`. Returns how many were reclaimed.
pub fn reclaim_stuck(conn: &Connection, older_than_secs: u64) -> EngramResult<usize> {
    let cutoff = format_ts(Utc::now() - Duration::seconds(older_than_secs as i64));
    conn.execute(
        "UPDATE memories SET embedding_status = ?1
         WHERE embedding_status = ?2
           AND (embedding_updated_at IS NULL OR embedding_updated_at < ?3)",
        params![
            EmbeddingStatus::Pending.as_str(),
            EmbeddingStatus::Processing.as_str(),
            cutoff
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))
}
