//! Insert, fetch, embedding transitions, and access-counter updates.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use engram_core::constants::EMBEDDING_DIMENSIONS;
use engram_core::errors::{EmbeddingError, EngramResult};
use engram_core::memory::{EmbeddingStatus, MemoryMetadata, MemoryRecord, Mode};
use engram_core::models::MemoryDraft;

use super::vector_codec::bytes_to_f32_vec;
use crate::to_storage_err;

/// The full column list, in `row_to_memory` order.
pub const MEMORY_COLUMNS: &str = "id, user_id, mode, category, content, token_count, \
     embedding, embedding_dimensions, embedding_status, embedding_model, embedding_updated_at, \
     fact_fingerprint, fingerprint_confidence, is_current, superseded_by, superseded_at, \
     relevance_score, usage_frequency, last_accessed, created_at, metadata";

/// Relevance bump applied per retrieval hit, capped at 1.0.
const RELEVANCE_INCREMENT: f64 = 0.02;

/// Format a timestamp the way every TEXT column stores it. Uniform
/// formatting keeps the columns lexicographically comparable.
pub fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_ts(s: &str) -> EngramResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| to_storage_err(format!("parse timestamp '{s}': {e}")))
}

/// Insert a new current row. `record_fingerprint` is only true on the
/// supersession path, where prior currents have already been demoted;
/// writing the fingerprint column anywhere else could trip the partial
/// unique index.
pub fn insert_row(
    conn: &Connection,
    draft: &MemoryDraft,
    record_fingerprint: bool,
) -> EngramResult<i64> {
    let now = format_ts(Utc::now());
    let (fingerprint, confidence) = if record_fingerprint {
        (
            draft.fingerprint.fingerprint.as_deref(),
            Some(draft.fingerprint.confidence),
        )
    } else {
        (None, None)
    };

    conn.execute(
        "INSERT INTO memories (
            user_id, mode, category, content, token_count,
            embedding_status, fact_fingerprint, fingerprint_confidence,
            is_current, relevance_score, usage_frequency, created_at, metadata
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, 0.5, 0, ?9, ?10)",
        params![
            draft.user_id,
            draft.mode.as_str(),
            draft.category,
            draft.content,
            draft.token_count,
            EmbeddingStatus::Pending.as_str(),
            fingerprint,
            confidence,
            now,
            draft.metadata.to_json(),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    Ok(conn.last_insert_rowid())
}

/// Get a single memory by id.
pub fn get_memory(conn: &Connection, id: i64) -> EngramResult<Option<MemoryRecord>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {MEMORY_COLUMNS} FROM memories WHERE id = ?1"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let result = stmt
        .query_row(params![id], |row| Ok(row_to_memory(row)))
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    match result {
        Some(Ok(memory)) => Ok(Some(memory)),
        Some(Err(e)) => Err(e),
        None => Ok(None),
    }
}

/// All rows (current and history) for one fact of one user, oldest
/// first, so `superseded_by` chains read in insertion order.
pub fn find_by_fingerprint(
    conn: &Connection,
    user_id: &str,
    fingerprint: &str,
) -> EngramResult<Vec<MemoryRecord>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {MEMORY_COLUMNS} FROM memories
             WHERE user_id = ?1 AND fact_fingerprint = ?2
             ORDER BY created_at ASC, id ASC"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map(params![user_id, fingerprint], |row| Ok(row_to_memory(row)))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row.map_err(|e| to_storage_err(e.to_string()))??);
    }
    Ok(results)
}

/// Transition a row's embedding lifecycle. A `Ready` transition stores
/// the vector; a failure message lands in row metadata with its
/// timestamp.
pub fn mark_embedding(
    conn: &Connection,
    id: i64,
    status: EmbeddingStatus,
    vector: Option<&[f32]>,
    model: Option<&str>,
    error: Option<&str>,
) -> EngramResult<()> {
    let now = Utc::now();
    let now_str = format_ts(now);

    if status == EmbeddingStatus::Ready {
        let vector = vector.ok_or(EmbeddingError::DimensionMismatch {
            expected: EMBEDDING_DIMENSIONS,
            actual: 0,
        })?;
        if vector.len() != EMBEDDING_DIMENSIONS {
            return Err(EmbeddingError::DimensionMismatch {
                expected: EMBEDDING_DIMENSIONS,
                actual: vector.len(),
            }
            .into());
        }
        let blob = super::vector_codec::f32_vec_to_bytes(vector);
        let rows = conn
            .execute(
                "UPDATE memories SET
                    embedding = ?2, embedding_dimensions = ?3,
                    embedding_status = ?4, embedding_model = ?5,
                    embedding_updated_at = ?6
                 WHERE id = ?1",
                params![
                    id,
                    blob,
                    vector.len() as i64,
                    status.as_str(),
                    model,
                    now_str
                ],
            )
            .map_err(|e| to_storage_err(e.to_string()))?;
        return row_was_found(rows, id);
    }

    let rows = conn
        .execute(
            "UPDATE memories SET embedding_status = ?2, embedding_updated_at = ?3 WHERE id = ?1",
            params![id, status.as_str(), now_str],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    row_was_found(rows, id)?;

    if let Some(message) = error {
        let raw: Option<String> = conn
            .query_row("SELECT metadata FROM memories WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| to_storage_err(e.to_string()))?
            .flatten();
        let mut metadata = MemoryMetadata::from_json(raw.as_deref());
        metadata.embedding_error = Some(message.to_string());
        metadata.error_time = Some(now);
        conn.execute(
            "UPDATE memories SET metadata = ?2 WHERE id = ?1",
            params![id, metadata.to_json()],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    }

    Ok(())
}

fn row_was_found(rows: usize, id: i64) -> EngramResult<()> {
    if rows == 0 {
        Err(engram_core::errors::StorageError::RowNotFound { id }.into())
    } else {
        Ok(())
    }
}

/// Best-effort adaptive counters for returned rows. Increments only,
/// relevance capped at 1.0.
pub fn record_access(conn: &Connection, ids: &[i64]) -> EngramResult<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let now = format_ts(Utc::now());
    let placeholders = (0..ids.len())
        .map(|i| format!("?{}", i + 3))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE memories SET
            usage_frequency = usage_frequency + 1,
            relevance_score = MIN(1.0, relevance_score + ?1),
            last_accessed = ?2
         WHERE id IN ({placeholders})"
    );
    let mut values: Vec<rusqlite::types::Value> = Vec::with_capacity(ids.len() + 2);
    values.push(RELEVANCE_INCREMENT.into());
    values.push(now.into());
    for id in ids {
        values.push((*id).into());
    }
    conn.execute(&sql, rusqlite::params_from_iter(values))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Parse a full-column row into a MemoryRecord.
pub fn row_to_memory(row: &rusqlite::Row<'_>) -> EngramResult<MemoryRecord> {
    let mode_str: String = row.get(2).map_err(|e| to_storage_err(e.to_string()))?;
    let status_str: String = row.get(8).map_err(|e| to_storage_err(e.to_string()))?;
    let embedding_status = EmbeddingStatus::parse(&status_str)
        .ok_or_else(|| to_storage_err(format!("unknown embedding_status '{status_str}'")))?;

    let embedding_blob: Option<Vec<u8>> = row.get(6).map_err(|e| to_storage_err(e.to_string()))?;
    let dimensions: Option<i64> = row.get(7).map_err(|e| to_storage_err(e.to_string()))?;
    // An undecodable blob yields None; retrieval treats a Ready row
    // without a vector as an unparseable-embedding anomaly.
    let embedding = embedding_blob.as_deref().and_then(|blob| {
        let dims = dimensions.map(|d| d as usize).unwrap_or(EMBEDDING_DIMENSIONS);
        bytes_to_f32_vec(blob, dims)
    });

    let embedding_updated_at: Option<String> =
        row.get(10).map_err(|e| to_storage_err(e.to_string()))?;
    let superseded_at: Option<String> = row.get(15).map_err(|e| to_storage_err(e.to_string()))?;
    let last_accessed: Option<String> = row.get(18).map_err(|e| to_storage_err(e.to_string()))?;
    let created_at: String = row.get(19).map_err(|e| to_storage_err(e.to_string()))?;
    let metadata_raw: Option<String> = row.get(20).map_err(|e| to_storage_err(e.to_string()))?;

    Ok(MemoryRecord {
        id: row.get(0).map_err(|e| to_storage_err(e.to_string()))?,
        user_id: row.get(1).map_err(|e| to_storage_err(e.to_string()))?,
        mode: Mode::new(mode_str),
        category: row.get(3).map_err(|e| to_storage_err(e.to_string()))?,
        content: row.get(4).map_err(|e| to_storage_err(e.to_string()))?,
        token_count: row.get(5).map_err(|e| to_storage_err(e.to_string()))?,
        embedding,
        embedding_status,
        embedding_model: row.get(9).map_err(|e| to_storage_err(e.to_string()))?,
        embedding_updated_at: embedding_updated_at.as_deref().map(parse_ts).transpose()?,
        fact_fingerprint: row.get(11).map_err(|e| to_storage_err(e.to_string()))?,
        fingerprint_confidence: row.get(12).map_err(|e| to_storage_err(e.to_string()))?,
        is_current: row
            .get::<_, i64>(13)
            .map_err(|e| to_storage_err(e.to_string()))?
            != 0,
        superseded_by: row.get(14).map_err(|e| to_storage_err(e.to_string()))?,
        superseded_at: superseded_at.as_deref().map(parse_ts).transpose()?,
        relevance_score: row.get(16).map_err(|e| to_storage_err(e.to_string()))?,
        usage_frequency: row.get(17).map_err(|e| to_storage_err(e.to_string()))?,
        last_accessed: last_accessed.as_deref().map(parse_ts).transpose()?,
        created_at: parse_ts(&created_at)?,
        metadata: MemoryMetadata::from_json(metadata_raw.as_deref()),
    })
}
