//! Per-user adaptive priority centroid: a running mean of the
//! embeddings the user has engaged with.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use engram_core::errors::EngramResult;

use super::memory_crud::format_ts;
use super::vector_codec::{bytes_to_f32_vec, f32_vec_to_bytes};
use crate::to_storage_err;

pub fn load(conn: &Connection, user_id: &str) -> EngramResult<Option<Vec<f32>>> {
    let row: Option<(Vec<u8>, i64)> = conn
        .query_row(
            "SELECT embedding, dimensions FROM user_centroids WHERE user_id = ?1",
            params![user_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    Ok(row.and_then(|(blob, dims)| bytes_to_f32_vec(&blob, dims as usize)))
}

/// Fold new engaged-memory vectors into the running mean.
pub fn update(conn: &Connection, user_id: &str, vectors: &[Vec<f32>]) -> EngramResult<()> {
    if vectors.is_empty() {
        return Ok(());
    }
    let dims = vectors[0].len();
    if vectors.iter().any(|v| v.len() != dims) {
        return Err(to_storage_err("centroid update with mixed dimensions".to_string()));
    }

    let existing: Option<(Vec<u8>, i64, i64)> = conn
        .query_row(
            "SELECT embedding, dimensions, engaged_count FROM user_centroids WHERE user_id = ?1",
            params![user_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    let (mut mean, mut count) = match existing {
        Some((blob, stored_dims, engaged)) if stored_dims as usize == dims => {
            match bytes_to_f32_vec(&blob, dims) {
                Some(vec) => (vec, engaged.max(0) as u64),
                None => (vec![0.0; dims], 0),
            }
        }
        _ => (vec![0.0; dims], 0),
    };

    for vector in vectors {
        count += 1;
        let k = 1.0 / count as f32;
        for (m, v) in mean.iter_mut().zip(vector) {
            *m += (v - *m) * k;
        }
    }

    conn.execute(
        "INSERT INTO user_centroids (user_id, embedding, dimensions, engaged_count, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(user_id) DO UPDATE SET
            embedding = excluded.embedding,
            dimensions = excluded.dimensions,
            engaged_count = excluded.engaged_count,
            updated_at = excluded.updated_at",
        params![
            user_id,
            f32_vec_to_bytes(&mean),
            dims as i64,
            count as i64,
            format_ts(Utc::now())
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
