//! Numbered schema migrations tracked via `PRAGMA user_version`.

mod v001_memories;
mod v002_user_centroids;

use rusqlite::Connection;
use tracing::info;

use engram_core::errors::{EngramResult, StorageError};

/// Current schema version.
const LATEST_VERSION: u32 = 2;

/// Run all pending migrations. Idempotent.
pub fn run_migrations(conn: &Connection) -> EngramResult<()> {
    let mut version = current_version(conn)?;
    while version < LATEST_VERSION {
        let next = version + 1;
        apply(conn, next).map_err(|e| StorageError::MigrationFailed {
            version: next,
            reason: e.to_string(),
        })?;
        set_version(conn, next)?;
        info!(from = version, to = next, "applied schema migration");
        version = next;
    }
    Ok(())
}

fn apply(conn: &Connection, version: u32) -> EngramResult<()> {
    match version {
        1 => v001_memories::up(conn),
        2 => v002_user_centroids::up(conn),
        other => Err(StorageError::MigrationFailed {
            version: other,
            reason: "unknown migration version".to_string(),
        }
        .into()),
    }
}

fn current_version(conn: &Connection) -> EngramResult<u32> {
    conn.pragma_query_value(None, "user_version", |row| row.get::<_, i64>(0))
        .map(|v| v as u32)
        .map_err(|e| crate::to_storage_err(e.to_string()))
}

fn set_version(conn: &Connection, version: u32) -> EngramResult<()> {
    conn.pragma_update(None, "user_version", version as i64)
        .map_err(|e| crate::to_storage_err(e.to_string()))
}
