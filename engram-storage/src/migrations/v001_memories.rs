//! v001: the memories table and its indexes.

use rusqlite::Connection;

use engram_core::errors::EngramResult;

use crate::to_storage_err;

pub fn up(conn: &Connection) -> EngramResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS memories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            mode TEXT NOT NULL DEFAULT 'truth-general',
            category TEXT,
            content TEXT NOT NULL,
            token_count INTEGER NOT NULL DEFAULT 0,
            embedding BLOB,
            embedding_dimensions INTEGER,
            embedding_status TEXT NOT NULL DEFAULT 'pending',
            embedding_model TEXT,
            embedding_updated_at TEXT,
            fact_fingerprint TEXT,
            fingerprint_confidence REAL,
            is_current INTEGER NOT NULL DEFAULT 1,
            superseded_by INTEGER REFERENCES memories(id),
            superseded_at TEXT,
            relevance_score REAL NOT NULL DEFAULT 0.5,
            usage_frequency INTEGER NOT NULL DEFAULT 0,
            last_accessed TEXT,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            metadata TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_memories_user_category
            ON memories (user_id, category);

        -- The linchpin of the one-current-fact invariant: even if two
        -- supersessions race, the loser's commit fails here.
        CREATE UNIQUE INDEX IF NOT EXISTS idx_memories_current_fact
            ON memories (user_id, fact_fingerprint)
            WHERE is_current = 1 AND fact_fingerprint IS NOT NULL;

        CREATE INDEX IF NOT EXISTS idx_memories_user_mode_current
            ON memories (user_id, mode, is_current);

        CREATE INDEX IF NOT EXISTS idx_memories_unembedded
            ON memories (embedding_status, created_at)
            WHERE embedding IS NULL;
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))
}
