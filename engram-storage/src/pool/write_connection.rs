//! The single write connection. Every mutation (inserts, supersession
//! transactions, embedding status changes) serializes here.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use engram_core::errors::{EngramResult, StorageError};

use super::pragmas::apply_pragmas;
use crate::to_storage_err;

pub struct WriteConnection {
    conn: Mutex<Connection>,
}

impl WriteConnection {
    pub fn open(path: &Path) -> EngramResult<Self> {
        let conn = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> EngramResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Execute a closure holding the writer. The mutex makes write
    /// transactions strictly sequential per process.
    pub fn with_conn_sync<F, T>(&self, f: F) -> EngramResult<T>
    where
        F: FnOnce(&Connection) -> EngramResult<T>,
    {
        let guard = self.conn.lock().map_err(|e| {
            engram_core::errors::EngramError::from(StorageError::PoolPoisoned {
                message: e.to_string(),
            })
        })?;
        f(&guard)
    }
}
