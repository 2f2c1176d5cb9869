/// Storage-layer errors for SQLite operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    Sqlite { message: String },

    #[error("migration failed at version {version}: {reason}")]
    MigrationFailed { version: u32, reason: String },

    /// Writer contention on the supersession path. Retried internally
    /// with backoff; surfaces only after the retry budget is spent.
    #[error("supersession conflict after {attempts} attempts: {message}")]
    SupersessionConflict { attempts: u32, message: String },

    /// A second current row for the same (user, fingerprint) hit the
    /// partial unique index. Normally impossible; indicates a
    /// classifier or retry bug. Rolled back, reported.
    #[error("duplicate current fact for user {user_id}, fingerprint {fingerprint}")]
    ConstraintViolation {
        user_id: String,
        fingerprint: String,
    },

    #[error("memory row {id} not found")]
    RowNotFound { id: i64 },

    #[error("connection pool lock poisoned: {message}")]
    PoolPoisoned { message: String },
}
