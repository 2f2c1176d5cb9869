//! StorageEngine — owns the ConnectionPool, implements IMemoryStore,
//! startup migrations, bounded supersession retries.

use std::path::Path;
use std::time::Duration;

use tracing::warn;

use engram_core::config::SupersessionConfig;
use engram_core::errors::EngramResult;
use engram_core::memory::{EmbeddingStatus, MemoryRecord};
use engram_core::models::{
    BackfillOptions, CandidateFilter, CleanupReport, ConstraintReport, MemoryDraft, StoreReceipt,
};
use engram_core::traits::IMemoryStore;

use crate::migrations;
use crate::pool::ConnectionPool;
use crate::queries;

/// The main storage engine. Owns the connection pool and provides the
/// full IMemoryStore interface.
pub struct StorageEngine {
    pool: ConnectionPool,
    /// When true, use the read pool for read operations (file-backed
    /// mode). When false, route all reads through the writer (in-memory
    /// mode, because in-memory read pool connections are isolated
    /// databases).
    use_read_pool: bool,
    supersession: SupersessionConfig,
}

impl StorageEngine {
    /// Open a storage engine backed by a file on disk.
    pub fn open(path: &Path) -> EngramResult<Self> {
        Self::open_with(path, SupersessionConfig::default())
    }

    /// Open with explicit supersession tuning.
    pub fn open_with(path: &Path, supersession: SupersessionConfig) -> EngramResult<Self> {
        let pool = ConnectionPool::open(path, 4)?;
        let engine = Self {
            pool,
            use_read_pool: true,
            supersession,
        };
        engine.initialize()?;
        Ok(engine)
    }

    /// Open an in-memory storage engine (for testing). Routes all reads
    /// through the writer since in-memory read pool connections are
    /// isolated databases that can't see the writer's changes.
    pub fn open_in_memory() -> EngramResult<Self> {
        let pool = ConnectionPool::open_in_memory(1)?;
        let engine = Self {
            pool,
            use_read_pool: false,
            supersession: SupersessionConfig::default(),
        };
        engine.initialize()?;
        Ok(engine)
    }

    /// Run migrations on startup.
    fn initialize(&self) -> EngramResult<()> {
        self.pool
            .writer
            .with_conn_sync(|conn| migrations::run_migrations(conn))
    }

    /// Get a reference to the connection pool (for advanced operations).
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Execute a read-only query on the best available connection.
    fn with_reader<F, T>(&self, f: F) -> EngramResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> EngramResult<T>,
    {
        if self.use_read_pool {
            self.pool.readers.with_conn(f)
        } else {
            self.pool.writer.with_conn_sync(f)
        }
    }
}

impl IMemoryStore for StorageEngine {
    fn insert(&self, draft: &MemoryDraft) -> EngramResult<StoreReceipt> {
        self.pool.writer.with_conn_sync(|conn| {
            let id = queries::memory_crud::insert_row(conn, draft, false)?;
            Ok(StoreReceipt {
                id,
                superseded: Vec::new(),
                fingerprint: None,
                embedding_status: EmbeddingStatus::Pending,
            })
        })
    }

    fn insert_superseding(&self, draft: &MemoryDraft) -> EngramResult<StoreReceipt> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = self
                .pool
                .writer
                .with_conn_sync(|conn| queries::supersession::insert_superseding(conn, draft));
            match result {
                Ok(receipt) => return Ok(receipt),
                Err(e) if queries::supersession::is_retryable(&e)
                    && attempt <= self.supersession.max_retries =>
                {
                    warn!(
                        attempt,
                        error = %e,
                        "supersession conflict, retrying"
                    );
                    std::thread::sleep(Duration::from_millis(self.supersession.retry_delay_ms));
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn mark_embedding(
        &self,
        id: i64,
        status: EmbeddingStatus,
        vector: Option<&[f32]>,
        model: Option<&str>,
        error: Option<&str>,
    ) -> EngramResult<()> {
        self.pool.writer.with_conn_sync(|conn| {
            queries::memory_crud::mark_embedding(conn, id, status, vector, model, error)
        })
    }

    fn get(&self, id: i64) -> EngramResult<Option<MemoryRecord>> {
        self.with_reader(|conn| queries::memory_crud::get_memory(conn, id))
    }

    fn find_by_fingerprint(
        &self,
        user_id: &str,
        fingerprint: &str,
    ) -> EngramResult<Vec<MemoryRecord>> {
        self.with_reader(|conn| queries::memory_crud::find_by_fingerprint(conn, user_id, fingerprint))
    }

    fn get_candidates(&self, filter: &CandidateFilter) -> EngramResult<Vec<MemoryRecord>> {
        self.with_reader(|conn| queries::candidates::select_candidates(conn, filter))
    }

    fn recent_unembedded(
        &self,
        filter: &CandidateFilter,
        window_secs: u64,
    ) -> EngramResult<Vec<MemoryRecord>> {
        self.with_reader(|conn| queries::candidates::recent_unembedded(conn, filter, window_secs))
    }

    fn record_access(&self, ids: &[i64]) -> EngramResult<()> {
        self.pool
            .writer
            .with_conn_sync(|conn| queries::memory_crud::record_access(conn, ids))
    }

    fn claim_backfill_row(&self, options: &BackfillOptions) -> EngramResult<Option<MemoryRecord>> {
        self.pool
            .writer
            .with_conn_sync(|conn| queries::backfill_ops::claim_next(conn, options))
    }

    fn count_unembedded(&self, options: &BackfillOptions) -> EngramResult<u64> {
        self.with_reader(|conn| queries::backfill_ops::count_eligible(conn, options))
    }

    fn reclaim_stuck_processing(&self, older_than_secs: u64) -> EngramResult<usize> {
        self.pool
            .writer
            .with_conn_sync(|conn| queries::backfill_ops::reclaim_stuck(conn, older_than_secs))
    }

    fn load_centroid(&self, user_id: &str) -> EngramResult<Option<Vec<f32>>> {
        self.with_reader(|conn| queries::centroid_ops::load(conn, user_id))
    }

    fn update_centroid(&self, user_id: &str, vectors: &[Vec<f32>]) -> EngramResult<()> {
        self.pool
            .writer
            .with_conn_sync(|conn| queries::centroid_ops::update(conn, user_id, vectors))
    }

    fn create_supersession_constraint(&self) -> EngramResult<ConstraintReport> {
        self.pool
            .writer
            .with_conn_sync(queries::maintenance::create_supersession_constraint)
    }

    fn cleanup_duplicate_current_facts(&self) -> EngramResult<CleanupReport> {
        self.pool
            .writer
            .with_conn_sync(queries::maintenance::cleanup_duplicate_current_facts)
    }
}
