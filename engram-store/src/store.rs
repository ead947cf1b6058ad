//! Store: owns a ConnectionPool for one database file, runs that
//! tier's migrations at open, and routes reads to the right connection.

use std::path::Path;

use engram_core::errors::{EngramResult, StoreError};

use crate::maintenance;
use crate::migrations::{self, Migration};
use crate::pool::{ConnectionPool, ReadPool};

/// A single tier's transactional store.
///
/// Tiers hold their own `Store` (dependency injection, no globals) and
/// run their queries through [`Store::with_reader`] /
/// [`Store::with_writer`].
#[derive(Debug)]
pub struct Store {
    pool: ConnectionPool,
    /// When true, use the read pool for read operations (file-backed mode).
    /// When false, route all reads through the writer (in-memory mode,
    /// because in-memory read pool connections are isolated databases).
    use_read_pool: bool,
}

impl Store {
    /// Open a store backed by a file on disk and bring its schema up to
    /// date.
    pub fn open(path: &Path, migrations: &[Migration]) -> EngramResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let pool = ConnectionPool::open(path, ReadPool::default_size())?;
        let store = Self {
            pool,
            use_read_pool: true,
        };
        store.initialize(migrations)?;
        Ok(store)
    }

    /// Open an in-memory store (for testing).
    /// Routes all reads through the writer since in-memory read pool
    /// connections are isolated databases that can't see writer's changes.
    pub fn open_in_memory(migrations: &[Migration]) -> EngramResult<Self> {
        let pool = ConnectionPool::open_in_memory(1)?;
        let store = Self {
            pool,
            use_read_pool: false,
        };
        store.initialize(migrations)?;
        Ok(store)
    }

    /// Run migrations on the write connection.
    fn initialize(&self, migration_list: &[Migration]) -> EngramResult<()> {
        self.pool
            .writer
            .with_conn(|conn| migrations::run_migrations(conn, migration_list))
    }

    /// Get a reference to the connection pool (for advanced operations).
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Execute a read-only query on the best available connection.
    /// File-backed: uses the read pool (no writer contention).
    /// In-memory: uses the writer (read pool is isolated).
    pub fn with_reader<F, T>(&self, f: F) -> EngramResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> EngramResult<T>,
    {
        if self.use_read_pool {
            self.pool.readers.with_conn(f)
        } else {
            self.pool.writer.with_conn(f)
        }
    }

    /// Execute a closure on the serialized write connection.
    pub fn with_writer<F, T>(&self, f: F) -> EngramResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> EngramResult<T>,
    {
        self.pool.writer.with_conn(f)
    }

    /// Run `PRAGMA quick_check`. Corruption is fatal: it surfaces as
    /// [`StoreError::CorruptionDetected`] and requires operator
    /// intervention, never automatic repair.
    pub fn integrity_check(&self) -> EngramResult<()> {
        let problem = self.pool.writer.with_conn(maintenance::quick_check)?;
        match problem {
            None => Ok(()),
            Some(details) => {
                tracing::error!(details = %details, "store integrity check failed");
                Err(StoreError::CorruptionDetected { details }.into())
            }
        }
    }

    /// Reclaim free pages.
    pub fn vacuum(&self) -> EngramResult<()> {
        self.pool.writer.with_conn(maintenance::full_vacuum)
    }

    /// Truncate the WAL into the main database file.
    pub fn wal_checkpoint(&self) -> EngramResult<()> {
        self.pool.writer.with_conn(maintenance::wal_checkpoint)
    }
}
