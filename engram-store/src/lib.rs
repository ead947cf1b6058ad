//! # engram-store
//!
//! SQLite store primitive shared by every tier: a single serialized
//! write connection plus a round-robin read pool, pragma setup, a
//! versioned migration runner, and integrity/maintenance helpers.
//!
//! This crate knows nothing about any tier's schema. Each tier opens
//! its own [`Store`] with its own migration list, so store lifecycle is
//! explicit and injectable, with no hidden singleton.

pub mod maintenance;
pub mod migrations;
pub mod pool;
mod store;

pub use migrations::{run_migrations, Migration};
pub use store::Store;

use engram_core::errors::{EngramError, StoreError};

/// Map a low-level SQLite failure into the workspace error type.
pub fn to_store_err(message: String) -> EngramError {
    EngramError::Store(StoreError::SqliteError { message })
}

/// Helper trait to make `query_row` return `Option` on not-found.
pub trait OptionalRow<T> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalRow<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
