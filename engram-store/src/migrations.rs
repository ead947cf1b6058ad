//! Versioned schema migrations, recorded in a `schema_version` table.
//!
//! Migration lists are supplied by the tier crates; this runner only
//! guarantees ordering, idempotence, and per-migration atomicity.

use rusqlite::{params, Connection};

use engram_core::errors::{EngramResult, StoreError};

use crate::to_store_err;

/// One schema migration. `migrate` must be idempotent-safe inside its
/// transaction; it runs exactly once per database.
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub migrate: fn(&Connection) -> EngramResult<()>,
}

/// Run all pending migrations, in ascending version order.
///
/// Each migration runs inside its own transaction together with its
/// `schema_version` bookkeeping row, so a failure leaves the database at
/// the last fully-applied version.
pub fn run_migrations(conn: &Connection, migrations: &[Migration]) -> EngramResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_version (
            version     INTEGER PRIMARY KEY,
            name        TEXT NOT NULL DEFAULT '',
            applied_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );
        ",
    )
    .map_err(|e| to_store_err(e.to_string()))?;

    let current: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .map_err(|e| to_store_err(e.to_string()))?;

    for migration in migrations {
        if migration.version <= current {
            continue;
        }
        apply_one(conn, migration)?;
        tracing::debug!(
            version = migration.version,
            name = migration.name,
            "applied migration"
        );
    }
    Ok(())
}

fn apply_one(conn: &Connection, migration: &Migration) -> EngramResult<()> {
    let tx = conn.unchecked_transaction().map_err(|e| {
        to_store_err(format!("migration v{} begin: {e}", migration.version))
    })?;

    let result = (migration.migrate)(&tx).and_then(|()| {
        tx.execute(
            "INSERT INTO schema_version (version, name) VALUES (?1, ?2)",
            params![migration.version, migration.name],
        )
        .map_err(|e| to_store_err(e.to_string()))?;
        Ok(())
    });

    match result {
        Ok(()) => {
            tx.commit().map_err(|e| {
                to_store_err(format!("migration v{} commit: {e}", migration.version))
            })?;
            Ok(())
        }
        Err(e) => {
            let _ = tx.rollback();
            Err(StoreError::MigrationFailed {
                version: migration.version,
                reason: e.to_string(),
            }
            .into())
        }
    }
}

/// Highest applied migration version, 0 when none.
pub fn current_version(conn: &Connection) -> EngramResult<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| to_store_err(e.to_string()))
}
