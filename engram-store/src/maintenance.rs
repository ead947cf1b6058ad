//! VACUUM, checkpoint, and integrity check helpers.

use rusqlite::Connection;

use engram_core::errors::EngramResult;

use crate::to_store_err;

/// Run incremental vacuum.
pub fn incremental_vacuum(conn: &Connection, pages: u32) -> EngramResult<()> {
    conn.execute_batch(&format!("PRAGMA incremental_vacuum({pages})"))
        .map_err(|e| to_store_err(e.to_string()))?;
    Ok(())
}

/// Run full vacuum.
pub fn full_vacuum(conn: &Connection) -> EngramResult<()> {
    conn.execute_batch("VACUUM")
        .map_err(|e| to_store_err(e.to_string()))?;
    Ok(())
}

/// WAL checkpoint.
pub fn wal_checkpoint(conn: &Connection) -> EngramResult<()> {
    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE)")
        .map_err(|e| to_store_err(e.to_string()))?;
    Ok(())
}

/// Run quick integrity check. Returns the first reported problem, or
/// `None` if the database is healthy.
pub fn quick_check(conn: &Connection) -> EngramResult<Option<String>> {
    let result: String = conn
        .query_row("PRAGMA quick_check", [], |row| row.get(0))
        .map_err(|e| to_store_err(e.to_string()))?;
    if result == "ok" {
        Ok(None)
    } else {
        Ok(Some(result))
    }
}
