//! v001: single-row snapshot of the latest collection report.

use rusqlite::Connection;

use engram_core::errors::EngramResult;
use engram_store::to_store_err;

pub fn migrate(conn: &Connection) -> EngramResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS context_snapshots (
            id            INTEGER PRIMARY KEY CHECK (id = 1),
            collected_at  TEXT NOT NULL,
            window_days   INTEGER NOT NULL,
            report        TEXT NOT NULL
        );
        ",
    )
    .map_err(|e| to_store_err(e.to_string()))?;
    Ok(())
}
