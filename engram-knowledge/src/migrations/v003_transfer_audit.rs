//! v003: audit trail for import reconciliation decisions.

use rusqlite::Connection;

use engram_core::errors::EngramResult;
use engram_store::to_store_err;

pub fn migrate(conn: &Connection) -> EngramResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS transfer_audit (
            id                 INTEGER PRIMARY KEY AUTOINCREMENT,
            pattern_id         TEXT NOT NULL,
            decision           TEXT NOT NULL,
            reason             TEXT NOT NULL DEFAULT '',
            confidence_before  REAL,
            confidence_after   REAL,
            created_at         TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_transfer_audit_pattern ON transfer_audit(pattern_id);
        CREATE INDEX IF NOT EXISTS idx_transfer_audit_created ON transfer_audit(created_at);
        ",
    )
    .map_err(|e| to_store_err(e.to_string()))?;
    Ok(())
}
