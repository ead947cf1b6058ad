//! v001: patterns table and covering indexes.

use rusqlite::Connection;

use engram_core::errors::EngramResult;
use engram_store::to_store_err;

pub fn migrate(conn: &Connection) -> EngramResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS patterns (
            id             TEXT PRIMARY KEY,
            kind           TEXT NOT NULL,
            title          TEXT NOT NULL,
            description    TEXT NOT NULL DEFAULT '',
            payload        TEXT NOT NULL,
            confidence     REAL NOT NULL DEFAULT 1.0,
            namespaces     TEXT NOT NULL DEFAULT '[]',
            access_count   INTEGER NOT NULL DEFAULT 0,
            last_accessed  TEXT NOT NULL,
            created_at     TEXT NOT NULL,
            content_hash   TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_patterns_kind ON patterns(kind);
        CREATE INDEX IF NOT EXISTS idx_patterns_confidence ON patterns(confidence);
        CREATE INDEX IF NOT EXISTS idx_patterns_content_hash ON patterns(content_hash);
        CREATE INDEX IF NOT EXISTS idx_patterns_last_accessed ON patterns(last_accessed);
        CREATE INDEX IF NOT EXISTS idx_patterns_created_at ON patterns(created_at);
        ",
    )
    .map_err(|e| to_store_err(e.to_string()))?;
    Ok(())
}
