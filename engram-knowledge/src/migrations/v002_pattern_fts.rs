//! v002: FTS5 index over title + description, with sync triggers.
//!
//! External-content table: the patterns table stays the single source of
//! truth and the triggers keep the index in step inside the same write
//! transaction, so a pattern is never visible without being searchable.

use rusqlite::Connection;

use engram_core::errors::EngramResult;
use engram_store::to_store_err;

pub fn migrate(conn: &Connection) -> EngramResult<()> {
    conn.execute_batch(
        "
        CREATE VIRTUAL TABLE IF NOT EXISTS pattern_fts USING fts5(
            title,
            description,
            content='patterns',
            content_rowid='rowid'
        );

        CREATE TRIGGER IF NOT EXISTS pattern_fts_insert AFTER INSERT ON patterns BEGIN
            INSERT INTO pattern_fts(rowid, title, description)
            VALUES (new.rowid, new.title, new.description);
        END;

        CREATE TRIGGER IF NOT EXISTS pattern_fts_delete BEFORE DELETE ON patterns BEGIN
            INSERT INTO pattern_fts(pattern_fts, rowid, title, description)
            VALUES ('delete', old.rowid, old.title, old.description);
        END;

        CREATE TRIGGER IF NOT EXISTS pattern_fts_update AFTER UPDATE ON patterns BEGIN
            INSERT INTO pattern_fts(pattern_fts, rowid, title, description)
            VALUES ('delete', old.rowid, old.title, old.description);
            INSERT INTO pattern_fts(rowid, title, description)
            VALUES (new.rowid, new.title, new.description);
        END;
        ",
    )
    .map_err(|e| to_store_err(e.to_string()))?;
    Ok(())
}
