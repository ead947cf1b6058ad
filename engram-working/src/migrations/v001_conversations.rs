//! v001: conversations and their messages.

use rusqlite::Connection;

use engram_core::errors::EngramResult;
use engram_store::to_store_err;

pub fn migrate(conn: &Connection) -> EngramResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS conversations (
            id             TEXT PRIMARY KEY,
            status         TEXT NOT NULL DEFAULT 'active',
            started_at     TEXT NOT NULL,
            ended_at       TEXT,
            strategic      INTEGER NOT NULL DEFAULT 0,
            entities       TEXT NOT NULL DEFAULT '[]',
            touched_files  TEXT NOT NULL DEFAULT '[]'
        );

        CREATE INDEX IF NOT EXISTS idx_conversations_status ON conversations(status);
        CREATE INDEX IF NOT EXISTS idx_conversations_started ON conversations(started_at);

        CREATE TABLE IF NOT EXISTS messages (
            id               TEXT PRIMARY KEY,
            conversation_id  TEXT NOT NULL,
            role             TEXT NOT NULL,
            content          TEXT NOT NULL,
            created_at       TEXT NOT NULL,
            FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_messages_conversation ON messages(conversation_id);
        ",
    )
    .map_err(|e| to_store_err(e.to_string()))?;
    Ok(())
}
