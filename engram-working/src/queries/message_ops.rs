//! Message rows. Append-only; deletion happens via conversation cascade.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use engram_core::models::{Message, MessageRole};
use engram_core::{EngramError, EngramResult};
use engram_store::to_store_err;

pub fn insert_message(conn: &Connection, message: &Message) -> EngramResult<()> {
    conn.execute(
        "INSERT INTO messages (id, conversation_id, role, content, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            message.id,
            message.conversation_id,
            message.role.as_str(),
            message.content,
            message.created_at.to_rfc3339(),
        ],
    )
    .map_err(|e| to_store_err(e.to_string()))?;
    Ok(())
}

/// All messages for one conversation in append order. Insertion order
/// (rowid) breaks same-instant timestamp ties.
pub fn messages_for(conn: &Connection, conversation_id: &str) -> EngramResult<Vec<Message>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, conversation_id, role, content, created_at
             FROM messages WHERE conversation_id = ?1
             ORDER BY created_at, rowid",
        )
        .map_err(|e| to_store_err(e.to_string()))?;

    let rows = stmt
        .query_map(params![conversation_id], |row| Ok(row_to_message(row)))
        .map_err(|e| to_store_err(e.to_string()))?;

    let mut messages = Vec::new();
    for row in rows {
        messages.push(row.map_err(|e| to_store_err(e.to_string()))??);
    }
    Ok(messages)
}

fn row_to_message(row: &rusqlite::Row<'_>) -> EngramResult<Message> {
    let role_str: String = row.get(2).map_err(|e| to_store_err(e.to_string()))?;
    let created_str: String = row.get(4).map_err(|e| to_store_err(e.to_string()))?;

    let role = MessageRole::parse(&role_str).map_err(EngramError::validation)?;
    let created_at = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| to_store_err(format!("parse datetime '{created_str}': {e}")))?;

    Ok(Message {
        id: row.get(0).map_err(|e| to_store_err(e.to_string()))?,
        conversation_id: row.get(1).map_err(|e| to_store_err(e.to_string()))?,
        role,
        content: row.get(3).map_err(|e| to_store_err(e.to_string()))?,
        created_at,
    })
}
