//! Conversation rows: lifecycle, listing, eviction candidates, stats.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use engram_core::models::{Conversation, ConversationStatus, WorkingStats};
use engram_core::{EngramError, EngramResult};
use engram_store::{to_store_err, OptionalRow};

use super::message_ops;

const CONVERSATION_COLUMNS: &str =
    "id, status, started_at, ended_at, strategic, entities, touched_files";

pub fn insert_conversation(conn: &Connection, conversation: &Conversation) -> EngramResult<()> {
    let entities_json = serde_json::to_string(&conversation.entities)?;
    let touched_json = serde_json::to_string(&conversation.touched_files)?;

    conn.execute(
        "INSERT INTO conversations (
            id, status, started_at, ended_at, strategic, entities, touched_files
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            conversation.id,
            conversation.status.as_str(),
            conversation.started_at.to_rfc3339(),
            conversation.ended_at.map(|t| t.to_rfc3339()),
            conversation.strategic as i32,
            entities_json,
            touched_json,
        ],
    )
    .map_err(|e| to_store_err(e.to_string()))?;
    Ok(())
}

/// Fetch one conversation with its messages in append order.
pub fn get_conversation(conn: &Connection, id: &str) -> EngramResult<Option<Conversation>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = ?1"
        ))
        .map_err(|e| to_store_err(e.to_string()))?;

    let result = stmt
        .query_row(params![id], |row| Ok(row_to_conversation(row)))
        .optional()
        .map_err(|e| to_store_err(e.to_string()))?;

    match result {
        Some(Ok(mut conversation)) => {
            conversation.messages = message_ops::messages_for(conn, &conversation.id)?;
            Ok(Some(conversation))
        }
        Some(Err(e)) => Err(e),
        None => Ok(None),
    }
}

/// The single active conversation, if one exists.
pub fn active_conversation(conn: &Connection) -> EngramResult<Option<Conversation>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations
             WHERE status = 'active'
             ORDER BY started_at DESC, rowid DESC
             LIMIT 1"
        ))
        .map_err(|e| to_store_err(e.to_string()))?;

    let result = stmt
        .query_row([], |row| Ok(row_to_conversation(row)))
        .optional()
        .map_err(|e| to_store_err(e.to_string()))?;

    match result {
        Some(Ok(mut conversation)) => {
            conversation.messages = message_ops::messages_for(conn, &conversation.id)?;
            Ok(Some(conversation))
        }
        Some(Err(e)) => Err(e),
        None => Ok(None),
    }
}

/// Transition a conversation to `complete` with its capture results.
pub fn mark_complete(
    conn: &Connection,
    id: &str,
    ended_at: DateTime<Utc>,
    strategic: bool,
    entities: &[String],
    touched_files: &[String],
) -> EngramResult<()> {
    let entities_json = serde_json::to_string(entities)?;
    let touched_json = serde_json::to_string(touched_files)?;

    let rows = conn
        .execute(
            "UPDATE conversations SET
                status = 'complete', ended_at = ?2, strategic = ?3,
                entities = ?4, touched_files = ?5
             WHERE id = ?1",
            params![
                id,
                ended_at.to_rfc3339(),
                strategic as i32,
                entities_json,
                touched_json,
            ],
        )
        .map_err(|e| to_store_err(e.to_string()))?;

    if rows == 0 {
        return Err(EngramError::ConversationNotFound { id: id.to_string() });
    }
    Ok(())
}

/// Delete a conversation; messages cascade. Returns whether it existed.
pub fn delete_conversation(conn: &Connection, id: &str) -> EngramResult<bool> {
    let rows = conn
        .execute("DELETE FROM conversations WHERE id = ?1", params![id])
        .map_err(|e| to_store_err(e.to_string()))?;
    Ok(rows > 0)
}

pub fn count_complete(conn: &Connection) -> EngramResult<u64> {
    conn.query_row(
        "SELECT COUNT(*) FROM conversations WHERE status = 'complete'",
        [],
        |row| row.get::<_, i64>(0),
    )
    .map(|n| n as u64)
    .map_err(|e| to_store_err(e.to_string()))
}

/// Complete conversation ids, oldest first. Insertion order (rowid)
/// breaks same-instant start ties so eviction order stays deterministic.
pub fn complete_oldest_first(conn: &Connection) -> EngramResult<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT id FROM conversations WHERE status = 'complete'
             ORDER BY started_at, rowid",
        )
        .map_err(|e| to_store_err(e.to_string()))?;

    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| to_store_err(e.to_string()))?;

    let mut ids = Vec::new();
    for row in rows {
        ids.push(row.map_err(|e| to_store_err(e.to_string()))?);
    }
    Ok(ids)
}

/// Newest conversations first, messages included.
pub fn recent_conversations(conn: &Connection, limit: usize) -> EngramResult<Vec<Conversation>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations
             ORDER BY started_at DESC, rowid DESC
             LIMIT ?1"
        ))
        .map_err(|e| to_store_err(e.to_string()))?;

    let rows = stmt
        .query_map(params![limit as i64], |row| Ok(row_to_conversation(row)))
        .map_err(|e| to_store_err(e.to_string()))?;

    let mut conversations = Vec::new();
    for row in rows {
        let mut conversation = row.map_err(|e| to_store_err(e.to_string()))??;
        conversation.messages = message_ops::messages_for(conn, &conversation.id)?;
        conversations.push(conversation);
    }
    Ok(conversations)
}

/// Conversations whose text or extracted entities contain the query,
/// newest first. Plain substring match; Tier 2 owns real text ranking.
pub fn search_conversations(
    conn: &Connection,
    query: &str,
    limit: usize,
) -> EngramResult<Vec<Conversation>> {
    let pattern = like_pattern(query);
    let mut stmt = conn
        .prepare(&format!(
            "SELECT DISTINCT {columns} FROM conversations c
             LEFT JOIN messages m ON m.conversation_id = c.id
             WHERE m.content LIKE ?1 ESCAPE '\\' OR c.entities LIKE ?1 ESCAPE '\\'
             ORDER BY c.started_at DESC, c.rowid DESC
             LIMIT ?2",
            columns = "c.id, c.status, c.started_at, c.ended_at, c.strategic, c.entities, c.touched_files"
        ))
        .map_err(|e| to_store_err(e.to_string()))?;

    let rows = stmt
        .query_map(params![pattern, limit as i64], |row| {
            Ok(row_to_conversation(row))
        })
        .map_err(|e| to_store_err(e.to_string()))?;

    let mut conversations = Vec::new();
    for row in rows {
        let mut conversation = row.map_err(|e| to_store_err(e.to_string()))??;
        conversation.messages = message_ops::messages_for(conn, &conversation.id)?;
        conversations.push(conversation);
    }
    Ok(conversations)
}

pub fn working_stats(conn: &Connection) -> EngramResult<WorkingStats> {
    let (conversation_count, strategic_count) = conn
        .query_row(
            "SELECT COUNT(*), COALESCE(SUM(strategic), 0) FROM conversations",
            [],
            |row| Ok((row.get::<_, i64>(0)? as u64, row.get::<_, i64>(1)? as u64)),
        )
        .map_err(|e| to_store_err(e.to_string()))?;

    let message_count = conn
        .query_row("SELECT COUNT(*) FROM messages", [], |row| {
            row.get::<_, i64>(0)
        })
        .map(|n| n as u64)
        .map_err(|e| to_store_err(e.to_string()))?;

    let active_conversation = conn
        .query_row(
            "SELECT id FROM conversations WHERE status = 'active' LIMIT 1",
            [],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|e| to_store_err(e.to_string()))?;

    Ok(WorkingStats {
        conversation_count,
        message_count,
        strategic_count,
        active_conversation,
    })
}

fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn row_to_conversation(row: &rusqlite::Row<'_>) -> EngramResult<Conversation> {
    let status_str: String = row.get(1).map_err(|e| to_store_err(e.to_string()))?;
    let started_str: String = row.get(2).map_err(|e| to_store_err(e.to_string()))?;
    let ended_str: Option<String> = row.get(3).map_err(|e| to_store_err(e.to_string()))?;
    let entities_json: String = row.get(5).map_err(|e| to_store_err(e.to_string()))?;
    let touched_json: String = row.get(6).map_err(|e| to_store_err(e.to_string()))?;

    let status = ConversationStatus::parse(&status_str).map_err(EngramError::validation)?;
    let entities: Vec<String> = serde_json::from_str(&entities_json)?;
    let touched_files: Vec<String> = serde_json::from_str(&touched_json)?;

    let parse_dt = |s: &str| -> EngramResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| to_store_err(format!("parse datetime '{s}': {e}")))
    };

    Ok(Conversation {
        id: row.get(0).map_err(|e| to_store_err(e.to_string()))?,
        status,
        started_at: parse_dt(&started_str)?,
        ended_at: ended_str.as_deref().map(parse_dt).transpose()?,
        strategic: row
            .get::<_, i32>(4)
            .map_err(|e| to_store_err(e.to_string()))?
            != 0,
        entities,
        touched_files,
        messages: Vec::new(),
    })
}
