//! Insert, update, get, delete and access bookkeeping for patterns.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use engram_core::models::KnowledgeStats;
use engram_core::pattern::{Confidence, Pattern, PatternPayload};
use engram_core::{EngramError, EngramResult, Namespace};
use engram_store::{to_store_err, OptionalRow};

const PATTERN_COLUMNS: &str = "id, kind, title, description, payload, confidence, \
     namespaces, access_count, last_accessed, created_at, content_hash";

/// Insert a single pattern.
///
/// A plain INSERT is already atomic with the FTS sync trigger, but the
/// transaction keeps the shape uniform with the multi-statement writes.
pub fn insert_pattern(conn: &Connection, pattern: &Pattern) -> EngramResult<()> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_store_err(format!("insert_pattern begin: {e}")))?;

    match insert_pattern_inner(&tx, pattern) {
        Ok(()) => {
            tx.commit()
                .map_err(|e| to_store_err(format!("insert_pattern commit: {e}")))?;
            Ok(())
        }
        Err(e) => {
            let _ = tx.rollback();
            Err(e)
        }
    }
}

fn insert_pattern_inner(conn: &Connection, pattern: &Pattern) -> EngramResult<()> {
    let payload_json = serde_json::to_string(&pattern.payload)?;
    let namespaces_json = serde_json::to_string(&pattern.namespaces)?;

    conn.execute(
        "INSERT INTO patterns (
            id, kind, title, description, payload, confidence,
            namespaces, access_count, last_accessed, created_at, content_hash
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            pattern.id,
            pattern.kind,
            pattern.title,
            pattern.description,
            payload_json,
            pattern.confidence.value(),
            namespaces_json,
            pattern.access_count,
            pattern.last_accessed.to_rfc3339(),
            pattern.created_at.to_rfc3339(),
            pattern.content_hash,
        ],
    )
    .map_err(|e| to_store_err(e.to_string()))?;
    Ok(())
}

/// Update an existing pattern in place. Unknown id is an error, not a no-op.
pub fn update_pattern(conn: &Connection, pattern: &Pattern) -> EngramResult<()> {
    let payload_json = serde_json::to_string(&pattern.payload)?;
    let namespaces_json = serde_json::to_string(&pattern.namespaces)?;

    let rows = conn
        .execute(
            "UPDATE patterns SET
                kind = ?2, title = ?3, description = ?4, payload = ?5,
                confidence = ?6, namespaces = ?7, access_count = ?8,
                last_accessed = ?9, created_at = ?10, content_hash = ?11
             WHERE id = ?1",
            params![
                pattern.id,
                pattern.kind,
                pattern.title,
                pattern.description,
                payload_json,
                pattern.confidence.value(),
                namespaces_json,
                pattern.access_count,
                pattern.last_accessed.to_rfc3339(),
                pattern.created_at.to_rfc3339(),
                pattern.content_hash,
            ],
        )
        .map_err(|e| to_store_err(e.to_string()))?;

    if rows == 0 {
        return Err(EngramError::PatternNotFound {
            id: pattern.id.clone(),
        });
    }
    Ok(())
}

/// Replace one pattern with its merged form and drop the absorbed record,
/// atomically. The merged row is upserted: consolidation merges onto an
/// existing row, import may merge under an id the store has never seen.
pub fn apply_merge(conn: &Connection, merged: &Pattern, absorbed_id: &str) -> EngramResult<()> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_store_err(format!("apply_merge begin: {e}")))?;

    let result = apply_merge_inner(&tx, merged, absorbed_id);
    match result {
        Ok(()) => {
            tx.commit()
                .map_err(|e| to_store_err(format!("apply_merge commit: {e}")))?;
            Ok(())
        }
        Err(e) => {
            let _ = tx.rollback();
            Err(e)
        }
    }
}

fn apply_merge_inner(conn: &Connection, merged: &Pattern, absorbed_id: &str) -> EngramResult<()> {
    if absorbed_id != merged.id {
        conn.execute("DELETE FROM patterns WHERE id = ?1", params![absorbed_id])
            .map_err(|e| to_store_err(e.to_string()))?;
    }
    if get_pattern(conn, &merged.id)?.is_some() {
        update_pattern(conn, merged)
    } else {
        insert_pattern_inner(conn, merged)
    }
}

pub fn get_pattern(conn: &Connection, id: &str) -> EngramResult<Option<Pattern>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {PATTERN_COLUMNS} FROM patterns WHERE id = ?1"
        ))
        .map_err(|e| to_store_err(e.to_string()))?;

    let result = stmt
        .query_row(params![id], |row| Ok(row_to_pattern(row)))
        .optional()
        .map_err(|e| to_store_err(e.to_string()))?;

    result.transpose()
}

pub fn find_by_content_hash(conn: &Connection, hash: &str) -> EngramResult<Option<Pattern>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {PATTERN_COLUMNS} FROM patterns WHERE content_hash = ?1 LIMIT 1"
        ))
        .map_err(|e| to_store_err(e.to_string()))?;

    let result = stmt
        .query_row(params![hash], |row| Ok(row_to_pattern(row)))
        .optional()
        .map_err(|e| to_store_err(e.to_string()))?;

    result.transpose()
}

/// Delete by id. Returns whether a row existed.
pub fn delete_pattern(conn: &Connection, id: &str) -> EngramResult<bool> {
    let rows = conn
        .execute("DELETE FROM patterns WHERE id = ?1", params![id])
        .map_err(|e| to_store_err(e.to_string()))?;
    Ok(rows > 0)
}

/// All patterns, oldest first.
pub fn list_patterns(conn: &Connection) -> EngramResult<Vec<Pattern>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {PATTERN_COLUMNS} FROM patterns ORDER BY created_at, id"
        ))
        .map_err(|e| to_store_err(e.to_string()))?;

    let rows = stmt
        .query_map([], |row| Ok(row_to_pattern(row)))
        .map_err(|e| to_store_err(e.to_string()))?;

    let mut patterns = Vec::new();
    for row in rows {
        patterns.push(row.map_err(|e| to_store_err(e.to_string()))??);
    }
    Ok(patterns)
}

/// Bump the access counter and refresh the access timestamp.
pub fn record_access(conn: &Connection, id: &str, now: DateTime<Utc>) -> EngramResult<()> {
    let rows = conn
        .execute(
            "UPDATE patterns SET access_count = access_count + 1, last_accessed = ?2
             WHERE id = ?1",
            params![id, now.to_rfc3339()],
        )
        .map_err(|e| to_store_err(e.to_string()))?;

    if rows == 0 {
        return Err(EngramError::PatternNotFound { id: id.to_string() });
    }
    Ok(())
}

/// Write back a decayed confidence without touching access metadata.
pub fn set_confidence(conn: &Connection, id: &str, confidence: f64) -> EngramResult<()> {
    let rows = conn
        .execute(
            "UPDATE patterns SET confidence = ?2 WHERE id = ?1",
            params![id, confidence],
        )
        .map_err(|e| to_store_err(e.to_string()))?;

    if rows == 0 {
        return Err(EngramError::PatternNotFound { id: id.to_string() });
    }
    Ok(())
}

/// Aggregate counters for `stats`. Namespace tallies need the JSON
/// column, so those come from a narrow scan rather than SQL aggregates.
pub fn knowledge_stats(conn: &Connection) -> EngramResult<KnowledgeStats> {
    let (pattern_count, average_confidence, total_accesses) = conn
        .query_row(
            "SELECT COUNT(*), COALESCE(AVG(confidence), 0.0), COALESCE(SUM(access_count), 0)
             FROM patterns",
            [],
            |row| {
                Ok((
                    row.get::<_, i64>(0)? as u64,
                    row.get::<_, f64>(1)?,
                    row.get::<_, i64>(2)? as u64,
                ))
            },
        )
        .map_err(|e| to_store_err(e.to_string()))?;

    let mut stmt = conn
        .prepare("SELECT namespaces FROM patterns")
        .map_err(|e| to_store_err(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| to_store_err(e.to_string()))?;

    let mut core_count = 0u64;
    let mut per_namespace: std::collections::BTreeMap<String, u64> = Default::default();
    for row in rows {
        let raw = row.map_err(|e| to_store_err(e.to_string()))?;
        let namespaces: Vec<Namespace> = serde_json::from_str(&raw)?;
        if namespaces.iter().any(Namespace::is_core) {
            core_count += 1;
        }
        for namespace in namespaces {
            *per_namespace.entry(namespace.as_str().to_string()).or_insert(0) += 1;
        }
    }

    Ok(KnowledgeStats {
        pattern_count,
        core_count,
        namespace_counts: per_namespace.into_iter().collect(),
        average_confidence,
        total_accesses,
    })
}

pub(crate) fn row_to_pattern(row: &rusqlite::Row<'_>) -> EngramResult<Pattern> {
    let payload_json: String = row.get(4).map_err(|e| to_store_err(e.to_string()))?;
    let namespaces_json: String = row.get(6).map_err(|e| to_store_err(e.to_string()))?;
    let last_accessed_str: String = row.get(8).map_err(|e| to_store_err(e.to_string()))?;
    let created_at_str: String = row.get(9).map_err(|e| to_store_err(e.to_string()))?;

    let payload: PatternPayload = serde_json::from_str(&payload_json)
        .map_err(|e| to_store_err(format!("parse payload: {e}")))?;
    let namespaces: Vec<Namespace> = serde_json::from_str(&namespaces_json)
        .map_err(|e| to_store_err(format!("parse namespaces: {e}")))?;

    let parse_dt = |s: &str| -> EngramResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| to_store_err(format!("parse datetime '{s}': {e}")))
    };

    Ok(Pattern {
        id: row.get(0).map_err(|e| to_store_err(e.to_string()))?,
        kind: row.get(1).map_err(|e| to_store_err(e.to_string()))?,
        title: row.get(2).map_err(|e| to_store_err(e.to_string()))?,
        description: row.get(3).map_err(|e| to_store_err(e.to_string()))?,
        payload,
        confidence: Confidence::new(row.get(5).map_err(|e| to_store_err(e.to_string()))?),
        namespaces,
        access_count: row
            .get::<_, i64>(7)
            .map_err(|e| to_store_err(e.to_string()))? as u64,
        last_accessed: parse_dt(&last_accessed_str)?,
        created_at: parse_dt(&created_at_str)?,
        content_hash: row.get(10).map_err(|e| to_store_err(e.to_string()))?,
    })
}
