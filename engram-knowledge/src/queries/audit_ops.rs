//! Audit rows written by the import reconciler.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use engram_core::models::{AuditRecord, TransferDecision};
use engram_core::{EngramError, EngramResult};
use engram_store::to_store_err;

pub fn insert_audit(conn: &Connection, record: &AuditRecord) -> EngramResult<()> {
    conn.execute(
        "INSERT INTO transfer_audit (
            pattern_id, decision, reason, confidence_before, confidence_after, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            record.pattern_id,
            record.decision.as_str(),
            record.reason,
            record.confidence_before,
            record.confidence_after,
            record.created_at.to_rfc3339(),
        ],
    )
    .map_err(|e| to_store_err(e.to_string()))?;
    Ok(())
}

/// Most recent audit rows, newest first.
pub fn recent_audits(conn: &Connection, limit: usize) -> EngramResult<Vec<AuditRecord>> {
    let mut stmt = conn
        .prepare(
            "SELECT pattern_id, decision, reason, confidence_before, confidence_after, created_at
             FROM transfer_audit
             ORDER BY id DESC
             LIMIT ?1",
        )
        .map_err(|e| to_store_err(e.to_string()))?;

    let rows = stmt
        .query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<f64>>(3)?,
                row.get::<_, Option<f64>>(4)?,
                row.get::<_, String>(5)?,
            ))
        })
        .map_err(|e| to_store_err(e.to_string()))?;

    let mut records = Vec::new();
    for row in rows {
        let (pattern_id, decision_str, reason, confidence_before, confidence_after, created_str) =
            row.map_err(|e| to_store_err(e.to_string()))?;
        let decision = TransferDecision::parse(&decision_str).map_err(EngramError::validation)?;
        let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| to_store_err(format!("parse audit timestamp '{created_str}': {e}")))?;
        records.push(AuditRecord {
            pattern_id,
            decision,
            reason,
            confidence_before,
            confidence_after,
            created_at,
        });
    }
    Ok(records)
}
