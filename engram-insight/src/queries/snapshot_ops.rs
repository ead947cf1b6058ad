//! The single-row snapshot table. Each collection cycle supersedes the
//! previous snapshot wholesale; nothing is merged.

use rusqlite::{params, Connection};

use engram_core::errors::EngramResult;
use engram_core::models::ContextReport;
use engram_store::{to_store_err, OptionalRow};

/// Replace the stored snapshot with this report, atomically.
pub fn save_snapshot(conn: &Connection, report: &ContextReport) -> EngramResult<()> {
    let report_json = serde_json::to_string(report)?;
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_store_err(format!("save_snapshot begin: {e}")))?;

    let result = tx
        .execute("DELETE FROM context_snapshots WHERE id = 1", [])
        .and_then(|_| {
            tx.execute(
                "INSERT INTO context_snapshots (id, collected_at, window_days, report)
                 VALUES (1, ?1, ?2, ?3)",
                params![
                    report.collected_at.to_rfc3339(),
                    report.window_days,
                    report_json,
                ],
            )
        });

    match result {
        Ok(_) => {
            tx.commit()
                .map_err(|e| to_store_err(format!("save_snapshot commit: {e}")))?;
            Ok(())
        }
        Err(e) => {
            let _ = tx.rollback();
            Err(to_store_err(e.to_string()))
        }
    }
}

/// The last persisted report, if any.
pub fn load_snapshot(conn: &Connection) -> EngramResult<Option<ContextReport>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT report FROM context_snapshots WHERE id = 1",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| to_store_err(e.to_string()))?;

    match raw {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}
