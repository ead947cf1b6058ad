//! FTS5 queries over pattern titles and descriptions.

use rusqlite::{params, Connection};

use engram_core::pattern::Pattern;
use engram_core::EngramResult;
use engram_store::to_store_err;

use super::pattern_crud::row_to_pattern;

/// One FTS match before namespace weighting.
#[derive(Debug, Clone)]
pub struct FtsHit {
    pub pattern: Pattern,
    /// Negated bm25 rank, so larger means more relevant.
    pub text_score: f64,
}

/// Turn free text into an FTS5 query: quoted tokens OR-ed together.
///
/// Quoting keeps user punctuation from reaching the FTS5 query parser.
/// Returns `None` when nothing searchable remains.
pub fn build_match_query(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split_whitespace()
        .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
        .collect();
    if terms.is_empty() {
        return None;
    }
    Some(terms.join(" OR "))
}

/// BM25-ranked candidates at or above `min_confidence`, best first.
pub fn search_fts(
    conn: &Connection,
    match_query: &str,
    min_confidence: f64,
    limit: usize,
) -> EngramResult<Vec<FtsHit>> {
    let mut stmt = conn
        .prepare(
            "SELECT p.id, p.kind, p.title, p.description, p.payload, p.confidence,
                    p.namespaces, p.access_count, p.last_accessed, p.created_at,
                    p.content_hash, fts.rank
             FROM pattern_fts fts
             JOIN patterns p ON p.rowid = fts.rowid
             WHERE pattern_fts MATCH ?1 AND p.confidence >= ?2
             ORDER BY fts.rank
             LIMIT ?3",
        )
        .map_err(|e| to_store_err(e.to_string()))?;

    let rows = stmt
        .query_map(params![match_query, min_confidence, limit as i64], |row| {
            let rank: f64 = row.get(11)?;
            Ok((row_to_pattern(row), rank))
        })
        .map_err(|e| to_store_err(e.to_string()))?;

    let mut hits = Vec::new();
    for row in rows {
        let (pattern, rank) = row.map_err(|e| to_store_err(e.to_string()))?;
        hits.push(FtsHit {
            pattern: pattern?,
            // FTS5 bm25 rank sorts ascending; flip the sign and floor at
            // zero so downstream weighting sees a non-negative score.
            text_score: (-rank).max(0.0),
        });
    }
    Ok(hits)
}
