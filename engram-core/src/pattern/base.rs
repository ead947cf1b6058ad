use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::confidence::Confidence;
use super::payload::PatternPayload;
use crate::models::namespace::Namespace;

/// A reusable unit of learned knowledge in the Tier 2 store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    /// UUID v4 identifier.
    pub id: String,
    /// Free-form category, e.g. "workflow", "intent_mapping".
    pub kind: String,
    /// Short human-readable title.
    pub title: String,
    /// Searchable text materialized from the payload at write time.
    pub description: String,
    /// Typed content: per-kind struct, NOT a bare JSON blob.
    pub payload: PatternPayload,
    /// Confidence score, decays when the pattern goes unused.
    pub confidence: Confidence,
    /// Namespaces this pattern belongs to. At least one; the reserved
    /// "core" namespace marks machine-independent knowledge.
    pub namespaces: Vec<Namespace>,
    /// Number of times this pattern was surfaced or applied.
    pub access_count: u64,
    /// Last time this pattern was accessed.
    pub last_accessed: DateTime<Utc>,
    /// When this pattern was first stored.
    pub created_at: DateTime<Utc>,
    /// blake3 hash of the serialized payload, for dedup and the export
    /// signature.
    pub content_hash: String,
}

impl Pattern {
    /// Compute the blake3 content hash from the serialized payload.
    ///
    /// Returns an error if the payload cannot be serialized (e.g., NaN in
    /// f64 fields). Callers propagate with `?` in production code.
    pub fn compute_content_hash(payload: &PatternPayload) -> crate::errors::EngramResult<String> {
        let serialized = serde_json::to_string(payload)?;
        Ok(blake3::hash(serialized.as_bytes()).to_hex().to_string())
    }

    /// Whether this pattern carries the reserved core namespace.
    pub fn is_core(&self) -> bool {
        self.namespaces.iter().any(|ns| ns.is_core())
    }

    /// Structural comparison: same content hash, kind, title, confidence,
    /// and namespaces.
    ///
    /// Distinct from `PartialEq`, which only compares IDs (DDD Entity
    /// pattern).
    pub fn content_eq(&self, other: &Self) -> bool {
        self.content_hash == other.content_hash
            && self.kind == other.kind
            && self.title == other.title
            && self.confidence == other.confidence
            && self.namespaces == other.namespaces
    }
}

/// Identity equality: two patterns are equal if they have the same ID.
///
/// For structural comparison, use [`Pattern::content_eq`] instead.
impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
