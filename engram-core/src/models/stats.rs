use serde::{Deserialize, Serialize};

/// Aggregates over the Tier 2 pattern store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeStats {
    pub pattern_count: u64,
    /// Patterns carrying the reserved core namespace.
    pub core_count: u64,
    /// (namespace, pattern count), sorted by namespace.
    pub namespace_counts: Vec<(String, u64)>,
    pub average_confidence: f64,
    pub total_accesses: u64,
}

/// Aggregates over the Tier 1 conversation store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkingStats {
    pub conversation_count: u64,
    pub message_count: u64,
    pub strategic_count: u64,
    /// Id of the currently active conversation, if any.
    pub active_conversation: Option<String>,
}
