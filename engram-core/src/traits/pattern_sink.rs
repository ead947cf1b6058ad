use crate::errors::EngramResult;
use crate::pattern::PatternDraft;

/// One-way handoff from working memory to the knowledge graph.
///
/// Tier 1 calls this with distilled drafts immediately before evicting a
/// conversation; the sink validates and stores them. Implementations
/// must treat each draft independently: a rejected draft must not
/// affect the others.
pub trait IPatternSink: Send + Sync {
    /// Offer one draft. Returns the stored pattern id, or `None` when
    /// the sink declined it (below threshold, policy veto).
    fn offer(&self, draft: PatternDraft) -> EngramResult<Option<String>>;
}
