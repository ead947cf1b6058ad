use serde::{Deserialize, Serialize};

use super::confidence::Confidence;
use super::payload::PatternPayload;
use crate::models::namespace::Namespace;

/// A pattern proposal produced by Tier 1 distillation, before the
/// knowledge store has validated and assigned it an identity.
///
/// Drafts travel one way, working memory to knowledge graph, through
/// [`crate::traits::IPatternSink`]; the sink decides whether they
/// become stored patterns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternDraft {
    pub kind: String,
    pub title: String,
    pub payload: PatternPayload,
    pub namespaces: Vec<Namespace>,
    pub confidence: Confidence,
}
