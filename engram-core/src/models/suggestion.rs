use serde::{Deserialize, Serialize};

use crate::pattern::Pattern;

/// Per-factor contribution to a suggestion's composite score.
/// Each factor is normalized to [0, 1] before weighting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FactorBreakdown {
    pub text_relevance: f64,
    pub confidence: f64,
    pub popularity: f64,
    pub recency: f64,
}

/// A ranked, ephemeral recommendation of a stored pattern.
/// Never persisted; recomputed per query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub pattern: Pattern,
    pub score: f64,
    pub factors: FactorBreakdown,
    /// Files referenced by the pattern that Tier 3 currently classifies
    /// unstable. Advisory only.
    pub cautions: Vec<String>,
}
