use serde::{Deserialize, Serialize};

use super::defaults;

/// Relevance-ranking configuration. The four weights are normalized at
/// scoring time, so they need not sum to exactly 1.0 after overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelevanceConfig {
    /// Default number of suggestions returned.
    pub top_k: usize,
    /// Candidates below this confidence are excluded before scoring.
    pub min_confidence: f64,
    pub text_weight: f64,
    pub confidence_weight: f64,
    pub popularity_weight: f64,
    pub recency_weight: f64,
    /// e-folding scale for the recency factor, in days.
    pub recency_scale_days: f64,
    /// Access count at which the popularity factor reaches 0.5.
    pub popularity_half_saturation: f64,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            top_k: defaults::DEFAULT_TOP_K,
            min_confidence: defaults::DEFAULT_SUGGEST_MIN_CONFIDENCE,
            text_weight: defaults::DEFAULT_TEXT_WEIGHT,
            confidence_weight: defaults::DEFAULT_CONFIDENCE_WEIGHT,
            popularity_weight: defaults::DEFAULT_POPULARITY_WEIGHT,
            recency_weight: defaults::DEFAULT_RECENCY_WEIGHT,
            recency_scale_days: defaults::DEFAULT_RECENCY_SCALE_DAYS,
            popularity_half_saturation: defaults::DEFAULT_POPULARITY_HALF_SATURATION,
        }
    }
}
