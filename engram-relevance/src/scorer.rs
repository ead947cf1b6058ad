//! Composite scoring: four normalized factors, weighted and summed.
//!
//! Factor weights come from `RelevanceConfig` and are normalized here, so
//! overridden weights need not sum to 1.0. Each factor is itself mapped
//! into [0, 1] before weighting:
//!
//! - text relevance: FTS relevance divided by the best relevance in the
//!   candidate set (per-query max normalization),
//! - confidence: the stored confidence, already clamped,
//! - popularity: `access_count / (access_count + half_saturation)`,
//! - recency: `exp(-days_since_access / recency_scale_days)`.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use engram_core::config::RelevanceConfig;
use engram_core::models::{FactorBreakdown, Suggestion};
use engram_knowledge::SearchHit;

/// Score and rank search hits. Ties broken by higher confidence, then by
/// more recent access. Cautions are left empty; the engine fills them in
/// when a context report is available.
pub fn score_hits(
    hits: Vec<SearchHit>,
    now: DateTime<Utc>,
    config: &RelevanceConfig,
) -> Vec<Suggestion> {
    if hits.is_empty() {
        return Vec::new();
    }

    let weight_sum = (config.text_weight
        + config.confidence_weight
        + config.popularity_weight
        + config.recency_weight)
        .max(f64::EPSILON);

    let max_relevance = hits
        .iter()
        .map(|h| h.relevance)
        .fold(f64::NEG_INFINITY, f64::max)
        .max(f64::EPSILON);

    let mut suggestions: Vec<Suggestion> = hits
        .into_iter()
        .map(|hit| {
            let factors = FactorBreakdown {
                text_relevance: hit.relevance / max_relevance,
                confidence: hit.pattern.confidence.value(),
                popularity: popularity_factor(
                    hit.pattern.access_count,
                    config.popularity_half_saturation,
                ),
                recency: recency_factor(now, hit.pattern.last_accessed, config.recency_scale_days),
            };
            let score = (config.text_weight * factors.text_relevance
                + config.confidence_weight * factors.confidence
                + config.popularity_weight * factors.popularity
                + config.recency_weight * factors.recency)
                / weight_sum;
            Suggestion {
                pattern: hit.pattern,
                score,
                factors,
                cautions: Vec::new(),
            }
        })
        .collect();

    suggestions.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                b.pattern
                    .confidence
                    .value()
                    .partial_cmp(&a.pattern.confidence.value())
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| b.pattern.last_accessed.cmp(&a.pattern.last_accessed))
    });
    suggestions
}

/// Saturating popularity curve: 0 at zero accesses, 0.5 at the
/// half-saturation count, asymptotically 1.0.
fn popularity_factor(access_count: u64, half_saturation: f64) -> f64 {
    let count = access_count as f64;
    count / (count + half_saturation.max(f64::EPSILON))
}

/// Exponential recency decay with an e-folding scale in days. Accesses
/// timestamped in the future clamp to "now".
fn recency_factor(now: DateTime<Utc>, last_accessed: DateTime<Utc>, scale_days: f64) -> f64 {
    let days_since = (now - last_accessed).num_days().max(0) as f64;
    (-days_since / scale_days.max(f64::EPSILON)).exp()
}
