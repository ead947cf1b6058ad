use serde::{Deserialize, Serialize};

use super::defaults;

/// Knowledge-graph (Tier 2) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// Minimum confidence accepted by `store_pattern`.
    pub min_store_confidence: f64,
    /// Days without access before decay starts applying.
    pub decay_after_days: i64,
    /// Fraction of confidence removed per day past the decay threshold.
    pub decay_rate_per_day: f64,
    /// Similarity at or above which two patterns are merge candidates.
    pub merge_threshold: f64,
    /// Similarity at or above which two patterns are duplicates; the
    /// higher-confidence copy wins outright.
    pub duplicate_threshold: f64,
    /// Confidence below which a pattern becomes prunable.
    pub prune_confidence_floor: f64,
    /// Age in days beyond which a low-confidence pattern becomes
    /// prunable.
    pub prune_age_days: i64,
    /// Search multiplier for the caller's active namespace.
    pub active_namespace_boost: f64,
    /// Search multiplier for the reserved core namespace.
    pub core_namespace_boost: f64,
    /// Search multiplier for all other namespaces.
    pub foreign_namespace_discount: f64,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            min_store_confidence: defaults::DEFAULT_MIN_STORE_CONFIDENCE,
            decay_after_days: defaults::DEFAULT_DECAY_AFTER_DAYS,
            decay_rate_per_day: defaults::DEFAULT_DECAY_RATE_PER_DAY,
            merge_threshold: defaults::DEFAULT_MERGE_THRESHOLD,
            duplicate_threshold: defaults::DEFAULT_DUPLICATE_THRESHOLD,
            prune_confidence_floor: defaults::DEFAULT_PRUNE_CONFIDENCE_FLOOR,
            prune_age_days: defaults::DEFAULT_PRUNE_AGE_DAYS,
            active_namespace_boost: defaults::DEFAULT_ACTIVE_NAMESPACE_BOOST,
            core_namespace_boost: defaults::DEFAULT_CORE_NAMESPACE_BOOST,
            foreign_namespace_discount: defaults::DEFAULT_FOREIGN_NAMESPACE_DISCOUNT,
        }
    }
}
