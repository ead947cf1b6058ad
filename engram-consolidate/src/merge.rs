//! Tiered merge decisions for overlapping patterns.

use engram_core::config::defaults;
use engram_core::{Confidence, Pattern};
use serde::{Deserialize, Serialize};

use crate::similarity;

/// Similarity bands carving candidate pairs into tiers.
///
/// At or above `duplicate_threshold` a pair is the same knowledge twice;
/// between `merge_threshold` and `duplicate_threshold` the records overlap
/// enough to fold into one; below `merge_threshold` they stay separate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergePolicy {
    pub merge_threshold: f64,
    pub duplicate_threshold: f64,
}

impl MergePolicy {
    pub fn new(merge_threshold: f64, duplicate_threshold: f64) -> Self {
        let merge = merge_threshold.clamp(0.0, 1.0);
        Self {
            merge_threshold: merge,
            duplicate_threshold: duplicate_threshold.clamp(merge, 1.0),
        }
    }
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self::new(
            defaults::DEFAULT_MERGE_THRESHOLD,
            defaults::DEFAULT_DUPLICATE_THRESHOLD,
        )
    }
}

/// What happens to a candidate pair.
#[derive(Debug, Clone)]
pub enum MergeOutcome {
    /// Same knowledge twice. The stronger side survives unchanged.
    Duplicate {
        survivor: Pattern,
        absorbed_id: String,
        similarity: f64,
    },
    /// Overlapping knowledge. One merged record replaces both sides.
    Merged {
        merged: Pattern,
        absorbed_id: String,
        similarity: f64,
    },
    /// Below the merge band. Both records stay.
    Distinct { similarity: f64 },
}

impl MergeOutcome {
    /// Whether applying this outcome changes the store.
    pub fn is_change(&self) -> bool {
        !matches!(self, MergeOutcome::Distinct { .. })
    }

    pub fn similarity(&self) -> f64 {
        match self {
            MergeOutcome::Duplicate { similarity, .. }
            | MergeOutcome::Merged { similarity, .. }
            | MergeOutcome::Distinct { similarity } => *similarity,
        }
    }

    /// One-line reason suitable for audit records.
    pub fn reason(&self) -> String {
        match self {
            MergeOutcome::Duplicate { similarity, .. } => format!(
                "duplicate content (similarity {:.3}), kept higher confidence",
                similarity
            ),
            MergeOutcome::Merged { similarity, .. } => format!(
                "overlapping content (similarity {:.3}), occurrence-weighted merge",
                similarity
            ),
            MergeOutcome::Distinct { similarity } => {
                format!("distinct content (similarity {:.3})", similarity)
            }
        }
    }
}

/// Decide the tier for a pair at a precomputed similarity.
pub fn evaluate(a: &Pattern, b: &Pattern, similarity: f64, policy: &MergePolicy) -> MergeOutcome {
    if similarity >= policy.duplicate_threshold {
        let (winner, loser) = winner_first(a, b);
        return MergeOutcome::Duplicate {
            survivor: winner.clone(),
            absorbed_id: loser.id.clone(),
            similarity,
        };
    }
    if similarity >= policy.merge_threshold {
        let merged = merge_patterns(a, b);
        let absorbed_id = if merged.id == a.id {
            b.id.clone()
        } else {
            a.id.clone()
        };
        return MergeOutcome::Merged {
            merged,
            absorbed_id,
            similarity,
        };
    }
    MergeOutcome::Distinct { similarity }
}

/// Score the pair first, then decide its tier.
pub fn evaluate_pair(a: &Pattern, b: &Pattern, policy: &MergePolicy) -> MergeOutcome {
    evaluate(a, b, similarity::pattern_similarity(a, b), policy)
}

/// Build the merged record for a pair inside the merge band.
///
/// The higher-confidence side contributes identity and content. Confidence
/// becomes the access-count-weighted average of both sides, access counts
/// are summed, and namespaces are unioned so neither side loses reach. The
/// merged record keeps the earliest creation and the latest access.
pub fn merge_patterns(a: &Pattern, b: &Pattern) -> Pattern {
    let (winner, loser) = winner_first(a, b);
    let mut merged = winner.clone();
    merged.confidence = Confidence::new(weighted_confidence(a, b));
    merged.access_count = a.access_count + b.access_count;
    for namespace in &loser.namespaces {
        if !merged.namespaces.contains(namespace) {
            merged.namespaces.push(namespace.clone());
        }
    }
    merged.last_accessed = winner.last_accessed.max(loser.last_accessed);
    merged.created_at = winner.created_at.min(loser.created_at);
    merged
}

/// Access-count-weighted confidence average.
///
/// Falls back to the plain mean when neither side has ever been accessed.
pub fn weighted_confidence(a: &Pattern, b: &Pattern) -> f64 {
    let weight_a = a.access_count as f64;
    let weight_b = b.access_count as f64;
    let total = weight_a + weight_b;
    if total == 0.0 {
        return (a.confidence.value() + b.confidence.value()) / 2.0;
    }
    (a.confidence.value() * weight_a + b.confidence.value() * weight_b) / total
}

// Confidence decides the winner; access count, then recency break ties.
fn winner_first<'a>(a: &'a Pattern, b: &'a Pattern) -> (&'a Pattern, &'a Pattern) {
    let key_a = (a.confidence.value(), a.access_count, a.last_accessed);
    let key_b = (b.confidence.value(), b.access_count, b.last_accessed);
    if key_a >= key_b {
        (a, b)
    } else {
        (b, a)
    }
}
