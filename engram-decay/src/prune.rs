use chrono::{DateTime, Utc};

use engram_core::pattern::Pattern;

/// Prune eligibility check.
///
/// A pattern is prunable only when BOTH criteria hold: confidence below
/// the floor AND age beyond the retention threshold. Core-namespace
/// patterns are categorically protected regardless of either.
#[derive(Debug, Clone, Copy)]
pub struct PrunePolicy {
    pub confidence_floor: f64,
    pub age_days: i64,
}

/// Prune decision with metadata for logging.
#[derive(Debug, Clone)]
pub struct PruneDecision {
    pub pattern_id: String,
    pub should_prune: bool,
    pub confidence: f64,
    pub age_days: i64,
    pub reason: String,
}

/// Evaluate prune eligibility for a pattern.
pub fn evaluate(pattern: &Pattern, now: DateTime<Utc>, policy: &PrunePolicy) -> PruneDecision {
    let confidence = pattern.confidence.value();
    let age_days = (now - pattern.created_at).num_seconds().max(0) / 86_400;

    if pattern.is_core() {
        return PruneDecision {
            pattern_id: pattern.id.clone(),
            should_prune: false,
            confidence,
            age_days,
            reason: "core namespace is protected".to_string(),
        };
    }

    let low = confidence < policy.confidence_floor;
    let old = age_days > policy.age_days;
    let should_prune = low && old;
    let reason = if should_prune {
        format!(
            "confidence {confidence:.3} below floor {:.3} and age {age_days}d beyond {}d",
            policy.confidence_floor, policy.age_days
        )
    } else if !low {
        "confidence above floor".to_string()
    } else {
        "age within retention".to_string()
    };

    PruneDecision {
        pattern_id: pattern.id.clone(),
        should_prune,
        confidence,
        age_days,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use engram_core::models::Namespace;
    use engram_core::pattern::{Confidence, PatternPayload};

    fn make_pattern(confidence: f64, age_days: i64, core: bool) -> Pattern {
        let now = Utc::now();
        let payload = PatternPayload::Other(serde_json::json!({"note": "x"}));
        Pattern {
            id: "p-1".to_string(),
            kind: "note".to_string(),
            title: "t".to_string(),
            description: String::new(),
            payload: payload.clone(),
            confidence: Confidence::new(confidence),
            namespaces: if core {
                vec![Namespace::Core]
            } else {
                vec![Namespace::Project("proj".into())]
            },
            access_count: 0,
            last_accessed: now,
            created_at: now - Duration::days(age_days),
            content_hash: Pattern::compute_content_hash(&payload).unwrap(),
        }
    }

    const POLICY: PrunePolicy = PrunePolicy {
        confidence_floor: 0.25,
        age_days: 90,
    };

    #[test]
    fn requires_both_criteria() {
        let now = Utc::now();
        assert!(evaluate(&make_pattern(0.1, 120, false), now, &POLICY).should_prune);
        assert!(!evaluate(&make_pattern(0.1, 30, false), now, &POLICY).should_prune);
        assert!(!evaluate(&make_pattern(0.9, 120, false), now, &POLICY).should_prune);
    }

    #[test]
    fn core_namespace_is_never_prunable() {
        let now = Utc::now();
        let decision = evaluate(&make_pattern(0.01, 1000, true), now, &POLICY);
        assert!(!decision.should_prune);
        assert!(decision.reason.contains("core"));
    }
}
