//! Merge behavior across the similarity bands.
//!
//! Covers duplicate collapse, occurrence-weighted merging, the distinct
//! band, and property checks on the weighted average.

use chrono::{Duration, Utc};
use engram_consolidate::{
    evaluate, evaluate_pair, merge_patterns, pattern_similarity, weighted_confidence,
    MergeOutcome, MergePolicy,
};
use engram_core::pattern::*;
use engram_core::Namespace;
use proptest::prelude::*;

fn make_pattern(id: &str, title: &str, confidence: f64, access_count: u64) -> Pattern {
    let payload = PatternPayload::Workflow(WorkflowContent {
        steps: vec![title.to_string()],
        trigger: None,
        outcome: None,
    });
    let content_hash = Pattern::compute_content_hash(&payload).unwrap();
    Pattern {
        id: id.to_string(),
        kind: "workflow".to_string(),
        title: title.to_string(),
        description: payload.describe(),
        payload,
        confidence: Confidence::new(confidence),
        namespaces: vec![Namespace::Project("proj".into())],
        access_count,
        last_accessed: Utc::now(),
        created_at: Utc::now(),
        content_hash,
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Merge band: occurrence-weighted averaging
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn merge_band_produces_occurrence_weighted_confidence() {
    // Access counts 10 and 5 at confidence 0.80 and 0.60: the merged
    // confidence is (0.80*10 + 0.60*5) / 15.
    let a = make_pattern("a", "deploy service after tests", 0.80, 10);
    let b = make_pattern("b", "deploy the service after tests run", 0.60, 5);

    let outcome = evaluate(&a, &b, 0.95, &MergePolicy::default());
    match outcome {
        MergeOutcome::Merged {
            merged,
            absorbed_id,
            similarity,
        } => {
            let expected = (0.80 * 10.0 + 0.60 * 5.0) / 15.0;
            assert!((merged.confidence.value() - expected).abs() < 1e-9);
            assert!((merged.confidence.value() - 0.733).abs() < 1e-3);
            assert_eq!(merged.access_count, 15);
            assert_eq!(merged.id, "a", "higher-confidence side keeps identity");
            assert_eq!(absorbed_id, "b");
            assert!((similarity - 0.95).abs() < 1e-9);
        }
        other => panic!("expected Merged, got {other:?}"),
    }
}

#[test]
fn merge_with_no_accesses_falls_back_to_plain_mean() {
    let a = make_pattern("a", "cache invalidation steps", 0.90, 0);
    let b = make_pattern("b", "cache invalidation order", 0.50, 0);
    assert!((weighted_confidence(&a, &b) - 0.70).abs() < 1e-9);

    let merged = merge_patterns(&a, &b);
    assert!((merged.confidence.value() - 0.70).abs() < 1e-9);
    assert_eq!(merged.access_count, 0);
}

#[test]
fn merge_unions_namespaces_and_keeps_extremal_timestamps() {
    let now = Utc::now();
    let mut a = make_pattern("a", "rotate credentials quarterly", 0.80, 4);
    let mut b = make_pattern("b", "rotate credentials each quarter", 0.70, 2);
    a.namespaces = vec![Namespace::Project("alpha".into())];
    b.namespaces = vec![Namespace::Project("beta".into()), Namespace::Core];
    a.created_at = now - Duration::days(40);
    b.created_at = now - Duration::days(90);
    a.last_accessed = now - Duration::days(1);
    b.last_accessed = now - Duration::days(30);

    let merged = merge_patterns(&a, &b);
    assert_eq!(merged.namespaces.len(), 3);
    assert!(merged.namespaces.contains(&Namespace::Core));
    assert_eq!(merged.created_at, now - Duration::days(90));
    assert_eq!(merged.last_accessed, now - Duration::days(1));
    assert_eq!(merged.title, "rotate credentials quarterly");
}

// ═══════════════════════════════════════════════════════════════════════
// Duplicate band: stronger side survives untouched
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn duplicate_band_keeps_higher_confidence_unchanged() {
    let a = make_pattern("a", "run clippy before pushing", 0.65, 3);
    let b = make_pattern("b", "run clippy before pushing", 0.85, 1);

    let outcome = evaluate(&a, &b, 0.99, &MergePolicy::default());
    match outcome {
        MergeOutcome::Duplicate {
            survivor,
            absorbed_id,
            ..
        } => {
            assert_eq!(survivor.id, "b");
            assert_eq!(survivor.confidence.value(), 0.85);
            assert_eq!(survivor.access_count, 1, "survivor is not modified");
            assert_eq!(absorbed_id, "a");
        }
        other => panic!("expected Duplicate, got {other:?}"),
    }
}

#[test]
fn identical_payload_hashes_pair_as_duplicate() {
    let a = make_pattern("a", "restart worker pool on deploy", 0.70, 0);
    let mut b = make_pattern("b", "restart worker pool on deploy", 0.60, 0);
    b.content_hash = a.content_hash.clone();

    assert!((pattern_similarity(&a, &b) - 1.0).abs() < 1e-9);
    let outcome = evaluate_pair(&a, &b, &MergePolicy::default());
    assert!(matches!(outcome, MergeOutcome::Duplicate { .. }));
}

// ═══════════════════════════════════════════════════════════════════════
// Distinct band
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn below_merge_band_stays_distinct() {
    let a = make_pattern("a", "database backup rotation", 0.80, 5);
    let b = make_pattern("b", "frontend bundle splitting", 0.80, 5);

    let outcome = evaluate_pair(&a, &b, &MergePolicy::default());
    match outcome {
        MergeOutcome::Distinct { similarity } => assert!(similarity < 0.70),
        other => panic!("expected Distinct, got {other:?}"),
    }
    assert!(!outcome.is_change());
}

#[test]
fn different_kinds_never_pair() {
    let a = make_pattern("a", "open the settings panel", 0.80, 5);
    let mut b = make_pattern("b", "open the settings panel", 0.80, 5);
    b.kind = "intent_mapping".to_string();
    b.payload = PatternPayload::IntentMapping(IntentMappingContent {
        phrasing: "open the settings panel".into(),
        action: "settings.open".into(),
        examples: vec![],
    });
    b.content_hash = Pattern::compute_content_hash(&b.payload).unwrap();

    assert_eq!(pattern_similarity(&a, &b), 0.0);
    assert!(matches!(
        evaluate_pair(&a, &b, &MergePolicy::default()),
        MergeOutcome::Distinct { .. }
    ));
}

#[test]
fn policy_orders_its_thresholds() {
    let policy = MergePolicy::new(0.9, 0.5);
    assert!(policy.duplicate_threshold >= policy.merge_threshold);

    let outcome = evaluate(
        &make_pattern("a", "x", 0.5, 0),
        &make_pattern("b", "y", 0.5, 0),
        0.95,
        &policy,
    );
    assert!(matches!(outcome, MergeOutcome::Duplicate { .. }));
}

// ═══════════════════════════════════════════════════════════════════════
// Properties
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn merged_confidence_stays_between_inputs(
        conf_a in 0.0f64..=1.0,
        conf_b in 0.0f64..=1.0,
        count_a in 0u64..1_000,
        count_b in 0u64..1_000,
    ) {
        let a = make_pattern("a", "left", conf_a, count_a);
        let b = make_pattern("b", "right", conf_b, count_b);
        let merged = weighted_confidence(&a, &b);
        let lo = conf_a.min(conf_b);
        let hi = conf_a.max(conf_b);
        prop_assert!(merged >= lo - 1e-9 && merged <= hi + 1e-9);
        prop_assert!((0.0..=1.0).contains(&merged));
    }

    #[test]
    fn evaluate_is_total_over_similarity(sim in -0.5f64..1.5) {
        let a = make_pattern("a", "left", 0.6, 1);
        let b = make_pattern("b", "right", 0.4, 2);
        let outcome = evaluate(&a, &b, sim, &MergePolicy::default());
        prop_assert!((outcome.similarity() - sim).abs() < 1e-9);
    }

    #[test]
    fn merge_never_loses_access_counts(
        count_a in 0u64..10_000,
        count_b in 0u64..10_000,
    ) {
        let a = make_pattern("a", "left side", 0.9, count_a);
        let b = make_pattern("b", "right side", 0.2, count_b);
        let merged = merge_patterns(&a, &b);
        prop_assert_eq!(merged.access_count, count_a + count_b);
    }
}
