//! Background passes: decay, consolidation, prune, and namespace reset.

use chrono::{Duration, Utc};
use engram_core::config::KnowledgeConfig;
use engram_core::pattern::*;
use engram_core::{CancelToken, EngramError, Namespace};
use engram_knowledge::KnowledgeGraph;

fn make_pattern(id: &str, title: &str, confidence: f64) -> Pattern {
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
        access_count: 0,
        last_accessed: Utc::now(),
        created_at: Utc::now(),
        content_hash,
    }
}

fn graph() -> KnowledgeGraph {
    KnowledgeGraph::open_in_memory(KnowledgeConfig::default()).unwrap()
}

// ═══════════════════════════════════════════════════════════════════════
// Decay
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn decay_reduces_idle_confidence_monotonically() {
    let graph = graph();
    let mut idle = make_pattern("idle", "stale but once useful", 0.90);
    idle.last_accessed = Utc::now() - Duration::days(40);
    graph.put_pattern(&idle).unwrap();

    let report = graph.decay_pass(&CancelToken::default()).unwrap();
    assert_eq!(report.examined, 1);
    assert_eq!(report.decayed, 1);

    // Defaults: decay starts after 30 idle days at 2% per day.
    let got = graph.get("idle").unwrap().confidence.value();
    let expected = 0.90 * 0.98f64.powi(10);
    assert!((got - expected).abs() < 1e-9);
    assert!(got < 0.90);
    assert!(got >= 0.0);
}

#[test]
fn decay_leaves_recently_accessed_patterns_alone() {
    let graph = graph();
    graph
        .put_pattern(&make_pattern("fresh", "used this morning", 0.90))
        .unwrap();

    let report = graph.decay_pass(&CancelToken::default()).unwrap();
    assert_eq!(report.decayed, 0);
    assert_eq!(graph.get("fresh").unwrap().confidence.value(), 0.90);
}

#[test]
fn core_patterns_decay_but_are_never_pruned() {
    let graph = graph();
    let mut core = make_pattern("core-old", "org wide convention", 0.90);
    core.namespaces = vec![Namespace::Core];
    core.last_accessed = Utc::now() - Duration::days(60);
    core.created_at = Utc::now() - Duration::days(400);
    graph.put_pattern(&core).unwrap();

    graph.decay_pass(&CancelToken::default()).unwrap();
    let decayed = graph.get("core-old").unwrap().confidence.value();
    assert!(decayed < 0.90, "core confidence still decays");

    // Push it far below the prune floor; the prune pass must skip it.
    let mut weak = graph.get("core-old").unwrap();
    weak.confidence = Confidence::new(0.01);
    graph.put_pattern(&weak).unwrap();

    let report = graph.prune_pass(&CancelToken::default()).unwrap();
    assert_eq!(report.pruned, 0);
    assert!(graph.find("core-old").unwrap().is_some());
}

// ═══════════════════════════════════════════════════════════════════════
// Consolidation
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn consolidation_merges_overlapping_patterns() {
    let graph = graph();
    let mut a = make_pattern("a", "deploy api service run smoke tests", 0.80);
    a.access_count = 10;
    let mut b = make_pattern("b", "deploy api service run integration tests", 0.60);
    b.access_count = 5;
    graph.put_pattern(&a).unwrap();
    graph.put_pattern(&b).unwrap();

    let report = graph.consolidate_pass(&CancelToken::default()).unwrap();
    assert_eq!(report.merged, 1);
    assert_eq!(report.duplicates_collapsed, 0);

    let survivors = graph.list().unwrap();
    assert_eq!(survivors.len(), 1);
    let merged = &survivors[0];
    assert_eq!(merged.id, "a", "higher-confidence side keeps identity");
    let expected = (0.80 * 10.0 + 0.60 * 5.0) / 15.0;
    assert!((merged.confidence.value() - expected).abs() < 1e-9);
    assert_eq!(merged.access_count, 15);
}

#[test]
fn consolidation_is_idempotent() {
    let graph = graph();
    let mut a = make_pattern("a", "deploy api service run smoke tests", 0.80);
    a.access_count = 10;
    let mut b = make_pattern("b", "deploy api service run integration tests", 0.60);
    b.access_count = 5;
    graph.put_pattern(&a).unwrap();
    graph.put_pattern(&b).unwrap();

    graph.consolidate_pass(&CancelToken::default()).unwrap();
    let after_first = graph.list().unwrap();

    let second = graph.consolidate_pass(&CancelToken::default()).unwrap();
    assert_eq!(second.candidate_pairs, 0);
    assert_eq!(second.merged, 0);
    assert_eq!(second.duplicates_collapsed, 0);

    let after_second = graph.list().unwrap();
    assert_eq!(after_first.len(), after_second.len());
    assert_eq!(
        after_first[0].confidence.value(),
        after_second[0].confidence.value()
    );
    assert_eq!(after_first[0].access_count, after_second[0].access_count);
}

#[test]
fn consolidation_collapses_exact_duplicates_keeping_stronger() {
    let graph = graph();
    let weak = make_pattern("weak", "restart worker pool on deploy", 0.60);
    let mut strong = make_pattern("strong", "restart worker pool on deploy", 0.90);
    strong.access_count = 2;
    graph.put_pattern(&weak).unwrap();
    graph.put_pattern(&strong).unwrap();

    let report = graph.consolidate_pass(&CancelToken::default()).unwrap();
    assert_eq!(report.duplicates_collapsed, 1);
    assert_eq!(report.merged, 0);

    let survivors = graph.list().unwrap();
    assert_eq!(survivors.len(), 1);
    assert_eq!(survivors[0].id, "strong");
    assert_eq!(survivors[0].confidence.value(), 0.90);
    assert_eq!(survivors[0].access_count, 2, "duplicate collapse leaves the survivor untouched");
}

#[test]
fn consolidation_never_crosses_kinds() {
    let graph = graph();
    graph
        .put_pattern(&make_pattern("wf", "open the settings panel", 0.8))
        .unwrap();

    let mut intent = make_pattern("im", "open the settings panel", 0.8);
    intent.kind = "intent_mapping".to_string();
    intent.payload = PatternPayload::IntentMapping(IntentMappingContent {
        phrasing: "open the settings panel".into(),
        action: "settings.open".into(),
        examples: vec![],
    });
    intent.content_hash = Pattern::compute_content_hash(&intent.payload).unwrap();
    intent.description = intent.payload.describe();
    graph.put_pattern(&intent).unwrap();

    let report = graph.consolidate_pass(&CancelToken::default()).unwrap();
    assert_eq!(report.candidate_pairs, 0);
    assert_eq!(graph.list().unwrap().len(), 2);
}

// ═══════════════════════════════════════════════════════════════════════
// Prune and namespace reset
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn prune_requires_both_weak_and_old() {
    let graph = graph();
    // Defaults: floor 0.25, retention 90 days.
    let mut doomed = make_pattern("doomed", "weak and ancient", 0.10);
    doomed.created_at = Utc::now() - Duration::days(120);
    graph.put_pattern(&doomed).unwrap();

    let mut young_weak = make_pattern("young-weak", "weak but recent", 0.10);
    young_weak.created_at = Utc::now() - Duration::days(5);
    graph.put_pattern(&young_weak).unwrap();

    let mut old_strong = make_pattern("old-strong", "old but trusted", 0.90);
    old_strong.created_at = Utc::now() - Duration::days(400);
    graph.put_pattern(&old_strong).unwrap();

    let report = graph.prune_pass(&CancelToken::default()).unwrap();
    assert_eq!(report.examined, 3);
    assert_eq!(report.pruned, 1);
    assert!(graph.find("doomed").unwrap().is_none());
    assert!(graph.find("young-weak").unwrap().is_some());
    assert!(graph.find("old-strong").unwrap().is_some());
}

#[test]
fn reset_namespace_strips_tags_and_deletes_orphans() {
    let graph = graph();
    let mut only_alpha = make_pattern("only-alpha", "alpha trick", 0.8);
    only_alpha.namespaces = vec![Namespace::Project("alpha".into())];
    graph.put_pattern(&only_alpha).unwrap();

    let mut shared = make_pattern("shared", "shared convention", 0.8);
    shared.namespaces = vec![Namespace::Project("alpha".into()), Namespace::Core];
    graph.put_pattern(&shared).unwrap();

    let mut other = make_pattern("other", "beta trick", 0.8);
    other.namespaces = vec![Namespace::Project("beta".into())];
    graph.put_pattern(&other).unwrap();

    let deleted = graph
        .reset_namespace(&Namespace::Project("alpha".into()))
        .unwrap();
    assert_eq!(deleted, 1);
    assert!(graph.find("only-alpha").unwrap().is_none());
    assert_eq!(
        graph.get("shared").unwrap().namespaces,
        vec![Namespace::Core]
    );
    assert!(graph.find("other").unwrap().is_some());
}

#[test]
fn core_namespace_cannot_be_reset() {
    let graph = graph();
    assert!(matches!(
        graph.reset_namespace(&Namespace::Core),
        Err(EngramError::Validation { .. })
    ));
}

// ═══════════════════════════════════════════════════════════════════════
// Cancellation
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn cancelled_passes_stop_before_touching_items() {
    let graph = graph();
    let mut idle = make_pattern("idle", "would otherwise decay", 0.90);
    idle.last_accessed = Utc::now() - Duration::days(60);
    idle.created_at = Utc::now() - Duration::days(120);
    idle.confidence = Confidence::new(0.10);
    graph.put_pattern(&idle).unwrap();

    let cancel = CancelToken::default();
    cancel.cancel();

    let decay = graph.decay_pass(&cancel).unwrap();
    assert!(decay.cancelled);
    assert_eq!(decay.examined, 0);
    assert_eq!(decay.decayed, 0);

    let prune = graph.prune_pass(&cancel).unwrap();
    assert!(prune.cancelled);
    assert_eq!(prune.pruned, 0);
    assert!(graph.find("idle").unwrap().is_some());
}
