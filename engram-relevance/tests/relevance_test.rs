//! Relevance engine behavior: factor weighting, candidate gating,
//! fail-open surface, and stability cautions.
//!
//! Ranking tests plant patterns with identical searchable text (and
//! same-length titles, so BM25 length normalization cannot skew the text
//! score) and vary one stored signal at a time.

use chrono::{Duration, Utc};
use engram_core::config::{KnowledgeConfig, RelevanceConfig};
use engram_core::models::{ContextReport, FileStability, StabilityBand};
use engram_core::pattern::*;
use engram_core::Namespace;
use engram_knowledge::KnowledgeGraph;
use engram_relevance::{QueryContext, RelevanceEngine};

const SHARED_STEP: &str = "retry the sqlite write after a busy timeout";

fn make_pattern(id: &str, title: &str, confidence: f64, access_count: u64, days_ago: i64) -> Pattern {
    let payload = PatternPayload::Workflow(WorkflowContent {
        steps: vec![SHARED_STEP.to_string()],
        trigger: None,
        outcome: None,
    });
    let content_hash = Pattern::compute_content_hash(&payload).unwrap();
    let touched = Utc::now() - Duration::days(days_ago);
    Pattern {
        id: id.to_string(),
        kind: "workflow".to_string(),
        title: title.to_string(),
        description: payload.describe(),
        payload,
        confidence: Confidence::new(confidence),
        namespaces: vec![Namespace::Project("alpha".to_string())],
        access_count,
        last_accessed: touched,
        created_at: touched,
        content_hash,
    }
}

fn make_file_pattern(id: &str, files: &[&str]) -> Pattern {
    let payload = PatternPayload::FileRelationship(FileRelationshipContent {
        files: files.iter().map(|f| f.to_string()).collect(),
        relation: "edited together".to_string(),
    });
    let content_hash = Pattern::compute_content_hash(&payload).unwrap();
    Pattern {
        id: id.to_string(),
        kind: "file_relationship".to_string(),
        title: "files edited together".to_string(),
        description: payload.describe(),
        payload,
        confidence: Confidence::new(0.8),
        namespaces: vec![Namespace::Project("alpha".to_string())],
        access_count: 0,
        last_accessed: Utc::now(),
        created_at: Utc::now(),
        content_hash,
    }
}

fn stability(path: &str, band: StabilityBand) -> FileStability {
    FileStability {
        path: path.to_string(),
        window_start: Utc::now() - Duration::days(30),
        window_end: Utc::now(),
        commit_count: 5,
        edit_count: 5,
        churn_rate: 0.5,
        band,
    }
}

fn report_with(files: Vec<FileStability>) -> ContextReport {
    ContextReport {
        collected_at: Utc::now(),
        window_days: 30,
        file_stability: files,
        velocity: None,
        insights: Vec::new(),
        degraded: false,
    }
}

fn graph() -> KnowledgeGraph {
    KnowledgeGraph::open_in_memory(KnowledgeConfig::default()).unwrap()
}

fn ctx(query: &str) -> QueryContext {
    QueryContext::new(query).with_namespace(Namespace::Project("alpha".to_string()))
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ═══════════════════════════════════════════════════════════════════════
// Factor weighting
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn suggestions_rank_by_composite_score() {
    let graph = graph();
    // Same text everywhere; confidence, popularity, and recency differ.
    // Under the default weights the heavily-used 0.6-confidence pattern
    // (popularity 40/50 = 0.8) outscores the unused 0.9-confidence one:
    // 0.84 vs 0.77. The stale one trails on recency.
    graph
        .put_pattern(&make_pattern("confident", "pattern alpha", 0.9, 0, 0))
        .unwrap();
    graph
        .put_pattern(&make_pattern("popular", "pattern bravo", 0.6, 40, 0))
        .unwrap();
    graph
        .put_pattern(&make_pattern("stale", "pattern charlie", 0.5, 0, 60))
        .unwrap();

    let engine = RelevanceEngine::new(&graph, RelevanceConfig::default());
    let suggestions = engine.suggest(&ctx("sqlite busy timeout"));

    let ids: Vec<&str> = suggestions.iter().map(|s| s.pattern.id.as_str()).collect();
    assert_eq!(ids, vec!["popular", "confident", "stale"]);
    assert!(suggestions[0].score > suggestions[1].score);
    assert!(suggestions[1].score > suggestions[2].score);
}

#[test]
fn factor_breakdown_is_reported() {
    let graph = graph();
    graph
        .put_pattern(&make_pattern("only", "pattern alpha", 0.8, 10, 0))
        .unwrap();

    let engine = RelevanceEngine::new(&graph, RelevanceConfig::default());
    let suggestions = engine.suggest(&ctx("sqlite busy timeout"));

    assert_eq!(suggestions.len(), 1);
    let s = &suggestions[0];
    // Sole candidate: its own text score is the per-query maximum.
    assert!(close(s.factors.text_relevance, 1.0));
    assert!(close(s.factors.confidence, 0.8));
    // Access count at the half-saturation default of 10.
    assert!(close(s.factors.popularity, 0.5));
    assert!(close(s.factors.recency, 1.0));
    // 0.4*1.0 + 0.3*0.8 + 0.2*0.5 + 0.1*1.0 with weights summing to 1.
    assert!(close(s.score, 0.84));
}

#[test]
fn higher_confidence_wins_on_equal_text() {
    let graph = graph();
    graph
        .put_pattern(&make_pattern("sure", "pattern alpha", 0.9, 0, 0))
        .unwrap();
    graph
        .put_pattern(&make_pattern("shaky", "pattern bravo", 0.5, 0, 0))
        .unwrap();

    let engine = RelevanceEngine::new(&graph, RelevanceConfig::default());
    let suggestions = engine.suggest(&ctx("sqlite busy timeout"));
    assert_eq!(suggestions[0].pattern.id, "sure");
}

#[test]
fn popularity_breaks_equal_confidence() {
    let graph = graph();
    graph
        .put_pattern(&make_pattern("used", "pattern alpha", 0.7, 100, 0))
        .unwrap();
    graph
        .put_pattern(&make_pattern("untouched", "pattern bravo", 0.7, 0, 0))
        .unwrap();

    let engine = RelevanceEngine::new(&graph, RelevanceConfig::default());
    let suggestions = engine.suggest(&ctx("sqlite busy timeout"));
    assert_eq!(suggestions[0].pattern.id, "used");
    assert!(suggestions[0].factors.popularity > suggestions[1].factors.popularity);
}

#[test]
fn recency_breaks_equal_popularity() {
    let graph = graph();
    graph
        .put_pattern(&make_pattern("fresh", "pattern alpha", 0.7, 5, 0))
        .unwrap();
    graph
        .put_pattern(&make_pattern("dusty", "pattern bravo", 0.7, 5, 60))
        .unwrap();

    let engine = RelevanceEngine::new(&graph, RelevanceConfig::default());
    let suggestions = engine.suggest(&ctx("sqlite busy timeout"));
    assert_eq!(suggestions[0].pattern.id, "fresh");
    assert!(suggestions[0].factors.recency > suggestions[1].factors.recency);
}

// ═══════════════════════════════════════════════════════════════════════
// Candidate gating
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn low_confidence_candidates_are_excluded_before_scoring() {
    let graph = graph();
    graph
        .put_pattern(&make_pattern("kept", "pattern alpha", 0.5, 0, 0))
        .unwrap();
    // Below the 0.30 default floor despite a perfect text match.
    graph
        .put_pattern(&make_pattern("floored", "pattern bravo", 0.2, 0, 0))
        .unwrap();

    let engine = RelevanceEngine::new(&graph, RelevanceConfig::default());
    let suggestions = engine.suggest(&ctx("sqlite busy timeout"));
    let ids: Vec<&str> = suggestions.iter().map(|s| s.pattern.id.as_str()).collect();
    assert_eq!(ids, vec!["kept"]);

    let open_floor = RelevanceConfig {
        min_confidence: 0.0,
        ..RelevanceConfig::default()
    };
    let engine = RelevanceEngine::new(&graph, open_floor);
    assert_eq!(engine.suggest(&ctx("sqlite busy timeout")).len(), 2);
}

#[test]
fn active_namespace_outranks_other_projects() {
    let graph = graph();
    graph
        .put_pattern(&make_pattern("mine", "pattern alpha", 0.5, 0, 0))
        .unwrap();
    let mut foreign = make_pattern("theirs", "pattern bravo", 0.6, 0, 0);
    foreign.namespaces = vec![Namespace::Project("bravo".to_string())];
    graph.put_pattern(&foreign).unwrap();

    // The active-namespace multiplier outweighs the confidence edge.
    let engine = RelevanceEngine::new(&graph, RelevanceConfig::default());
    let suggestions = engine.suggest(&ctx("sqlite busy timeout"));
    assert_eq!(suggestions[0].pattern.id, "mine");
    assert!(suggestions[0].factors.text_relevance > suggestions[1].factors.text_relevance);
}

#[test]
fn top_k_bounds_the_result() {
    let graph = graph();
    for i in 0..6 {
        graph
            .put_pattern(&make_pattern(
                &format!("p{i}"),
                "pattern alpha",
                0.5,
                0,
                0,
            ))
            .unwrap();
    }

    let two = RelevanceConfig {
        top_k: 2,
        ..RelevanceConfig::default()
    };
    let engine = RelevanceEngine::new(&graph, two);
    assert_eq!(engine.suggest(&ctx("sqlite busy timeout")).len(), 2);

    let none = RelevanceConfig {
        top_k: 0,
        ..RelevanceConfig::default()
    };
    let engine = RelevanceEngine::new(&graph, none);
    assert!(engine.suggest(&ctx("sqlite busy timeout")).is_empty());
}

// ═══════════════════════════════════════════════════════════════════════
// Fail-open surface
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn empty_store_suggests_nothing() {
    let graph = graph();
    let engine = RelevanceEngine::new(&graph, RelevanceConfig::default());
    assert!(engine.suggest(&ctx("anything at all")).is_empty());
}

#[test]
fn blank_query_suggests_nothing() {
    let graph = graph();
    graph
        .put_pattern(&make_pattern("only", "pattern alpha", 0.8, 0, 0))
        .unwrap();
    let engine = RelevanceEngine::new(&graph, RelevanceConfig::default());
    assert!(engine.suggest(&ctx("   ")).is_empty());
}

#[test]
fn operator_heavy_query_never_panics() {
    let graph = graph();
    graph
        .put_pattern(&make_pattern("only", "pattern alpha", 0.8, 0, 0))
        .unwrap();
    let engine = RelevanceEngine::new(&graph, RelevanceConfig::default());
    // FTS5 operators and stray quotes must be neutralized, not parsed.
    let suggestions = engine.suggest(&ctx("\"NEAR( OR AND * \""));
    assert!(suggestions.is_empty());
}

// ═══════════════════════════════════════════════════════════════════════
// Stability cautions
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn unstable_files_attach_cautions() {
    let graph = graph();
    graph
        .put_pattern(&make_file_pattern("pair", &["src/io.rs", "src/lib.rs"]))
        .unwrap();

    let report = report_with(vec![
        stability("src/io.rs", StabilityBand::Unstable),
        stability("src/lib.rs", StabilityBand::Stable),
        stability("src/other.rs", StabilityBand::Unstable),
    ]);
    let engine = RelevanceEngine::new(&graph, RelevanceConfig::default()).with_context_report(report);

    let suggestions = engine.suggest(&ctx("edited together"));
    assert_eq!(suggestions.len(), 1);
    // Only the overlap between the pattern's files and the unstable set.
    assert_eq!(suggestions[0].cautions, vec!["src/io.rs".to_string()]);
}

#[test]
fn cautions_are_empty_without_a_report() {
    let graph = graph();
    graph
        .put_pattern(&make_file_pattern("pair", &["src/io.rs", "src/lib.rs"]))
        .unwrap();

    let engine = RelevanceEngine::new(&graph, RelevanceConfig::default());
    let suggestions = engine.suggest(&ctx("edited together"));
    assert_eq!(suggestions.len(), 1);
    assert!(suggestions[0].cautions.is_empty());
}

#[test]
fn non_file_patterns_never_carry_cautions() {
    let graph = graph();
    graph
        .put_pattern(&make_pattern("flow", "pattern alpha", 0.8, 0, 0))
        .unwrap();

    let report = report_with(vec![stability("src/io.rs", StabilityBand::Unstable)]);
    let engine = RelevanceEngine::new(&graph, RelevanceConfig::default()).with_context_report(report);

    let suggestions = engine.suggest(&ctx("sqlite busy timeout"));
    assert_eq!(suggestions.len(), 1);
    assert!(suggestions[0].cautions.is_empty());
}
