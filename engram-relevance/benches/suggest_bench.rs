use chrono::{Duration, Utc};
use criterion::{criterion_group, criterion_main, Criterion};

use engram_core::config::{KnowledgeConfig, RelevanceConfig};
use engram_core::pattern::{Confidence, Pattern, PatternPayload, WorkflowContent};
use engram_core::Namespace;
use engram_knowledge::KnowledgeGraph;
use engram_relevance::{QueryContext, RelevanceEngine};

const TOPICS: &[&str] = &[
    "sqlite busy timeout retry",
    "migrate schema add column",
    "rebase conflict resolution",
    "docker compose volume mount",
    "tracing subscriber env filter",
    "serde rename all snake case",
    "tokio spawn blocking pool",
    "regex capture group names",
];

fn make_pattern(i: usize) -> Pattern {
    let topic = TOPICS[i % TOPICS.len()];
    let payload = PatternPayload::Workflow(WorkflowContent {
        steps: vec![format!("{topic} step {i}")],
        trigger: Some(format!("when task {i} comes up")),
        outcome: None,
    });
    let content_hash = Pattern::compute_content_hash(&payload).unwrap();
    let touched = Utc::now() - Duration::days((i % 120) as i64);
    Pattern {
        id: format!("p{i}"),
        kind: "workflow".to_string(),
        title: format!("workflow {i}"),
        description: payload.describe(),
        payload,
        confidence: Confidence::new(0.3 + (i % 7) as f64 * 0.1),
        namespaces: vec![Namespace::Project(format!("proj{}", i % 5))],
        access_count: (i % 50) as u64,
        last_accessed: touched,
        created_at: touched,
        content_hash,
    }
}

/// In-memory graph at the scale the ranking path is expected to serve:
/// low thousands of patterns.
fn build_2k_pattern_graph() -> KnowledgeGraph {
    let graph = KnowledgeGraph::open_in_memory(KnowledgeConfig::default()).unwrap();
    for i in 0..2000 {
        graph.put_pattern(&make_pattern(i)).unwrap();
    }
    graph
}

fn bench_suggest(c: &mut Criterion) {
    let graph = build_2k_pattern_graph();
    let engine = RelevanceEngine::new(&graph, RelevanceConfig::default());
    let context =
        QueryContext::new("sqlite busy timeout").with_namespace(Namespace::Project("proj1".to_string()));

    c.bench_function("suggest_top_3_2k_patterns", |b| {
        b.iter(|| {
            engine.suggest(&context);
        });
    });
}

fn bench_search_only(c: &mut Criterion) {
    let graph = build_2k_pattern_graph();
    let namespace = Namespace::Project("proj1".to_string());

    c.bench_function("fts_search_2k_patterns", |b| {
        b.iter(|| {
            graph
                .search("sqlite busy timeout", Some(&namespace), None, 12)
                .unwrap();
        });
    });
}

criterion_group!(benches, bench_suggest, bench_search_only);
criterion_main!(benches);
