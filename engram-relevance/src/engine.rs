//! RelevanceEngine: advisory suggestions on top of knowledge-graph search.
//!
//! The engine is a thin pipeline: fetch a widened candidate set from Tier 2,
//! re-score it with the four-factor scorer, truncate, annotate. It never
//! blocks or fails the caller's primary operation; any internal error is
//! logged and collapses to an empty suggestion list.

use chrono::Utc;
use tracing::{debug, info, warn};

use engram_core::config::RelevanceConfig;
use engram_core::models::{ContextReport, Suggestion};
use engram_core::{EngramResult, Namespace, Pattern, PatternPayload};
use engram_knowledge::KnowledgeGraph;

use crate::scorer;

/// Extra search candidates fetched per requested suggestion, so that
/// confidence, popularity, and recency can promote a pattern the text
/// score alone would have cut.
const CANDIDATE_FACTOR: usize = 4;

/// What the caller is working on right now.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    /// Free-text description of the task at hand.
    pub query: String,
    /// Namespace whose patterns should rank first, usually the active
    /// project.
    pub active_namespace: Option<Namespace>,
}

impl QueryContext {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            active_namespace: None,
        }
    }

    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.active_namespace = Some(namespace);
        self
    }
}

/// Advisory ranking over a knowledge graph.
///
/// Borrows the graph; construct one per query site and share the graph
/// behind `Arc` when several components need it.
pub struct RelevanceEngine<'a> {
    graph: &'a KnowledgeGraph,
    config: RelevanceConfig,
    /// Latest Tier 3 report, when the caller has one. Used only to attach
    /// cautions; absence never changes ranking.
    context_report: Option<ContextReport>,
}

impl<'a> RelevanceEngine<'a> {
    pub fn new(graph: &'a KnowledgeGraph, config: RelevanceConfig) -> Self {
        Self {
            graph,
            config,
            context_report: None,
        }
    }

    /// Attach a context report so suggestions can warn about files Tier 3
    /// currently classifies unstable.
    pub fn with_context_report(mut self, report: ContextReport) -> Self {
        self.context_report = Some(report);
        self
    }

    pub fn config(&self) -> &RelevanceConfig {
        &self.config
    }

    /// Rank the `top_k` most useful patterns for the given context.
    ///
    /// Advisory only: internal failures are logged and yield an empty
    /// list, never an error.
    pub fn suggest(&self, context: &QueryContext) -> Vec<Suggestion> {
        match self.try_suggest(context) {
            Ok(suggestions) => suggestions,
            Err(e) => {
                warn!(error = %e, "suggestion pipeline failed, returning no suggestions");
                Vec::new()
            }
        }
    }

    fn try_suggest(&self, context: &QueryContext) -> EngramResult<Vec<Suggestion>> {
        let top_k = self.config.top_k;
        if top_k == 0 || context.query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let candidate_limit = top_k.saturating_mul(CANDIDATE_FACTOR);
        let hits = self.graph.search(
            &context.query,
            context.active_namespace.as_ref(),
            Some(self.config.min_confidence),
            candidate_limit,
        )?;
        if hits.is_empty() {
            debug!("no candidates above the confidence floor");
            return Ok(Vec::new());
        }
        debug!(candidates = hits.len(), "scoring candidates");

        let mut suggestions = scorer::score_hits(hits, Utc::now(), &self.config);
        suggestions.truncate(top_k);
        for suggestion in &mut suggestions {
            suggestion.cautions = self.cautions_for(&suggestion.pattern);
        }

        info!(
            suggestions = suggestions.len(),
            top_score = suggestions.first().map(|s| s.score).unwrap_or(0.0),
            "suggestion pipeline complete"
        );
        Ok(suggestions)
    }

    /// Files referenced by the pattern that the attached report classifies
    /// unstable.
    fn cautions_for(&self, pattern: &Pattern) -> Vec<String> {
        let Some(report) = &self.context_report else {
            return Vec::new();
        };
        let PatternPayload::FileRelationship(content) = &pattern.payload else {
            return Vec::new();
        };
        let unstable = report.unstable_paths();
        content
            .files
            .iter()
            .filter(|file| unstable.contains(&file.as_str()))
            .cloned()
            .collect()
    }
}
