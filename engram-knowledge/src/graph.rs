//! The knowledge graph engine: validated writes, ranked search, and the
//! background passes (decay, consolidation, prune).

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use engram_consolidate::{evaluate, similarity, MergeOutcome, MergePolicy};
use engram_core::config::KnowledgeConfig;
use engram_core::models::{AuditRecord, KnowledgeStats};
use engram_core::traits::{IPatternSink, IWritePolicy, PolicyVerdict};
use engram_core::{
    CancelToken, EngramError, EngramResult, Namespace, Pattern, PatternDraft,
};
use engram_decay::{DecayPolicy, PrunePolicy};
use engram_store::Store;

use crate::migrations;
use crate::queries::{audit_ops, pattern_crud, pattern_search};

/// Extra FTS candidates fetched per requested result, re-ranked after
/// namespace multipliers are applied.
const CANDIDATE_FACTOR: usize = 4;

/// One ranked search result.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub pattern: Pattern,
    /// Raw text relevance from the FTS index.
    pub text_score: f64,
    /// `text_score` with the namespace multiplier applied; the sort key.
    pub relevance: f64,
}

/// Counters from one decay pass.
#[derive(Debug, Clone, Default)]
pub struct DecayPassReport {
    pub examined: usize,
    pub decayed: usize,
    pub cancelled: bool,
}

/// Counters from one consolidation pass.
#[derive(Debug, Clone, Default)]
pub struct ConsolidatePassReport {
    pub candidate_pairs: usize,
    pub duplicates_collapsed: usize,
    pub merged: usize,
    pub skipped_pairs: usize,
    pub cancelled: bool,
}

/// Counters from one prune pass.
#[derive(Debug, Clone, Default)]
pub struct PrunePassReport {
    pub examined: usize,
    pub pruned: usize,
    pub cancelled: bool,
}

/// Tier 2: long-lived patterns with ranked retrieval.
///
/// Owns its store handle; callers construct one per knowledge database
/// and share it behind `Arc` when several components need it.
pub struct KnowledgeGraph {
    store: Store,
    config: KnowledgeConfig,
    write_policy: Option<Arc<dyn IWritePolicy>>,
}

impl KnowledgeGraph {
    pub fn open(path: &Path, config: KnowledgeConfig) -> EngramResult<Self> {
        let store = Store::open(path, &migrations::migrations())?;
        Ok(Self {
            store,
            config,
            write_policy: None,
        })
    }

    pub fn open_in_memory(config: KnowledgeConfig) -> EngramResult<Self> {
        let store = Store::open_in_memory(&migrations::migrations())?;
        Ok(Self {
            store,
            config,
            write_policy: None,
        })
    }

    /// Install a governance hook consulted before every insert.
    pub fn with_write_policy(mut self, policy: Arc<dyn IWritePolicy>) -> Self {
        self.write_policy = Some(policy);
        self
    }

    pub fn config(&self) -> &KnowledgeConfig {
        &self.config
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Validate and insert a new pattern, returning its id.
    ///
    /// Storing content that already exists verbatim does not create a
    /// second record; the existing pattern takes an access bump and
    /// keeps its id.
    pub fn store_pattern(&self, draft: PatternDraft) -> EngramResult<String> {
        let pattern = self.admit(draft)?;

        let existing = self
            .store
            .with_reader(|conn| pattern_crud::find_by_content_hash(conn, &pattern.content_hash))?;
        if let Some(existing) = existing {
            self.store
                .with_writer(|conn| pattern_crud::record_access(conn, &existing.id, Utc::now()))?;
            tracing::debug!(pattern_id = %existing.id, "store_pattern matched existing content");
            return Ok(existing.id);
        }

        if let Some(policy) = &self.write_policy {
            if let PolicyVerdict::Deny { reason } = policy.review(&pattern)? {
                return Err(EngramError::Validation { reason });
            }
        }

        self.store
            .with_writer(|conn| pattern_crud::insert_pattern(conn, &pattern))?;
        tracing::debug!(pattern_id = %pattern.id, kind = %pattern.kind, "stored pattern");
        Ok(pattern.id)
    }

    /// Ranked full-text search.
    ///
    /// Text relevance comes from the FTS index; the caller's active
    /// namespace boosts its own patterns ahead of core, and core ahead
    /// of other projects' patterns. With no active namespace, project
    /// patterns rank neutrally. Ties break by confidence, then recency.
    pub fn search(
        &self,
        query: &str,
        active_namespace: Option<&Namespace>,
        min_confidence: Option<f64>,
        limit: usize,
    ) -> EngramResult<Vec<SearchHit>> {
        let Some(match_query) = pattern_search::build_match_query(query) else {
            return Ok(Vec::new());
        };
        if limit == 0 {
            return Ok(Vec::new());
        }

        let floor = min_confidence.unwrap_or(0.0);
        let candidate_limit = limit.saturating_mul(CANDIDATE_FACTOR);
        let candidates = self.store.with_reader(|conn| {
            pattern_search::search_fts(conn, &match_query, floor, candidate_limit)
        })?;

        let mut hits: Vec<SearchHit> = candidates
            .into_iter()
            .map(|hit| {
                let multiplier = self.namespace_multiplier(&hit.pattern, active_namespace);
                SearchHit {
                    relevance: hit.text_score * multiplier,
                    text_score: hit.text_score,
                    pattern: hit.pattern,
                }
            })
            .collect();

        hits.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
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
        hits.truncate(limit);
        Ok(hits)
    }

    /// Fetch by id; unknown ids are an error.
    pub fn get(&self, id: &str) -> EngramResult<Pattern> {
        self.find(id)?
            .ok_or_else(|| EngramError::PatternNotFound { id: id.to_string() })
    }

    /// Fetch by id, `None` when absent.
    pub fn find(&self, id: &str) -> EngramResult<Option<Pattern>> {
        self.store
            .with_reader(|conn| pattern_crud::get_pattern(conn, id))
    }

    /// All patterns, oldest first.
    pub fn list(&self) -> EngramResult<Vec<Pattern>> {
        self.store.with_reader(pattern_crud::list_patterns)
    }

    /// Delete by id. Explicit deletion is allowed even for core
    /// patterns; only the background passes treat core as protected.
    pub fn delete(&self, id: &str) -> EngramResult<()> {
        let deleted = self
            .store
            .with_writer(|conn| pattern_crud::delete_pattern(conn, id))?;
        if !deleted {
            return Err(EngramError::PatternNotFound { id: id.to_string() });
        }
        Ok(())
    }

    /// Record one use of a pattern.
    pub fn record_access(&self, id: &str) -> EngramResult<()> {
        self.store
            .with_writer(|conn| pattern_crud::record_access(conn, id, Utc::now()))
    }

    /// Insert or overwrite a fully-formed pattern under its own id.
    ///
    /// The import reconciler uses this to apply decided outcomes;
    /// interactive writes go through [`KnowledgeGraph::store_pattern`].
    pub fn put_pattern(&self, pattern: &Pattern) -> EngramResult<()> {
        self.store.with_writer(|conn| {
            if pattern_crud::get_pattern(conn, &pattern.id)?.is_some() {
                pattern_crud::update_pattern(conn, pattern)
            } else {
                pattern_crud::insert_pattern(conn, pattern)
            }
        })
    }

    /// Atomically upsert a merged pattern and drop the absorbed record.
    pub fn apply_merge(&self, merged: &Pattern, absorbed_id: &str) -> EngramResult<()> {
        self.store
            .with_writer(|conn| pattern_crud::apply_merge(conn, merged, absorbed_id))
    }

    /// Apply time-based confidence decay to every idle pattern.
    ///
    /// Each write is its own transaction, so cancelling between items
    /// leaves no partial state. Core patterns decay like any other;
    /// only deletion is protected for them.
    pub fn decay_pass(&self, cancel: &CancelToken) -> EngramResult<DecayPassReport> {
        let policy = DecayPolicy::new(self.config.decay_after_days, self.config.decay_rate_per_day);
        let now = Utc::now();
        let patterns = self.list()?;

        let mut report = DecayPassReport::default();
        for pattern in patterns {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            report.examined += 1;
            let current = pattern.confidence.value();
            let decayed = engram_decay::compute(current, pattern.last_accessed, now, &policy);
            if decayed < current {
                self.store
                    .with_writer(|conn| pattern_crud::set_confidence(conn, &pattern.id, decayed))?;
                report.decayed += 1;
            }
        }
        tracing::debug!(
            examined = report.examined,
            decayed = report.decayed,
            cancelled = report.cancelled,
            "decay pass finished"
        );
        Ok(report)
    }

    /// Fold near-duplicate patterns together.
    ///
    /// Similarities are computed up front and pairs applied best-first.
    /// Applying a pair never changes any survivor's searchable text, so
    /// one sweep converges; a second run with no intervening writes
    /// finds no pairs above the merge band. A pair whose similarity
    /// comes back non-finite is skipped, never fatal.
    pub fn consolidate_pass(&self, cancel: &CancelToken) -> EngramResult<ConsolidatePassReport> {
        let policy = MergePolicy::new(self.config.merge_threshold, self.config.duplicate_threshold);
        let patterns = self.list()?;
        let mut report = ConsolidatePassReport::default();

        // Term vectors once per pattern, not once per pair.
        let vectors: Vec<_> = patterns
            .iter()
            .map(|p| similarity::term_frequencies(&similarity::tokenize(&similarity::pattern_text(p))))
            .collect();
        let ids: Vec<String> = patterns.iter().map(|p| p.id.clone()).collect();

        let mut candidates: Vec<(usize, usize, f64)> = Vec::new();
        for i in 0..patterns.len() {
            for j in (i + 1)..patterns.len() {
                if patterns[i].kind != patterns[j].kind {
                    continue;
                }
                let sim = if patterns[i].content_hash == patterns[j].content_hash {
                    1.0
                } else {
                    similarity::cosine_similarity(&vectors[i], &vectors[j])
                };
                if !sim.is_finite() {
                    report.skipped_pairs += 1;
                    continue;
                }
                if sim >= policy.merge_threshold {
                    candidates.push((i, j, sim));
                }
            }
        }
        report.candidate_pairs = candidates.len();
        candidates.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(Ordering::Equal));

        let mut live: HashMap<String, Pattern> =
            patterns.into_iter().map(|p| (p.id.clone(), p)).collect();
        let mut absorbed: HashSet<String> = HashSet::new();

        for (i, j, sim) in candidates {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            let (id_a, id_b) = (&ids[i], &ids[j]);
            if absorbed.contains(id_a) || absorbed.contains(id_b) {
                continue;
            }
            let (Some(a), Some(b)) = (live.get(id_a), live.get(id_b)) else {
                continue;
            };
            match evaluate(a, b, sim, &policy) {
                MergeOutcome::Duplicate {
                    survivor,
                    absorbed_id,
                    ..
                } => {
                    self.store
                        .with_writer(|conn| pattern_crud::delete_pattern(conn, &absorbed_id))?;
                    tracing::debug!(
                        survivor = %survivor.id,
                        absorbed = %absorbed_id,
                        similarity = sim,
                        "collapsed duplicate pattern"
                    );
                    absorbed.insert(absorbed_id);
                    report.duplicates_collapsed += 1;
                }
                MergeOutcome::Merged {
                    merged,
                    absorbed_id,
                    ..
                } => {
                    self.store
                        .with_writer(|conn| pattern_crud::apply_merge(conn, &merged, &absorbed_id))?;
                    tracing::debug!(
                        survivor = %merged.id,
                        absorbed = %absorbed_id,
                        similarity = sim,
                        "merged overlapping patterns"
                    );
                    absorbed.insert(absorbed_id);
                    live.insert(merged.id.clone(), merged);
                    report.merged += 1;
                }
                MergeOutcome::Distinct { .. } => {}
            }
        }
        tracing::debug!(
            candidate_pairs = report.candidate_pairs,
            duplicates = report.duplicates_collapsed,
            merged = report.merged,
            "consolidation pass finished"
        );
        Ok(report)
    }

    /// Delete patterns that are both weak and stale. Core patterns are
    /// never deleted here, whatever their state.
    pub fn prune_pass(&self, cancel: &CancelToken) -> EngramResult<PrunePassReport> {
        let policy = PrunePolicy {
            confidence_floor: self.config.prune_confidence_floor,
            age_days: self.config.prune_age_days,
        };
        let now = Utc::now();
        let patterns = self.list()?;

        let mut report = PrunePassReport::default();
        for pattern in patterns {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            report.examined += 1;
            let decision = engram_decay::evaluate_prune(&pattern, now, &policy);
            if decision.should_prune {
                self.store
                    .with_writer(|conn| pattern_crud::delete_pattern(conn, &pattern.id))?;
                tracing::debug!(pattern_id = %pattern.id, reason = %decision.reason, "pruned pattern");
                report.pruned += 1;
            }
        }
        Ok(report)
    }

    /// Remove a project namespace tag everywhere; patterns left with no
    /// namespaces are deleted. Core-tagged patterns keep their other
    /// tags and always survive. Returns the number deleted.
    pub fn reset_namespace(&self, namespace: &Namespace) -> EngramResult<usize> {
        if namespace.is_core() {
            return Err(EngramError::validation("the core namespace cannot be reset"));
        }

        let patterns = self.list()?;
        let mut deleted = 0usize;
        for mut pattern in patterns {
            if !pattern.namespaces.contains(namespace) {
                continue;
            }
            pattern.namespaces.retain(|ns| ns != namespace);
            if pattern.namespaces.is_empty() {
                self.store
                    .with_writer(|conn| pattern_crud::delete_pattern(conn, &pattern.id))?;
                deleted += 1;
            } else {
                self.store
                    .with_writer(|conn| pattern_crud::update_pattern(conn, &pattern))?;
            }
        }
        tracing::debug!(namespace = %namespace, deleted, "reset namespace");
        Ok(deleted)
    }

    pub fn stats(&self) -> EngramResult<KnowledgeStats> {
        self.store.with_reader(pattern_crud::knowledge_stats)
    }

    /// Append one import-audit row.
    pub fn record_audit(&self, record: &AuditRecord) -> EngramResult<()> {
        self.store
            .with_writer(|conn| audit_ops::insert_audit(conn, record))
    }

    /// Most recent audit rows, newest first.
    pub fn recent_audits(&self, limit: usize) -> EngramResult<Vec<AuditRecord>> {
        self.store
            .with_reader(move |conn| audit_ops::recent_audits(conn, limit))
    }

    // Draft validation shared by store_pattern and the sink.
    fn admit(&self, draft: PatternDraft) -> EngramResult<Pattern> {
        if draft.title.trim().is_empty() {
            return Err(EngramError::validation("pattern title must not be empty"));
        }
        if draft.kind.trim().is_empty() {
            return Err(EngramError::validation("pattern kind must not be empty"));
        }
        if draft.namespaces.is_empty() {
            return Err(EngramError::validation(
                "pattern needs at least one namespace",
            ));
        }
        if let Some(kind) = draft.payload.kind() {
            if kind != draft.kind {
                return Err(EngramError::Validation {
                    reason: format!(
                        "payload is {kind} but the pattern is declared {}",
                        draft.kind
                    ),
                });
            }
        }
        if draft.confidence.value() < self.config.min_store_confidence {
            return Err(EngramError::Validation {
                reason: format!(
                    "confidence {} below the storage minimum {:.2}",
                    draft.confidence, self.config.min_store_confidence
                ),
            });
        }

        let content_hash = Pattern::compute_content_hash(&draft.payload)?;
        let now = Utc::now();
        Ok(Pattern {
            id: Uuid::new_v4().to_string(),
            description: draft.payload.describe(),
            kind: draft.kind,
            title: draft.title,
            payload: draft.payload,
            confidence: draft.confidence,
            namespaces: dedup_namespaces(draft.namespaces),
            access_count: 0,
            last_accessed: now,
            created_at: now,
            content_hash,
        })
    }

    fn namespace_multiplier(&self, pattern: &Pattern, active: Option<&Namespace>) -> f64 {
        match active {
            Some(ns) if pattern.namespaces.contains(ns) => self.config.active_namespace_boost,
            _ if pattern.is_core() => self.config.core_namespace_boost,
            Some(_) => self.config.foreign_namespace_discount,
            None => 1.0,
        }
    }
}

impl IPatternSink for KnowledgeGraph {
    fn offer(&self, draft: PatternDraft) -> EngramResult<Option<String>> {
        match self.store_pattern(draft) {
            Ok(id) => Ok(Some(id)),
            // Distillation is best-effort: a draft the validator or the
            // policy turns away is declined, not an error.
            Err(EngramError::Validation { reason }) => {
                tracing::debug!(%reason, "declined distilled draft");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

fn dedup_namespaces(namespaces: Vec<Namespace>) -> Vec<Namespace> {
    let mut out: Vec<Namespace> = Vec::with_capacity(namespaces.len());
    for namespace in namespaces {
        if !out.contains(&namespace) {
            out.push(namespace);
        }
    }
    out
}
