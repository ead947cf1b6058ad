//! The import reconciler: verify, match, decide, apply, audit.
//!
//! Each document entry is matched against local state by identity first
//! (id, then kind + case-insensitive title), then by best same-kind
//! content similarity at or above the merge band. The decision per match
//! depends on the strategy; every decision yields an audit record, and a
//! dry run drives the identical pipeline without touching the store.

use std::collections::HashMap;
use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use engram_consolidate::{merge_patterns, pattern_similarity, MergePolicy};
use engram_core::errors::TransferError;
use engram_core::models::{AuditRecord, TransferDecision};
use engram_core::{Confidence, EngramError, EngramResult, Pattern};
use engram_knowledge::KnowledgeGraph;

use crate::document::{ExportDocument, ExportScope, DOCUMENT_VERSION};

/// How the reconciler treats an incoming pattern that collides with
/// local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStrategy {
    /// Similarity-tiered: duplicates keep the stronger side, overlaps
    /// merge with occurrence weighting, contradictions keep local.
    #[default]
    Auto,
    /// The imported copy always wins.
    Replace,
    /// Existing patterns are never altered; only brand-new entries land.
    Skip,
}

impl ImportStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Replace => "replace",
            Self::Skip => "skip",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw {
            "auto" => Ok(Self::Auto),
            "replace" => Ok(Self::Replace),
            "skip" => Ok(Self::Skip),
            other => Err(format!("unknown import strategy: {other}")),
        }
    }
}

impl fmt::Display for ImportStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters and the audit trail from one import run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub new: usize,
    pub merged: usize,
    pub replaced: usize,
    pub skipped: usize,
    /// One record per document entry, in document order.
    pub audits: Vec<AuditRecord>,
    /// True when the pipeline ran without writing.
    pub dry_run: bool,
}

impl ImportReport {
    pub fn total(&self) -> usize {
        self.new + self.merged + self.replaced + self.skipped
    }
}

/// A matched local counterpart for one incoming entry.
struct LocalMatch {
    pattern: Pattern,
    similarity: f64,
}

/// Reconcile a verified document into the knowledge graph.
///
/// The signature is checked before anything else; a rejected document
/// applies zero changes. Decisions made earlier in the document are
/// visible to later entries, so a document that carries near-duplicates
/// of its own reconciles deterministically.
pub fn import_document(
    graph: &KnowledgeGraph,
    document: &ExportDocument,
    strategy: ImportStrategy,
    dry_run: bool,
) -> EngramResult<ImportReport> {
    document.verify_signature()?;
    if document.version != DOCUMENT_VERSION {
        return Err(TransferError::UnsupportedVersion {
            found: document.version,
            supported: DOCUMENT_VERSION,
        }
        .into());
    }
    validate_namespaces(document)?;
    validate_entries(document)?;

    let policy = MergePolicy::new(
        graph.config().merge_threshold,
        graph.config().duplicate_threshold,
    );
    let mut locals: HashMap<String, Pattern> = graph
        .list()?
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect();

    let mut report = ImportReport {
        dry_run,
        ..Default::default()
    };

    for incoming in &document.patterns {
        let audit = match find_candidate(&locals, incoming, &policy) {
            None => admit_new(graph, &mut locals, incoming, dry_run)?,
            Some(found) => {
                reconcile_pair(graph, &mut locals, incoming, found, strategy, &policy, dry_run)?
            }
        };
        match audit.decision {
            TransferDecision::New => report.new += 1,
            TransferDecision::Merged => report.merged += 1,
            TransferDecision::Replaced => report.replaced += 1,
            TransferDecision::Skipped => report.skipped += 1,
        }
        debug!(
            pattern_id = %audit.pattern_id,
            decision = audit.decision.as_str(),
            reason = %audit.reason,
            "import decision"
        );
        if !dry_run {
            graph.record_audit(&audit)?;
        }
        report.audits.push(audit);
    }

    info!(
        new = report.new,
        merged = report.merged,
        replaced = report.replaced,
        skipped = report.skipped,
        dry_run,
        "import complete"
    );
    Ok(report)
}

/// Scope rules: a core document must be all core-tagged, a workspace
/// document all project-tagged; `all` admits both. An entry with no
/// namespaces is a violation under every scope.
fn validate_namespaces(document: &ExportDocument) -> EngramResult<()> {
    for pattern in &document.patterns {
        if pattern.namespaces.is_empty() {
            return Err(violation(
                document.scope,
                format!("pattern {} carries no namespaces", pattern.id),
            ));
        }
        match document.scope {
            ExportScope::Core if !pattern.is_core() => {
                return Err(violation(
                    document.scope,
                    format!("pattern {} lacks the core namespace", pattern.id),
                ));
            }
            ExportScope::Workspace if pattern.namespaces.iter().all(|ns| ns.is_core()) => {
                return Err(violation(
                    document.scope,
                    format!("pattern {} carries no project namespace", pattern.id),
                ));
            }
            _ => {}
        }
    }
    Ok(())
}

fn violation(scope: ExportScope, reason: String) -> EngramError {
    TransferError::NamespaceViolation {
        scope: scope.as_str().to_string(),
        reason,
    }
    .into()
}

/// Structural checks on each entry before any of them is applied.
fn validate_entries(document: &ExportDocument) -> EngramResult<()> {
    for pattern in &document.patterns {
        if pattern.id.trim().is_empty() || pattern.kind.trim().is_empty() {
            return Err(malformed(format!(
                "pattern with empty id or kind (title {:?})",
                pattern.title
            )));
        }
        if pattern.title.trim().is_empty() {
            return Err(malformed(format!("pattern {} has an empty title", pattern.id)));
        }
        if let Err(reason) = Confidence::try_new(pattern.confidence.value()) {
            return Err(malformed(format!("pattern {}: {reason}", pattern.id)));
        }
    }
    Ok(())
}

fn malformed(reason: String) -> EngramError {
    TransferError::MalformedDocument { reason }.into()
}

/// Locate the local pattern an incoming entry reconciles against.
///
/// Identity matches (same id, or same kind and case-insensitive title)
/// always produce a candidate whatever the similarity; content matches
/// require the merge band, so a purely similarity-based candidate can
/// never land in the contradictory tier.
fn find_candidate(
    locals: &HashMap<String, Pattern>,
    incoming: &Pattern,
    policy: &MergePolicy,
) -> Option<LocalMatch> {
    if let Some(local) = locals.get(&incoming.id) {
        return Some(LocalMatch {
            similarity: pattern_similarity(local, incoming),
            pattern: local.clone(),
        });
    }

    let title = incoming.title.trim().to_lowercase();
    if let Some(local) = locals
        .values()
        .find(|l| l.kind == incoming.kind && l.title.trim().to_lowercase() == title)
    {
        return Some(LocalMatch {
            similarity: pattern_similarity(local, incoming),
            pattern: local.clone(),
        });
    }

    let mut best: Option<LocalMatch> = None;
    for local in locals.values().filter(|l| l.kind == incoming.kind) {
        let similarity = pattern_similarity(local, incoming);
        if !similarity.is_finite() || similarity < policy.merge_threshold {
            continue;
        }
        let better = match &best {
            Some(current) => similarity > current.similarity,
            None => true,
        };
        if better {
            best = Some(LocalMatch {
                similarity,
                pattern: local.clone(),
            });
        }
    }
    best
}

fn admit_new(
    graph: &KnowledgeGraph,
    locals: &mut HashMap<String, Pattern>,
    incoming: &Pattern,
    dry_run: bool,
) -> EngramResult<AuditRecord> {
    if !dry_run {
        graph.put_pattern(incoming)?;
    }
    locals.insert(incoming.id.clone(), incoming.clone());
    Ok(audit(
        &incoming.id,
        TransferDecision::New,
        "no local counterpart".to_string(),
        None,
        Some(incoming.confidence.value()),
    ))
}

fn reconcile_pair(
    graph: &KnowledgeGraph,
    locals: &mut HashMap<String, Pattern>,
    incoming: &Pattern,
    found: LocalMatch,
    strategy: ImportStrategy,
    policy: &MergePolicy,
    dry_run: bool,
) -> EngramResult<AuditRecord> {
    let local = found.pattern;
    let similarity = found.similarity;
    let before = Some(local.confidence.value());

    match strategy {
        ImportStrategy::Skip => Ok(audit(
            &local.id,
            TransferDecision::Skipped,
            format!("skip strategy, local kept (similarity {similarity:.3})"),
            before,
            before,
        )),
        ImportStrategy::Replace => {
            take_import(graph, locals, incoming, &local, dry_run)?;
            Ok(audit(
                &incoming.id,
                TransferDecision::Replaced,
                format!("replace strategy (similarity {similarity:.3})"),
                before,
                Some(incoming.confidence.value()),
            ))
        }
        ImportStrategy::Auto => {
            if similarity >= policy.duplicate_threshold {
                if incoming.confidence.value() > local.confidence.value() {
                    take_import(graph, locals, incoming, &local, dry_run)?;
                    Ok(audit(
                        &incoming.id,
                        TransferDecision::Replaced,
                        format!(
                            "duplicate content (similarity {similarity:.3}), imported confidence higher"
                        ),
                        before,
                        Some(incoming.confidence.value()),
                    ))
                } else {
                    Ok(audit(
                        &local.id,
                        TransferDecision::Skipped,
                        format!(
                            "duplicate content (similarity {similarity:.3}), local confidence kept"
                        ),
                        before,
                        before,
                    ))
                }
            } else if similarity >= policy.merge_threshold {
                let merged = merge_patterns(&local, incoming);
                let absorbed = if merged.id == local.id {
                    incoming.id.clone()
                } else {
                    local.id.clone()
                };
                if !dry_run {
                    graph.apply_merge(&merged, &absorbed)?;
                }
                locals.remove(&local.id);
                let after = Some(merged.confidence.value());
                let merged_id = merged.id.clone();
                locals.insert(merged_id.clone(), merged);
                Ok(audit(
                    &merged_id,
                    TransferDecision::Merged,
                    format!(
                        "overlapping content (similarity {similarity:.3}), occurrence-weighted merge"
                    ),
                    before,
                    after,
                ))
            } else {
                // Identity match with diverged content. Locally-validated
                // knowledge outranks a blind overwrite.
                Ok(audit(
                    &local.id,
                    TransferDecision::Skipped,
                    format!("contradictory content (similarity {similarity:.3}), local kept"),
                    before,
                    before,
                ))
            }
        }
    }
}

/// Put the imported copy in place of the local one, atomically when the
/// ids differ.
fn take_import(
    graph: &KnowledgeGraph,
    locals: &mut HashMap<String, Pattern>,
    incoming: &Pattern,
    local: &Pattern,
    dry_run: bool,
) -> EngramResult<()> {
    if !dry_run {
        graph.apply_merge(incoming, &local.id)?;
    }
    locals.remove(&local.id);
    locals.insert(incoming.id.clone(), incoming.clone());
    Ok(())
}

fn audit(
    pattern_id: &str,
    decision: TransferDecision,
    reason: String,
    confidence_before: Option<f64>,
    confidence_after: Option<f64>,
) -> AuditRecord {
    AuditRecord {
        pattern_id: pattern_id.to_string(),
        decision,
        reason,
        confidence_before,
        confidence_after,
        created_at: Utc::now(),
    }
}
