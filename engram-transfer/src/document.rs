//! The portable export document: versioned, scoped, and self-verifying.
//!
//! A document carries fully-formed patterns plus a manifest the receiving
//! side can inspect before deciding to import, and a blake3 signature over
//! the serialized entries so transport corruption or tampering is caught
//! before the reconciler looks at a single pattern.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use engram_core::config::TransferConfig;
use engram_core::constants::EXPORT_FORMAT_VERSION;
use engram_core::errors::TransferError;
use engram_core::{EngramResult, Pattern};
use engram_knowledge::KnowledgeGraph;

/// Document format version this build writes and reads.
pub const DOCUMENT_VERSION: u32 = EXPORT_FORMAT_VERSION;

/// Which patterns an export covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportScope {
    /// Patterns tagged with at least one project namespace.
    #[default]
    Workspace,
    /// Patterns carrying the reserved core namespace.
    Core,
    /// Every pattern in the store.
    All,
}

impl ExportScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Workspace => "workspace",
            Self::Core => "core",
            Self::All => "all",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw {
            "workspace" => Ok(Self::Workspace),
            "core" => Ok(Self::Core),
            "all" => Ok(Self::All),
            other => Err(format!("unknown export scope: {other}")),
        }
    }

    fn admits(self, pattern: &Pattern) -> bool {
        match self {
            Self::Workspace => pattern.namespaces.iter().any(|ns| !ns.is_core()),
            Self::Core => pattern.is_core(),
            Self::All => true,
        }
    }
}

impl fmt::Display for ExportScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of a document's entries, for inspection before import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub pattern_count: usize,
    /// Lowest confidence among the entries; `None` for an empty document.
    pub min_confidence: Option<f64>,
    /// Highest confidence among the entries; `None` for an empty document.
    pub max_confidence: Option<f64>,
    /// Sorted, deduplicated namespace names present across the entries.
    pub namespaces: Vec<String>,
}

impl Manifest {
    pub fn for_patterns(patterns: &[Pattern]) -> Self {
        let mut namespaces: Vec<String> = patterns
            .iter()
            .flat_map(|p| p.namespaces.iter().map(|ns| ns.as_str().to_string()))
            .collect();
        namespaces.sort();
        namespaces.dedup();

        let mut min_confidence: Option<f64> = None;
        let mut max_confidence: Option<f64> = None;
        for pattern in patterns {
            let value = pattern.confidence.value();
            min_confidence = Some(min_confidence.map_or(value, |m| m.min(value)));
            max_confidence = Some(max_confidence.map_or(value, |m| m.max(value)));
        }

        Self {
            pattern_count: patterns.len(),
            min_confidence,
            max_confidence,
            namespaces,
        }
    }
}

/// A portable batch of patterns plus everything needed to trust it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDocument {
    /// Format version for forward compatibility.
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    /// Identifier of the producing machine.
    pub source: String,
    pub scope: ExportScope,
    /// blake3 hex digest over the serialized `patterns` array.
    pub signature: String,
    pub manifest: Manifest,
    pub patterns: Vec<Pattern>,
}

impl ExportDocument {
    /// Compute the signature for a pattern set.
    pub fn sign(patterns: &[Pattern]) -> EngramResult<String> {
        let serialized = serde_json::to_string(patterns)?;
        Ok(blake3::hash(serialized.as_bytes()).to_hex().to_string())
    }

    /// Recompute the signature and compare against the stored one.
    ///
    /// Any mismatch rejects the whole document; the reconciler never
    /// runs over unverified entries.
    pub fn verify_signature(&self) -> EngramResult<()> {
        let computed = Self::sign(&self.patterns)?;
        if computed != self.signature {
            return Err(TransferError::SignatureMismatch {
                expected: self.signature.clone(),
                computed,
            }
            .into());
        }
        Ok(())
    }

    pub fn to_json(&self) -> EngramResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a document from its JSON form. Structural problems surface
    /// as [`TransferError::MalformedDocument`], not a bare serde error.
    pub fn from_json(raw: &str) -> EngramResult<Self> {
        serde_json::from_str(raw).map_err(|e| {
            TransferError::MalformedDocument {
                reason: e.to_string(),
            }
            .into()
        })
    }
}

/// Select, summarize, and sign patterns for transport.
///
/// `min_confidence` falls back to the configured export floor when the
/// caller gives none. Entries keep the store's creation order, so the
/// same store state always produces the same document body.
pub fn export_patterns(
    graph: &KnowledgeGraph,
    scope: ExportScope,
    min_confidence: Option<f64>,
    config: &TransferConfig,
) -> EngramResult<ExportDocument> {
    let floor = min_confidence.unwrap_or(config.default_min_confidence);
    let patterns: Vec<Pattern> = graph
        .list()?
        .into_iter()
        .filter(|p| scope.admits(p) && p.confidence.value() >= floor)
        .collect();

    let signature = ExportDocument::sign(&patterns)?;
    let manifest = Manifest::for_patterns(&patterns);
    tracing::info!(
        scope = %scope,
        count = patterns.len(),
        floor,
        "exported patterns"
    );

    Ok(ExportDocument {
        version: DOCUMENT_VERSION,
        exported_at: Utc::now(),
        source: config.source_id.clone(),
        scope,
        signature,
        manifest,
        patterns,
    })
}
