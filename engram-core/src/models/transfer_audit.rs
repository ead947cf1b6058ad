use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the import reconciler did with one incoming pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferDecision {
    /// No local counterpart; inserted as-is.
    New,
    /// Mid-band similarity; occurrence-weighted merge applied.
    Merged,
    /// Imported copy took the place of the local one.
    Replaced,
    /// Local state left untouched.
    Skipped,
}

impl TransferDecision {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Merged => "merged",
            Self::Replaced => "replaced",
            Self::Skipped => "skipped",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw {
            "new" => Ok(Self::New),
            "merged" => Ok(Self::Merged),
            "replaced" => Ok(Self::Replaced),
            "skipped" => Ok(Self::Skipped),
            other => Err(format!("unknown transfer decision: {other}")),
        }
    }
}

/// One audit row per reconciled pattern. Persisted in the knowledge
/// store for non-dry-run imports; dry runs return these without writing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub pattern_id: String,
    pub decision: TransferDecision,
    pub reason: String,
    /// Local confidence before the decision; `None` when there was no
    /// local counterpart.
    pub confidence_before: Option<f64>,
    /// Stored confidence after the decision; `None` when nothing was
    /// written.
    pub confidence_after: Option<f64>,
    pub created_at: DateTime<Utc>,
}
