//! Tier 3 models: file stability, development velocity, and the
//! insights derived from them.
//!
//! All of these are recomputed per collection cycle and superseded
//! wholesale by the next cycle; nothing here carries referential
//! obligations toward the other tiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stability classification from churn-rate bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StabilityBand {
    Stable,
    Moderate,
    Unstable,
}

impl StabilityBand {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Moderate => "moderate",
            Self::Unstable => "unstable",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw {
            "stable" => Ok(Self::Stable),
            "moderate" => Ok(Self::Moderate),
            "unstable" => Ok(Self::Unstable),
            other => Err(format!("unknown stability band: {other}")),
        }
    }
}

/// Per-file churn observation over one collection window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileStability {
    pub path: String,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    /// Distinct commits touching this file within the window.
    pub commit_count: u64,
    /// Total appearances of this file across commit file lists.
    pub edit_count: u64,
    /// `edit_count / total commits in window`, in [0, 1] per file.
    pub churn_rate: f64,
    pub band: StabilityBand,
}

/// Direction of the commit-rate change between two adjacent windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VelocityTrend {
    Increasing,
    Declining,
    Stable,
}

impl VelocityTrend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Declining => "declining",
            Self::Stable => "stable",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw {
            "increasing" => Ok(Self::Increasing),
            "declining" => Ok(Self::Declining),
            "stable" => Ok(Self::Stable),
            other => Err(format!("unknown velocity trend: {other}")),
        }
    }
}

/// Commit counts for the current window versus the prior window of
/// equal length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocitySample {
    pub window_days: u32,
    pub commits: u64,
    pub prior_commits: u64,
    /// Signed percent change, e.g. -0.5 for half the prior rate.
    pub percent_change: f64,
    pub trend: VelocityTrend,
}

/// Severity of an emitted insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl InsightSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw {
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "critical" => Ok(Self::Critical),
            other => Err(format!("unknown insight severity: {other}")),
        }
    }
}

/// An advisory observation derived from a collection cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub severity: InsightSeverity,
    pub message: String,
    /// Set when the insight concerns a specific file.
    pub file: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The full output of one Tier 3 collection cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextReport {
    pub collected_at: DateTime<Utc>,
    pub window_days: u32,
    pub file_stability: Vec<FileStability>,
    /// `None` when the window held no commits at all.
    pub velocity: Option<VelocitySample>,
    pub insights: Vec<Insight>,
    /// True when the history was unreadable and this report is an empty
    /// placeholder rather than a real observation.
    pub degraded: bool,
}

impl ContextReport {
    /// An empty report used when history cannot be read. Advisory
    /// callers receive this instead of an error.
    pub fn degraded(window_days: u32, reason: &str) -> Self {
        let now = Utc::now();
        Self {
            collected_at: now,
            window_days,
            file_stability: Vec::new(),
            velocity: None,
            insights: vec![Insight {
                severity: InsightSeverity::Warning,
                message: format!("context collection degraded: {reason}"),
                file: None,
                created_at: now,
            }],
            degraded: true,
        }
    }

    /// Paths currently classified unstable, for ranking-side cautions.
    pub fn unstable_paths(&self) -> Vec<&str> {
        self.file_stability
            .iter()
            .filter(|f| f.band == StabilityBand::Unstable)
            .map(|f| f.path.as_str())
            .collect()
    }
}
