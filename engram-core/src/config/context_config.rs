use serde::{Deserialize, Serialize};

use super::defaults;

/// Context-intelligence (Tier 3) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Minimum minutes between full collection cycles; requests inside
    /// the window return the cached report.
    pub collect_interval_minutes: i64,
    /// Default observation window for churn and velocity.
    pub window_days: u32,
    /// Deadline for a single git invocation.
    pub git_timeout_secs: u64,
    /// Churn rate below this is classified stable.
    pub stable_band: f64,
    /// Churn rate below this (and at or above `stable_band`) is
    /// classified moderate; anything above is unstable.
    pub moderate_band: f64,
    /// Relative commit-count change beyond which velocity is trending.
    pub velocity_trend_threshold: f64,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            collect_interval_minutes: defaults::DEFAULT_COLLECT_INTERVAL_MINUTES,
            window_days: defaults::DEFAULT_WINDOW_DAYS,
            git_timeout_secs: defaults::DEFAULT_GIT_TIMEOUT_SECS,
            stable_band: defaults::DEFAULT_STABLE_BAND,
            moderate_band: defaults::DEFAULT_MODERATE_BAND,
            velocity_trend_threshold: defaults::DEFAULT_VELOCITY_TREND_THRESHOLD,
        }
    }
}
