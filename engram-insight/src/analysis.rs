//! Pure churn/velocity analysis over a parsed commit log.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use engram_core::config::ContextConfig;
use engram_core::models::{
    ContextReport, FileStability, Insight, InsightSeverity, StabilityBand, VelocitySample,
    VelocityTrend,
};

use crate::git::CommitRecord;

/// Unstable-file warnings are capped; the stability list itself is not.
const MAX_FILE_INSIGHTS: usize = 20;

/// Build a full report from commits covering two adjacent windows
/// (`[now-2w, now-w)` for velocity's prior sample, `[now-w, now]` for
/// churn and the current velocity sample).
pub fn analyze(
    commits: &[CommitRecord],
    now: DateTime<Utc>,
    window_days: u32,
    config: &ContextConfig,
) -> ContextReport {
    let window = Duration::days(i64::from(window_days));
    let current_start = now - window;
    let prior_start = current_start - window;

    let current: Vec<&CommitRecord> = commits
        .iter()
        .filter(|c| c.timestamp >= current_start)
        .collect();
    let prior_count = commits
        .iter()
        .filter(|c| c.timestamp >= prior_start && c.timestamp < current_start)
        .count() as u64;

    let file_stability = churn_per_file(&current, current_start, now, config);
    let velocity = velocity_sample(current.len() as u64, prior_count, window_days, config);
    let insights = derive_insights(&file_stability, velocity.as_ref(), window_days, now);

    ContextReport {
        collected_at: now,
        window_days,
        file_stability,
        velocity,
        insights,
        degraded: false,
    }
}

pub fn classify_churn(rate: f64, config: &ContextConfig) -> StabilityBand {
    if rate < config.stable_band {
        StabilityBand::Stable
    } else if rate < config.moderate_band {
        StabilityBand::Moderate
    } else {
        StabilityBand::Unstable
    }
}

fn churn_per_file(
    current: &[&CommitRecord],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    config: &ContextConfig,
) -> Vec<FileStability> {
    let total_commits = current.len() as u64;
    if total_commits == 0 {
        return Vec::new();
    }

    // path -> (edit appearances, distinct commits)
    let mut counts: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    for commit in current {
        let mut seen_in_commit: Vec<&str> = Vec::new();
        for file in &commit.files {
            let entry = counts.entry(file.as_str()).or_insert((0, 0));
            entry.0 += 1;
            if !seen_in_commit.contains(&file.as_str()) {
                entry.1 += 1;
                seen_in_commit.push(file.as_str());
            }
        }
    }

    let mut stability: Vec<FileStability> = counts
        .into_iter()
        .map(|(path, (edit_count, commit_count))| {
            let churn_rate = edit_count as f64 / total_commits as f64;
            FileStability {
                path: path.to_string(),
                window_start,
                window_end,
                commit_count,
                edit_count,
                churn_rate,
                band: classify_churn(churn_rate, config),
            }
        })
        .collect();

    // Highest churn first; path breaks ties so output is deterministic.
    stability.sort_by(|a, b| {
        b.churn_rate
            .partial_cmp(&a.churn_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.path.cmp(&b.path))
    });
    stability
}

fn velocity_sample(
    commits: u64,
    prior_commits: u64,
    window_days: u32,
    config: &ContextConfig,
) -> Option<VelocitySample> {
    if commits == 0 && prior_commits == 0 {
        return None;
    }

    let baseline = prior_commits.max(1) as f64;
    let percent_change = (commits as f64 - prior_commits as f64) / baseline;
    let trend = if percent_change > config.velocity_trend_threshold {
        VelocityTrend::Increasing
    } else if percent_change < -config.velocity_trend_threshold {
        VelocityTrend::Declining
    } else {
        VelocityTrend::Stable
    };

    Some(VelocitySample {
        window_days,
        commits,
        prior_commits,
        percent_change,
        trend,
    })
}

fn derive_insights(
    file_stability: &[FileStability],
    velocity: Option<&VelocitySample>,
    window_days: u32,
    now: DateTime<Utc>,
) -> Vec<Insight> {
    let mut insights = Vec::new();

    for file in file_stability
        .iter()
        .filter(|f| f.band == StabilityBand::Unstable)
        .take(MAX_FILE_INSIGHTS)
    {
        insights.push(Insight {
            severity: InsightSeverity::Warning,
            message: format!(
                "{} is unstable: touched by {:.0}% of commits in the last {} days",
                file.path,
                file.churn_rate * 100.0,
                window_days
            ),
            file: Some(file.path.clone()),
            created_at: now,
        });
    }

    if let Some(velocity) = velocity {
        if velocity.trend == VelocityTrend::Declining {
            insights.push(Insight {
                severity: InsightSeverity::Warning,
                message: format!(
                    "development velocity declining: {} commits vs {} in the prior {} days",
                    velocity.commits, velocity.prior_commits, window_days
                ),
                file: None,
                created_at: now,
            });
        }
    }

    insights
}
