//! Tier 3 collection: throttled git-log analysis with a persisted
//! snapshot.
//!
//! Advisory contract: `collect` never returns an error. Unreadable
//! history, a dead deadline or a mid-run cancellation all degrade to
//! the last snapshot (with a warning insight appended) or to an empty
//! degraded report.

use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use moka::sync::Cache;

use engram_core::config::ContextConfig;
use engram_core::models::{ContextReport, Insight, InsightSeverity};
use engram_core::{CancelToken, EngramResult};
use engram_store::Store;

use crate::queries::snapshot_ops;
use crate::{analysis, git, migrations};

/// Tier 3: git-derived stability and velocity, at most one full
/// collection per configured interval.
///
/// The throttle holds across processes through the persisted snapshot
/// and within a process through a TTL cache keyed by window length.
pub struct ContextCollector {
    store: Store,
    config: ContextConfig,
    repo_root: PathBuf,
    cache: Cache<u32, ContextReport>,
}

impl ContextCollector {
    pub fn open(db_path: &Path, repo_root: &Path, config: ContextConfig) -> EngramResult<Self> {
        let store = Store::open(db_path, &migrations::migrations())?;
        Ok(Self::with_store(store, repo_root, config))
    }

    pub fn open_in_memory(repo_root: &Path, config: ContextConfig) -> EngramResult<Self> {
        let store = Store::open_in_memory(&migrations::migrations())?;
        Ok(Self::with_store(store, repo_root, config))
    }

    fn with_store(store: Store, repo_root: &Path, config: ContextConfig) -> Self {
        let ttl_secs = (config.collect_interval_minutes.max(0) as u64) * 60;
        let cache = Cache::builder()
            .max_capacity(8)
            .time_to_live(StdDuration::from_secs(ttl_secs.max(1)))
            .build();
        Self {
            store,
            config,
            repo_root: repo_root.to_path_buf(),
            cache,
        }
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// The last persisted report, regardless of age.
    pub fn latest(&self) -> EngramResult<Option<ContextReport>> {
        self.store.with_reader(snapshot_ops::load_snapshot)
    }

    /// Collect stability and velocity over `window_days`.
    ///
    /// Inside the throttle interval this returns the cached report
    /// without touching git. A fresh collection reads one `git log`
    /// covering two adjacent windows, analyzes it, persists the
    /// snapshot, and returns the report.
    pub fn collect(&self, window_days: u32, cancel: &CancelToken) -> ContextReport {
        if self.throttled() {
            if let Some(cached) = self.cache.get(&window_days) {
                tracing::debug!(window_days, "context collection served from memory cache");
                return cached;
            }
            if let Some(snapshot) = self.fresh_snapshot(window_days) {
                tracing::debug!(window_days, "context collection served from snapshot");
                self.cache.insert(window_days, snapshot.clone());
                return snapshot;
            }
        }

        if cancel.is_cancelled() {
            return self.degrade(window_days, "collection cancelled");
        }

        let now = Utc::now();
        let since = now - Duration::days(i64::from(window_days) * 2);
        let timeout = StdDuration::from_secs(self.config.git_timeout_secs);
        let commits = match git::log_with_files(&self.repo_root, since, timeout) {
            Ok(commits) => commits,
            Err(e) => {
                let report = self.degrade(window_days, &e.to_string());
                if self.throttled() {
                    // Hold the degraded result for the interval so a
                    // broken repository is not re-probed on every call.
                    self.cache.insert(window_days, report.clone());
                }
                return report;
            }
        };

        if cancel.is_cancelled() {
            return self.degrade(window_days, "collection cancelled");
        }

        let report = analysis::analyze(&commits, now, window_days, &self.config);
        tracing::info!(
            window_days,
            commits = commits.len(),
            files = report.file_stability.len(),
            insights = report.insights.len(),
            "context collection complete"
        );

        if let Err(e) = self
            .store
            .with_writer(|conn| snapshot_ops::save_snapshot(conn, &report))
        {
            tracing::warn!(error = %e, "failed to persist context snapshot");
        }
        if self.throttled() {
            self.cache.insert(window_days, report.clone());
        }
        report
    }

    fn throttled(&self) -> bool {
        self.config.collect_interval_minutes > 0
    }

    /// Persisted snapshot for this window, only if still inside the
    /// throttle interval.
    fn fresh_snapshot(&self, window_days: u32) -> Option<ContextReport> {
        let snapshot = self
            .store
            .with_reader(snapshot_ops::load_snapshot)
            .ok()
            .flatten()?;
        if snapshot.window_days != window_days {
            return None;
        }
        let age = Utc::now() - snapshot.collected_at;
        if age < Duration::minutes(self.config.collect_interval_minutes) {
            Some(snapshot)
        } else {
            None
        }
    }

    /// Last snapshot with a warning appended, or an empty degraded
    /// report when there is nothing to serve.
    fn degrade(&self, window_days: u32, reason: &str) -> ContextReport {
        let cached = self
            .store
            .with_reader(snapshot_ops::load_snapshot)
            .ok()
            .flatten();
        match cached {
            Some(mut snapshot) if snapshot.window_days == window_days => {
                tracing::warn!(reason, "context collection degraded, serving last snapshot");
                snapshot.insights.push(Insight {
                    severity: InsightSeverity::Warning,
                    message: format!("context collection degraded: {reason}"),
                    file: None,
                    created_at: Utc::now(),
                });
                snapshot
            }
            _ => {
                tracing::warn!(reason, "context collection degraded, serving empty report");
                ContextReport::degraded(window_days, reason)
            }
        }
    }
}
