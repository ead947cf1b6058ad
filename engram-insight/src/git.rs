//! Git subprocess invocation for Tier 3.
//!
//! Everything here runs `git` as a child process with a hard deadline;
//! the log output is plain structured text and never leaves the local
//! machine. Failures surface as [`ContextError`] and are downgraded to
//! cached/empty reports by the collector.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::LazyLock;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;

use engram_core::errors::ContextError;

/// Commit lines are emitted as `>><unix-epoch>` so they cannot collide
/// with file paths in the `--name-only` listing.
static COMMIT_LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^>>(\d+)$").unwrap());

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// One commit from the log: when it happened and which files it touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub timestamp: DateTime<Utc>,
    pub files: Vec<String>,
}

/// Check whether a directory is inside a git work tree.
pub fn is_git_repo(dir: &Path) -> bool {
    Command::new("git")
        .args(["rev-parse", "--is-inside-work-tree"])
        .current_dir(dir)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Run `git log --name-only` since a cutoff and parse one record per
/// commit, newest first. The subprocess is killed at the deadline.
pub fn log_with_files(
    repo: &Path,
    since: DateTime<Utc>,
    timeout: Duration,
) -> Result<Vec<CommitRecord>, ContextError> {
    let since_arg = format!("--since={}", since.to_rfc3339());
    let output = run_with_deadline(
        repo,
        &["log", "--name-only", "--no-merges", "--pretty=format:>>%ct", &since_arg],
        timeout,
    )?;
    parse_log(&output)
}

/// Spawn git, drain stdout/stderr on helper threads so the pipes never
/// fill, and poll for exit until the deadline.
fn run_with_deadline(
    repo: &Path,
    args: &[&str],
    timeout: Duration,
) -> Result<String, ContextError> {
    let mut child = Command::new("git")
        .args(args)
        .current_dir(repo)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ContextError::GitFailed {
            reason: format!("failed to run git: {e}"),
        })?;

    let stdout_pipe = child.stdout.take();
    let stderr_pipe = child.stderr.take();
    let stdout_handle = thread::spawn(move || drain(stdout_pipe));
    let stderr_handle = thread::spawn(move || drain(stderr_pipe));

    let deadline = Instant::now() + timeout;
    let status = loop {
        let polled = child.try_wait().map_err(|e| ContextError::GitFailed {
            reason: format!("wait for git: {e}"),
        })?;
        match polled {
            Some(status) => break status,
            None if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ContextError::GitTimeout {
                    timeout_secs: timeout.as_secs(),
                });
            }
            None => thread::sleep(POLL_INTERVAL),
        }
    };

    let stdout = stdout_handle.join().unwrap_or_default();
    let stderr = stderr_handle.join().unwrap_or_default();

    if !status.success() {
        if stderr.contains("not a git repository") {
            return Err(ContextError::NotARepository {
                path: repo.display().to_string(),
            });
        }
        return Err(ContextError::GitFailed {
            reason: format!("git {} failed: {}", args.first().unwrap_or(&""), stderr.trim()),
        });
    }
    Ok(stdout)
}

fn drain(pipe: Option<impl Read>) -> String {
    let mut buf = String::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_string(&mut buf);
    }
    buf
}

fn parse_log(raw: &str) -> Result<Vec<CommitRecord>, ContextError> {
    let mut commits = Vec::new();
    let mut current: Option<CommitRecord> = None;

    for line in raw.lines() {
        let line = line.trim_end();
        if let Some(cap) = COMMIT_LINE_RE.captures(line) {
            if let Some(done) = current.take() {
                commits.push(done);
            }
            let epoch: i64 = cap[1].parse().map_err(|_| ContextError::UnparseableLog {
                reason: format!("bad commit timestamp: {line}"),
            })?;
            let timestamp = Utc
                .timestamp_opt(epoch, 0)
                .single()
                .ok_or_else(|| ContextError::UnparseableLog {
                    reason: format!("out-of-range commit timestamp: {epoch}"),
                })?;
            current = Some(CommitRecord {
                timestamp,
                files: Vec::new(),
            });
        } else if !line.is_empty() {
            match &mut current {
                Some(commit) => commit.files.push(line.to_string()),
                None => {
                    return Err(ContextError::UnparseableLog {
                        reason: format!("file entry before any commit line: {line}"),
                    })
                }
            }
        }
    }
    if let Some(done) = current.take() {
        commits.push(done);
    }
    Ok(commits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commit_blocks_with_files() {
        let raw = ">>1700000100\n\nsrc/a.rs\nsrc/b.rs\n>>1700000000\n\nsrc/a.rs\n";
        let commits = parse_log(raw).unwrap();
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].files, vec!["src/a.rs", "src/b.rs"]);
        assert_eq!(commits[1].files, vec!["src/a.rs"]);
        assert!(commits[0].timestamp > commits[1].timestamp);
    }

    #[test]
    fn tolerates_commits_without_files() {
        let raw = ">>1700000100\n>>1700000000\n\nsrc/a.rs\n";
        let commits = parse_log(raw).unwrap();
        assert_eq!(commits.len(), 2);
        assert!(commits[0].files.is_empty());
        assert_eq!(commits[1].files, vec!["src/a.rs"]);
    }

    #[test]
    fn empty_log_is_no_commits() {
        assert!(parse_log("").unwrap().is_empty());
    }

    #[test]
    fn stray_file_line_is_unparseable() {
        let err = parse_log("src/a.rs\n").unwrap_err();
        assert!(matches!(err, ContextError::UnparseableLog { .. }));
    }
}
