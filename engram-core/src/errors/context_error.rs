/// Context-intelligence (Tier 3) errors.
///
/// These are advisory: callers on the interactive path convert them to
/// cached/empty results instead of propagating.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("git invocation failed: {reason}")]
    GitFailed { reason: String },

    #[error("git invocation exceeded {timeout_secs}s deadline")]
    GitTimeout { timeout_secs: u64 },

    #[error("not a git repository: {path}")]
    NotARepository { path: String },

    #[error("unparseable git log output: {reason}")]
    UnparseableLog { reason: String },
}
