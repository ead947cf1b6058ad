use crate::errors::EngramResult;
use crate::pattern::Pattern;

/// Outcome of a write-policy review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyVerdict {
    Allow,
    /// Write rejected with an operator-facing reason.
    Deny { reason: String },
}

/// Pluggable review of proposed pattern writes.
///
/// The knowledge graph consults an optional policy before inserting;
/// governance layers implement this instead of being wired into the
/// write path. The default configuration installs none.
pub trait IWritePolicy: Send + Sync {
    fn review(&self, proposed: &Pattern) -> EngramResult<PolicyVerdict>;
}
