//! Namespace tags partitioning patterns by origin.
//!
//! The reserved `core` namespace holds machine-independent knowledge and is
//! categorically protected from prune and selective reset. Everything else
//! is a project namespace named after the workspace it was learned in.

use serde::{Deserialize, Serialize};

use crate::constants::CORE_NAMESPACE;

/// A namespace tag carried by every pattern.
///
/// Canonical string form: `"core"` for the reserved namespace, otherwise
/// the project name itself (e.g. `"proj"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Namespace {
    /// Reserved namespace for built-in, machine-independent knowledge.
    Core,
    /// Project-specific namespace.
    Project(String),
}

impl Namespace {
    /// Parse a namespace string. The reserved name is matched
    /// case-insensitively; project names must be non-empty and free of
    /// whitespace.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err("namespace cannot be empty".to_string());
        }
        if trimmed.eq_ignore_ascii_case(CORE_NAMESPACE) {
            return Ok(Self::Core);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(format!("namespace cannot contain whitespace: {raw:?}"));
        }
        Ok(Self::Project(trimmed.to_string()))
    }

    /// The canonical string form.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Core => CORE_NAMESPACE,
            Self::Project(name) => name,
        }
    }

    /// Whether this is the reserved core namespace.
    pub fn is_core(&self) -> bool {
        matches!(self, Self::Core)
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<Namespace> for String {
    fn from(ns: Namespace) -> Self {
        ns.as_str().to_string()
    }
}

impl TryFrom<String> for Namespace {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_core_is_case_insensitive() {
        assert_eq!(Namespace::parse("core").unwrap(), Namespace::Core);
        assert_eq!(Namespace::parse("CORE").unwrap(), Namespace::Core);
    }

    #[test]
    fn parse_rejects_empty_and_whitespace() {
        assert!(Namespace::parse("").is_err());
        assert!(Namespace::parse("   ").is_err());
        assert!(Namespace::parse("my project").is_err());
    }

    #[test]
    fn serde_uses_canonical_string_form() {
        let ns = Namespace::Project("proj".into());
        let json = serde_json::to_string(&ns).unwrap();
        assert_eq!(json, "\"proj\"");
        let back: Namespace = serde_json::from_str("\"core\"").unwrap();
        assert!(back.is_core());
    }
}
