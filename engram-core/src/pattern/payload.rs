use serde::{Deserialize, Serialize};

/// A recurring sequence of actions observed across conversations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowContent {
    pub steps: Vec<String>,
    pub trigger: Option<String>,
    pub outcome: Option<String>,
}

/// A mapping from a user phrasing to the action it resolved to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntentMappingContent {
    pub phrasing: String,
    pub action: String,
    pub examples: Vec<String>,
}

/// Files that change together or depend on each other.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileRelationshipContent {
    pub files: Vec<String>,
    pub relation: String,
}

/// Typed pattern content: each known pattern kind has its own struct.
/// Serialized as a tagged enum so the kind is preserved in JSON; unknown
/// kinds round-trip through the untagged `Other` variant so documents
/// produced by newer builds still import cleanly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum PatternPayload {
    Workflow(WorkflowContent),
    IntentMapping(IntentMappingContent),
    FileRelationship(FileRelationshipContent),
    #[serde(untagged)]
    Other(serde_json::Value),
}

impl PatternPayload {
    /// Canonical kind string for known payloads; `None` for `Other`.
    pub fn kind(&self) -> Option<&'static str> {
        match self {
            Self::Workflow(_) => Some("workflow"),
            Self::IntentMapping(_) => Some("intent_mapping"),
            Self::FileRelationship(_) => Some("file_relationship"),
            Self::Other(_) => None,
        }
    }

    /// Searchable text materialized from the payload.
    ///
    /// Stored in the pattern's `description` column at write time so the
    /// full-text index covers payload content without parsing JSON at
    /// query time.
    pub fn describe(&self) -> String {
        match self {
            Self::Workflow(w) => {
                let mut parts = w.steps.clone();
                if let Some(trigger) = &w.trigger {
                    parts.push(trigger.clone());
                }
                if let Some(outcome) = &w.outcome {
                    parts.push(outcome.clone());
                }
                parts.join(" ")
            }
            Self::IntentMapping(m) => {
                let mut parts = vec![m.phrasing.clone(), m.action.clone()];
                parts.extend(m.examples.iter().cloned());
                parts.join(" ")
            }
            Self::FileRelationship(f) => {
                let mut parts = f.files.clone();
                parts.push(f.relation.clone());
                parts.join(" ")
            }
            Self::Other(value) => {
                let mut out = Vec::new();
                collect_strings(value, &mut out);
                out.join(" ")
            }
        }
    }
}

/// Depth-first collection of every string value in a JSON tree.
fn collect_strings(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::String(s) => out.push(s.clone()),
        serde_json::Value::Array(items) => {
            for item in items {
                collect_strings(item, out);
            }
        }
        serde_json::Value::Object(map) => {
            for item in map.values() {
                collect_strings(item, out);
            }
        }
        _ => {}
    }
}
