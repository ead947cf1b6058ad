//! Pre-eviction distillation: turn a closing conversation into pattern
//! drafts for the knowledge graph.
//!
//! Distillation is deliberately conservative. Every conversation that
//! touched two or more files yields a file-relationship draft; only
//! strategic conversations additionally yield a workflow draft. Drafts
//! start at modest confidence and earn the rest through access.

use engram_core::models::{Conversation, MessageRole, Namespace};
use engram_core::pattern::{
    Confidence, FileRelationshipContent, PatternDraft, PatternPayload, WorkflowContent,
};

const MAX_RELATED_FILES: usize = 10;
const MAX_WORKFLOW_STEPS: usize = 8;
const MIN_WORKFLOW_STEPS: usize = 2;
const STEP_SNIPPET_CHARS: usize = 140;

const FILE_DRAFT_CONFIDENCE: f64 = 0.5;
const STRATEGIC_DRAFT_CONFIDENCE: f64 = 0.6;

/// Drafts worth offering to Tier 2 for one closing conversation.
/// Namespace-tagged with the workspace the conversation ran in.
pub fn drafts_for(conversation: &Conversation, namespace: &Namespace) -> Vec<PatternDraft> {
    let mut drafts = Vec::new();

    if let Some(draft) = file_relationship_draft(conversation, namespace) {
        drafts.push(draft);
    }
    if conversation.strategic {
        if let Some(draft) = workflow_draft(conversation, namespace) {
            drafts.push(draft);
        }
    }
    drafts
}

/// Files that were discussed together probably change together.
fn file_relationship_draft(
    conversation: &Conversation,
    namespace: &Namespace,
) -> Option<PatternDraft> {
    if conversation.touched_files.len() < 2 {
        return None;
    }

    let files: Vec<String> = conversation
        .touched_files
        .iter()
        .take(MAX_RELATED_FILES)
        .cloned()
        .collect();

    let mut title = files
        .iter()
        .take(3)
        .map(|path| file_stem(path))
        .collect::<Vec<_>>()
        .join(", ");
    title = format!("files changed together: {title}");

    let confidence = if conversation.strategic {
        STRATEGIC_DRAFT_CONFIDENCE
    } else {
        FILE_DRAFT_CONFIDENCE
    };

    Some(PatternDraft {
        kind: "file_relationship".to_string(),
        title,
        payload: PatternPayload::FileRelationship(FileRelationshipContent {
            files,
            relation: "discussed and edited in the same conversation".to_string(),
        }),
        namespaces: vec![namespace.clone()],
        confidence: Confidence::new(confidence),
    })
}

/// A strategic conversation's assistant turns, filtered down to the
/// lines that carried decisions, fixes or sequencing.
fn workflow_draft(conversation: &Conversation, namespace: &Namespace) -> Option<PatternDraft> {
    let mut steps = Vec::new();
    let mut outcome = None;

    for message in &conversation.messages {
        if message.role != MessageRole::Assistant {
            continue;
        }
        for line in message.content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let is_resolution = crate::capture::is_resolution_line(line);
            if is_resolution {
                outcome = Some(snippet(line));
            }
            if (crate::capture::is_step_line(line) || is_resolution)
                && steps.len() < MAX_WORKFLOW_STEPS
            {
                steps.push(snippet(line));
            }
        }
    }

    if steps.len() < MIN_WORKFLOW_STEPS {
        return None;
    }

    let trigger = conversation
        .messages
        .iter()
        .find(|m| m.role == MessageRole::User)
        .map(|m| snippet(m.content.trim()));

    let title = trigger
        .clone()
        .unwrap_or_else(|| format!("workflow from {}", &conversation.id[..8.min(conversation.id.len())]));

    Some(PatternDraft {
        kind: "workflow".to_string(),
        title,
        payload: PatternPayload::Workflow(WorkflowContent {
            steps,
            trigger,
            outcome,
        }),
        namespaces: vec![namespace.clone()],
        confidence: Confidence::new(STRATEGIC_DRAFT_CONFIDENCE),
    })
}

fn file_stem(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn snippet(line: &str) -> String {
    if line.chars().count() <= STEP_SNIPPET_CHARS {
        return line.to_string();
    }
    let cut: String = line.chars().take(STEP_SNIPPET_CHARS).collect();
    format!("{}…", cut.trim_end())
}
