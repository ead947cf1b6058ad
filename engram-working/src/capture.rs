//! Close-time capture policy: which conversations are worth distilling.
//!
//! Five criteria are checked against the message log; a conversation
//! that satisfies [`STRATEGIC_CRITERIA_REQUIRED`] or more is marked
//! strategic. Evaluation is read-only and bounded by
//! [`CAPTURE_SCAN_LIMIT`] so a runaway session cannot stall close.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use engram_core::config::WorkingConfig;
use engram_core::constants::{CAPTURE_SCAN_LIMIT, STRATEGIC_CRITERIA_REQUIRED};
use engram_core::models::Message;

/// Regex for file paths with source or config extensions.
static FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        [A-Za-z0-9_][A-Za-z0-9_./-]*
        \.(?:rs|py|ts|tsx|js|jsx|go|java|c|h|cpp|hpp|rb|sh|sql|proto|toml|ya?ml|json|md|lock|cfg|ini|env)
        \b",
    )
    .unwrap()
});

/// Regex for decision language ("we decided to", "the plan is", ...).
static DECISION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(decided to|decided against|we should|let's go with|lets go with|the plan is|agreed to|going with|settled on|chose to|opted for)\b",
    )
    .unwrap()
});

/// Regex for problem-resolution language ("fixed", "root cause", ...).
static RESOLUTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(fixed|resolved|solved|works now|working now|passes now|the fix was|the fix is|root cause|turned out to be|that did it)\b",
    )
    .unwrap()
});

/// Regex for sequencing language. Three or more hits across the
/// conversation indicate a multi-step workflow.
static STEP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(first|then|next|after that|finally|step \d+)\b").unwrap()
});

/// Regex for identifier-looking tokens: CamelCase names, snake_case
/// names with an underscore, and SCREAMING_CASE constants.
static IDENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:[A-Z][a-z0-9]+(?:[A-Z][a-z0-9]+)+|[a-z][a-z0-9]*(?:_[a-z0-9]+)+|[A-Z][A-Z0-9]*(?:_[A-Z0-9]+)+)\b")
        .unwrap()
});

static BACKTICK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`\n]{1,80})`").unwrap());

const MAX_TOUCHED_FILES: usize = 50;
const MAX_ENTITIES: usize = 20;
const STEP_HITS_REQUIRED: usize = 3;

/// Outcome of evaluating the capture criteria over one conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSignals {
    /// Criterion 1: more messages than the configured threshold.
    pub message_volume: bool,
    /// Criterion 2: file paths or fenced code blocks present.
    pub has_code_changes: bool,
    /// Criterion 3: decision language present.
    pub has_decision_markers: bool,
    /// Criterion 4: problem-resolution language present.
    pub has_resolution_markers: bool,
    /// Criterion 5: three or more sequencing markers.
    pub multi_step_workflow: bool,
}

impl CaptureSignals {
    /// How many of the five criteria hold.
    pub fn satisfied(&self) -> usize {
        [
            self.message_volume,
            self.has_code_changes,
            self.has_decision_markers,
            self.has_resolution_markers,
            self.multi_step_workflow,
        ]
        .iter()
        .filter(|&&flag| flag)
        .count()
    }

    pub fn is_strategic(&self) -> bool {
        self.satisfied() >= STRATEGIC_CRITERIA_REQUIRED
    }
}

/// Evaluate the capture criteria over a message log.
pub fn evaluate(messages: &[Message], config: &WorkingConfig) -> CaptureSignals {
    let mut file_hit = false;
    let mut fence_hit = false;
    let mut decision_hit = false;
    let mut resolution_hit = false;
    let mut step_hits = 0usize;

    for message in messages.iter().take(CAPTURE_SCAN_LIMIT) {
        let text = message.content.as_str();
        if !file_hit {
            file_hit = FILE_RE.is_match(text);
        }
        if !fence_hit {
            fence_hit = text.contains("```");
        }
        if !decision_hit {
            decision_hit = DECISION_RE.is_match(text);
        }
        if !resolution_hit {
            resolution_hit = RESOLUTION_RE.is_match(text);
        }
        if step_hits < STEP_HITS_REQUIRED {
            step_hits += STEP_RE.find_iter(text).count();
        }
    }

    CaptureSignals {
        message_volume: messages.len() > config.strategic_message_threshold,
        has_code_changes: file_hit || fence_hit,
        has_decision_markers: decision_hit,
        has_resolution_markers: resolution_hit,
        multi_step_workflow: step_hits >= STEP_HITS_REQUIRED,
    }
}

/// Whether a line carries decision or sequencing language. Distillation
/// uses this to pick workflow steps out of assistant turns.
pub(crate) fn is_step_line(line: &str) -> bool {
    DECISION_RE.is_match(line) || STEP_RE.is_match(line)
}

/// Whether a line carries problem-resolution language.
pub(crate) fn is_resolution_line(line: &str) -> bool {
    RESOLUTION_RE.is_match(line)
}

/// File paths mentioned anywhere in the conversation, deduplicated in
/// first-mention order.
pub fn extract_touched_files(messages: &[Message]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut files = Vec::new();

    for message in messages.iter().take(CAPTURE_SCAN_LIMIT) {
        for mat in FILE_RE.find_iter(&message.content) {
            let path = mat.as_str().to_string();
            if seen.insert(path.clone()) {
                files.push(path);
                if files.len() >= MAX_TOUCHED_FILES {
                    return files;
                }
            }
        }
    }
    files
}

/// Identifier-looking entities: backticked spans first (strongest
/// signal), then bare CamelCase/snake_case tokens.
pub fn extract_entities(messages: &[Message]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut entities = Vec::new();

    let mut push = |candidate: &str, entities: &mut Vec<String>| {
        let trimmed = candidate.trim();
        if trimmed.len() < 3 {
            return;
        }
        if seen.insert(trimmed.to_string()) {
            entities.push(trimmed.to_string());
        }
    };

    for message in messages.iter().take(CAPTURE_SCAN_LIMIT) {
        for cap in BACKTICK_RE.captures_iter(&message.content) {
            if let Some(span) = cap.get(1) {
                push(span.as_str(), &mut entities);
                if entities.len() >= MAX_ENTITIES {
                    return entities;
                }
            }
        }
    }

    for message in messages.iter().take(CAPTURE_SCAN_LIMIT) {
        for mat in IDENT_RE.find_iter(&message.content) {
            push(mat.as_str(), &mut entities);
            if entities.len() >= MAX_ENTITIES {
                return entities;
            }
        }
    }

    entities
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use engram_core::models::MessageRole;

    fn msg(role: MessageRole, content: &str) -> Message {
        Message {
            id: uuid::Uuid::new_v4().to_string(),
            conversation_id: "c1".to_string(),
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn sparse_chat_satisfies_nothing() {
        let messages = vec![
            msg(MessageRole::User, "hello"),
            msg(MessageRole::Assistant, "hi, what are we looking at today?"),
        ];
        let signals = evaluate(&messages, &WorkingConfig::default());
        assert_eq!(signals.satisfied(), 0);
        assert!(!signals.is_strategic());
    }

    #[test]
    fn decision_resolution_and_files_make_strategic() {
        let messages = vec![
            msg(MessageRole::User, "the retry loop in worker.rs spins forever"),
            msg(
                MessageRole::Assistant,
                "decided to cap retries at 3; the fix was resetting the backoff in worker.rs",
            ),
        ];
        let signals = evaluate(&messages, &WorkingConfig::default());
        assert!(signals.has_code_changes);
        assert!(signals.has_decision_markers);
        assert!(signals.has_resolution_markers);
        assert!(signals.is_strategic());
    }

    #[test]
    fn step_markers_need_three_hits() {
        let two = vec![msg(MessageRole::Assistant, "first check the log, then restart")];
        assert!(!evaluate(&two, &WorkingConfig::default()).multi_step_workflow);

        let three = vec![msg(
            MessageRole::Assistant,
            "first check the log, then restart, finally verify the health endpoint",
        )];
        assert!(evaluate(&three, &WorkingConfig::default()).multi_step_workflow);
    }

    #[test]
    fn touched_files_dedupe_in_first_mention_order() {
        let messages = vec![
            msg(MessageRole::User, "compare src/main.rs with src/lib.rs"),
            msg(MessageRole::Assistant, "src/main.rs calls into config.toml"),
        ];
        let files = extract_touched_files(&messages);
        assert_eq!(files, vec!["src/main.rs", "src/lib.rs", "config.toml"]);
    }

    #[test]
    fn entities_prefer_backticked_spans() {
        let messages = vec![msg(
            MessageRole::Assistant,
            "`RetryPolicy::max_attempts` now guards retry_loop and MAX_BACKOFF",
        )];
        let entities = extract_entities(&messages);
        assert_eq!(entities[0], "RetryPolicy::max_attempts");
        assert!(entities.contains(&"retry_loop".to_string()));
        assert!(entities.contains(&"MAX_BACKOFF".to_string()));
    }
}
