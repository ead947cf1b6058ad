use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            "system" => Ok(Self::System),
            other => Err(format!("unknown message role: {other}")),
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Conversation lifecycle state. Exactly one conversation may be
/// `Active` at a time; it is never evicted regardless of age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    Active,
    Complete,
}

impl ConversationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Complete => "complete",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw {
            "active" => Ok(Self::Active),
            "complete" => Ok(Self::Complete),
            other => Err(format!("unknown conversation status: {other}")),
        }
    }
}

/// A single exchange turn, owned exclusively by its conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A Tier 1 working-memory record: one session's worth of exchanges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// UUID v4 identifier.
    pub id: String,
    pub status: ConversationStatus,
    pub started_at: DateTime<Utc>,
    /// Set when the conversation transitions to `Complete`.
    pub ended_at: Option<DateTime<Utc>>,
    /// Capture-policy outcome: 3+ satisfied criteria at close time.
    pub strategic: bool,
    /// Entities extracted at close (identifiers, commands, proper nouns).
    pub entities: Vec<String>,
    /// File paths mentioned across the conversation, extracted at close.
    pub touched_files: Vec<String>,
    /// Messages in append order. Populated on read paths that load the
    /// full conversation; eviction and capture queries go to the store
    /// directly.
    pub messages: Vec<Message>,
}
