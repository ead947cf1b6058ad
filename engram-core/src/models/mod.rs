pub mod context_report;
pub mod conversation;
pub mod namespace;
pub mod stats;
pub mod suggestion;
pub mod transfer_audit;

pub use context_report::{
    ContextReport, FileStability, Insight, InsightSeverity, StabilityBand, VelocitySample,
    VelocityTrend,
};
pub use conversation::{Conversation, ConversationStatus, Message, MessageRole};
pub use namespace::Namespace;
pub use stats::{KnowledgeStats, WorkingStats};
pub use suggestion::{FactorBreakdown, Suggestion};
pub use transfer_audit::{AuditRecord, TransferDecision};
