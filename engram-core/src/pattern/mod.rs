pub mod base;
pub mod confidence;
pub mod draft;
pub mod payload;

pub use base::Pattern;
pub use confidence::Confidence;
pub use draft::PatternDraft;
pub use payload::{
    FileRelationshipContent, IntentMappingContent, PatternPayload, WorkflowContent,
};
