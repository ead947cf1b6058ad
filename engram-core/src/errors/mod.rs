//! Error types for the Engram workspace.
//!
//! Subsystem errors live in their own enums and convert into the
//! top-level [`EngramError`] via `#[from]`, so crate boundaries stay
//! clean while callers match on one type.

mod context_error;
mod store_error;
mod transfer_error;

pub use context_error::ContextError;
pub use store_error::StoreError;
pub use transfer_error::TransferError;

/// Convenience alias used across the workspace.
pub type EngramResult<T> = Result<T, EngramError>;

/// Top-level error for all Engram operations.
#[derive(Debug, thiserror::Error)]
pub enum EngramError {
    #[error("conversation not found: {id}")]
    ConversationNotFound { id: String },

    #[error("pattern not found: {id}")]
    PatternNotFound { id: String },

    #[error("validation failed: {reason}")]
    Validation { reason: String },

    #[error("degraded mode: {component} unavailable, falling back to {fallback}")]
    Degraded { component: String, fallback: String },

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("context error: {0}")]
    Context(#[from] ContextError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngramError {
    /// Shorthand for a [`EngramError::Validation`] with a formatted reason.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }
}
