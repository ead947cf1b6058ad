//! # engram-core
//!
//! Foundation crate for the Engram tiered memory engine.
//! Defines all types, traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod cancel;
pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod pattern;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use cancel::CancelToken;
pub use config::EngramConfig;
pub use errors::{EngramError, EngramResult};
pub use models::Namespace;
pub use pattern::{Confidence, Pattern, PatternDraft, PatternPayload};
