//! Relevance ranking engine.
//!
//! Turns Tier 2 search hits into ranked, advisory suggestions by combining
//! text relevance with stored confidence, access popularity, and recency of
//! use. Suggestions are ephemeral: recomputed per query, never persisted,
//! and never allowed to fail the caller.

pub mod engine;
pub mod scorer;

pub use engine::{QueryContext, RelevanceEngine};
