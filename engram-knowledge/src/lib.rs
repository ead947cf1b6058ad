//! # engram-knowledge
//!
//! Tier 2: the long-lived pattern store. Validated writes with an
//! optional governance hook, FTS5-ranked search with namespace
//! weighting, and the background passes for confidence decay,
//! similarity-tiered consolidation, and pruning. Implements
//! [`engram_core::traits::IPatternSink`] so working memory can hand
//! distilled drafts across without a back-reference.

pub mod graph;
pub mod migrations;
pub mod queries;

pub use graph::{
    ConsolidatePassReport, DecayPassReport, KnowledgeGraph, PrunePassReport, SearchHit,
};
