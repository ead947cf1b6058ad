//! # engram-consolidate
//!
//! Similarity scoring and tiered merge decisions for near-duplicate patterns.
//! Term-frequency cosine over title/description/payload text; pairs at the
//! high band collapse to the stronger record, pairs in the middle band merge
//! with occurrence-weighted confidence, everything below stays distinct.

pub mod merge;
pub mod similarity;

pub use merge::{
    evaluate, evaluate_pair, merge_patterns, weighted_confidence, MergeOutcome, MergePolicy,
};
pub use similarity::{cosine_similarity, pattern_similarity, pattern_text, term_frequencies};
