//! # engram-decay
//!
//! Pure decay math: the compounding confidence-decay curve applied to
//! idle patterns, and the prune policy that retires the ones decay has
//! written off. No storage here; the knowledge crate drives these
//! against its own store.

pub mod formula;
pub mod prune;

pub use formula::{compute, compute_breakdown, days_since_access, DecayBreakdown, DecayPolicy};
pub use prune::{evaluate as evaluate_prune, PruneDecision, PrunePolicy};
