//! # engram-insight
//!
//! Tier 3: context intelligence derived from version-control history.
//! One throttled `git log` per interval feeds per-file churn/stability
//! classification and a two-window velocity trend; everything here is
//! advisory and regenerable, so failures degrade to cached or empty
//! reports instead of propagating.

pub mod analysis;
pub mod collector;
pub mod git;
pub mod migrations;
pub mod queries;

pub use collector::ContextCollector;
pub use git::CommitRecord;
