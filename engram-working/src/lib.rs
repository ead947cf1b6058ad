//! # engram-working
//!
//! Tier 1: the conversation log. Messages append to exactly one active
//! conversation; closing a conversation runs the five-criterion capture
//! policy, and complete conversations past capacity are evicted oldest
//! first, each distilled into pattern drafts and offered to the
//! knowledge sink on the way out.

pub mod capture;
pub mod distill;
pub mod memory;
pub mod migrations;
pub mod queries;

pub use capture::CaptureSignals;
pub use memory::{EvictionReport, WorkingMemory, NEW_CONVERSATION};
