//! SQL for the knowledge store, one module per concern.

pub mod audit_ops;
pub mod pattern_crud;
pub mod pattern_search;
