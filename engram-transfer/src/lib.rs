//! # engram-transfer
//!
//! Moves knowledge between machines: export signs a scoped pattern set
//! into a portable JSON document, import verifies the signature and
//! reconciles each entry against local state with similarity-tiered
//! conflict handling and a full audit trail.

pub mod document;
pub mod reconcile;

pub use document::{export_patterns, ExportDocument, ExportScope, Manifest, DOCUMENT_VERSION};
pub use reconcile::{import_document, ImportReport, ImportStrategy};
