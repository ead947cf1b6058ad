//! Knowledge store schema, applied through the shared migration runner.

mod v001_patterns;
mod v002_pattern_fts;
mod v003_transfer_audit;

use engram_store::Migration;

/// Migration list for the knowledge store, ascending.
pub fn migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            name: "patterns",
            migrate: v001_patterns::migrate,
        },
        Migration {
            version: 2,
            name: "pattern_fts",
            migrate: v002_pattern_fts::migrate,
        },
        Migration {
            version: 3,
            name: "transfer_audit",
            migrate: v003_transfer_audit::migrate,
        },
    ]
}
