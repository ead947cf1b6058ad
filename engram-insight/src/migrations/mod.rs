//! Context store schema, applied through the shared migration runner.

mod v001_snapshots;

use engram_store::Migration;

/// Migration list for the context store, ascending.
pub fn migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        name: "snapshots",
        migrate: v001_snapshots::migrate,
    }]
}
