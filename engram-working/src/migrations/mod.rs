//! Working store schema, applied through the shared migration runner.

mod v001_conversations;

use engram_store::Migration;

/// Migration list for the working store, ascending.
pub fn migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        name: "conversations",
        migrate: v001_conversations::migrate,
    }]
}
