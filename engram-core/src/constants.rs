/// Engram system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Format version of the portable export document.
pub const EXPORT_FORMAT_VERSION: u32 = 1;

/// Reserved namespace for built-in, machine-independent knowledge.
pub const CORE_NAMESPACE: &str = "core";

/// Store file names, one per tier.
pub const WORKING_DB: &str = "working.db";
pub const KNOWLEDGE_DB: &str = "knowledge.db";
pub const CONTEXT_DB: &str = "context.db";

/// Config file looked up in the working directory when no path is given.
pub const CONFIG_FILE: &str = "engram.toml";

/// Number of capture-policy criteria that must hold for a conversation
/// to be marked strategic.
pub const STRATEGIC_CRITERIA_REQUIRED: usize = 3;

/// Maximum number of messages inspected per conversation when the
/// capture policy runs at close time.
pub const CAPTURE_SCAN_LIMIT: usize = 500;
