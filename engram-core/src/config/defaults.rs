//! Default values for every tunable. Kept in one place so the config
//! structs and their docs stay in agreement.

// Working memory (Tier 1)
pub const DEFAULT_WORKING_CAPACITY: usize = 50;
pub const DEFAULT_STRATEGIC_MESSAGE_THRESHOLD: usize = 8;
pub const DEFAULT_IDLE_GAP_MINUTES: i64 = 240;

// Knowledge graph (Tier 2)
pub const DEFAULT_MIN_STORE_CONFIDENCE: f64 = 0.40;
pub const DEFAULT_DECAY_AFTER_DAYS: i64 = 30;
pub const DEFAULT_DECAY_RATE_PER_DAY: f64 = 0.02;
pub const DEFAULT_MERGE_THRESHOLD: f64 = 0.70;
pub const DEFAULT_DUPLICATE_THRESHOLD: f64 = 0.98;
pub const DEFAULT_PRUNE_CONFIDENCE_FLOOR: f64 = 0.25;
pub const DEFAULT_PRUNE_AGE_DAYS: i64 = 90;
pub const DEFAULT_ACTIVE_NAMESPACE_BOOST: f64 = 2.0;
pub const DEFAULT_CORE_NAMESPACE_BOOST: f64 = 1.5;
pub const DEFAULT_FOREIGN_NAMESPACE_DISCOUNT: f64 = 0.7;

// Context intelligence (Tier 3)
pub const DEFAULT_COLLECT_INTERVAL_MINUTES: i64 = 60;
pub const DEFAULT_WINDOW_DAYS: u32 = 30;
pub const DEFAULT_GIT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_STABLE_BAND: f64 = 0.10;
pub const DEFAULT_MODERATE_BAND: f64 = 0.20;
pub const DEFAULT_VELOCITY_TREND_THRESHOLD: f64 = 0.30;

// Relevance ranking
pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_SUGGEST_MIN_CONFIDENCE: f64 = 0.30;
pub const DEFAULT_TEXT_WEIGHT: f64 = 0.40;
pub const DEFAULT_CONFIDENCE_WEIGHT: f64 = 0.30;
pub const DEFAULT_POPULARITY_WEIGHT: f64 = 0.20;
pub const DEFAULT_RECENCY_WEIGHT: f64 = 0.10;
pub const DEFAULT_RECENCY_SCALE_DAYS: f64 = 30.0;
pub const DEFAULT_POPULARITY_HALF_SATURATION: f64 = 10.0;

// Transfer
pub const DEFAULT_SOURCE_ID: &str = "local";
pub const DEFAULT_EXPORT_MIN_CONFIDENCE: f64 = 0.0;

// Paths
pub const DEFAULT_DATA_DIR: &str = ".engram";
