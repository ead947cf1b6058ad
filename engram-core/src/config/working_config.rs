use serde::{Deserialize, Serialize};

use super::defaults;

/// Working-memory (Tier 1) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkingConfig {
    /// Maximum number of complete conversations retained before FIFO
    /// eviction. The active conversation never counts against this.
    pub capacity: usize,
    /// Message count above which the capture policy's volume criterion
    /// is satisfied.
    pub strategic_message_threshold: usize,
    /// Idle minutes after which an active conversation is considered
    /// abandoned and rolled over on the next append.
    pub idle_gap_minutes: i64,
}

impl Default for WorkingConfig {
    fn default() -> Self {
        Self {
            capacity: defaults::DEFAULT_WORKING_CAPACITY,
            strategic_message_threshold: defaults::DEFAULT_STRATEGIC_MESSAGE_THRESHOLD,
            idle_gap_minutes: defaults::DEFAULT_IDLE_GAP_MINUTES,
        }
    }
}
