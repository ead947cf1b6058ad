use serde::{Deserialize, Serialize};

use super::defaults;

/// Export/import configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Identifier written into export documents as the producing machine.
    pub source_id: String,
    /// Confidence floor applied by `export` when the caller gives none.
    pub default_min_confidence: f64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            source_id: defaults::DEFAULT_SOURCE_ID.to_string(),
            default_min_confidence: defaults::DEFAULT_EXPORT_MIN_CONFIDENCE,
        }
    }
}
