//! Workspace configuration, loaded from TOML.
//!
//! Every struct takes `#[serde(default)]` so a partial file overrides
//! only what it names; an empty file yields the documented defaults.

pub mod defaults;

mod context_config;
mod knowledge_config;
mod relevance_config;
mod transfer_config;
mod working_config;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{CONTEXT_DB, KNOWLEDGE_DB, WORKING_DB};
use crate::errors::{EngramError, EngramResult};

pub use context_config::ContextConfig;
pub use knowledge_config::KnowledgeConfig;
pub use relevance_config::RelevanceConfig;
pub use transfer_config::TransferConfig;
pub use working_config::WorkingConfig;

/// Root configuration for the whole engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngramConfig {
    /// Directory holding the per-tier store files.
    pub data_dir: PathBuf,
    pub working: WorkingConfig,
    pub knowledge: KnowledgeConfig,
    pub context: ContextConfig,
    pub relevance: RelevanceConfig,
    pub transfer: TransferConfig,
}

impl Default for EngramConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(defaults::DEFAULT_DATA_DIR),
            working: WorkingConfig::default(),
            knowledge: KnowledgeConfig::default(),
            context: ContextConfig::default(),
            relevance: RelevanceConfig::default(),
            transfer: TransferConfig::default(),
        }
    }
}

impl EngramConfig {
    /// Parse a TOML string. Missing sections and fields take defaults.
    pub fn from_toml(raw: &str) -> EngramResult<Self> {
        toml::from_str(raw).map_err(|e| EngramError::Validation {
            reason: format!("invalid config: {e}"),
        })
    }

    /// Load from a file path.
    pub fn load(path: &Path) -> EngramResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    /// Load from a file path, tolerating a missing file (defaults).
    /// A present-but-invalid file is still an error.
    pub fn load_or_default(path: &Path) -> EngramResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Path of the Tier 1 store file.
    pub fn working_db_path(&self) -> PathBuf {
        self.data_dir.join(WORKING_DB)
    }

    /// Path of the Tier 2 store file.
    pub fn knowledge_db_path(&self) -> PathBuf {
        self.data_dir.join(KNOWLEDGE_DB)
    }

    /// Path of the Tier 3 snapshot store file.
    pub fn context_db_path(&self) -> PathBuf {
        self.data_dir.join(CONTEXT_DB)
    }
}
