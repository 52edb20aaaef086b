//! Engine configuration with TOML file support.

use serde::{Deserialize, Serialize};

use crate::GroupError;

/// Limits applied by the group keeper.
///
/// Can be loaded from a TOML file via [`GroupConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default, so an
/// empty document is a valid configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Upper bound, in bytes, for every metadata string.
    #[serde(default = "default_max_metadata_len")]
    pub max_metadata_len: usize,

    /// How long after the voting period an accepted proposal stays executable.
    #[serde(default = "default_max_execution_period_secs")]
    pub max_execution_period_secs: u64,
}

fn default_max_metadata_len() -> usize {
    255
}

fn default_max_execution_period_secs() -> u64 {
    // 14 days
    14 * 24 * 60 * 60
}

impl GroupConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, GroupError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| GroupError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, GroupError> {
        toml::from_str(s).map_err(|e| GroupError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, GroupError> {
        toml::to_string_pretty(self).map_err(|e| GroupError::Config(e.to_string()))
    }
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            max_metadata_len: default_max_metadata_len(),
            max_execution_period_secs: default_max_execution_period_secs(),
        }
    }
}
