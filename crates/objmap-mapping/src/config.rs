//! Mapper configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Limits applied while mapping nested members
///
/// ```yaml
/// max_depth: 32
/// detect_cycles: true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Maximum number of nested mapper calls on one path
    pub max_depth: usize,

    /// Fail when a source instance is mapped to the same pair while it is
    /// already being mapped on the current path
    pub detect_cycles: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            detect_cycles: true,
        }
    }
}

impl MapperConfig {
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_cycle_detection(mut self, detect_cycles: bool) -> Self {
        self.detect_cycles = detect_cycles;
        self
    }

    /// Parse a configuration from YAML. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error when YAML parsing fails.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))
    }

    /// Parse a configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read file: {e}")))?;
        Self::from_yaml_str(&content)
    }
}
