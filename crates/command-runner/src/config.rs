//! Runner configuration loaded from YAML or JSON
//!
//! ```yaml
//! env:
//!   - MAVEN_OPTS=-Xmx1g
//! inherit_env: true
//! dir: /work
//! error_categories:
//!   config:
//!     - "Could not resolve dependencies*"
//!   build:
//!     - "BUILD FAILURE"
//! ```

use crate::classifier::ErrorCategoryMapping;
use crate::error::{Error, Result};
use crate::runner::Runner;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings applied to a [`Runner`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    /// `KEY=VALUE` entries for the environment overlay
    pub env: Vec<String>,
    /// Start the overlay from this process's environment
    pub inherit_env: bool,
    /// Working directory for commands
    pub dir: Option<PathBuf>,
    /// Patterns per error category, in matching order
    pub error_categories: ErrorCategoryMapping,
}

impl RunnerConfig {
    /// Parse YAML configuration
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::config(format!("YAML: {e}")))
    }

    /// Parse JSON configuration
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| Error::config(format!("JSON: {e}")))
    }

    /// Load configuration from a file; `.json` files are parsed as JSON,
    /// anything else as YAML
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("failed to read {}: {e}", path.display())))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }
}

impl Runner {
    /// Create a runner with `config` applied
    pub fn from_config(config: &RunnerConfig) -> Self {
        let mut runner = Runner::new().with_error_categories(config.error_categories.clone());
        if config.inherit_env {
            runner.inherit_env();
        }
        runner.append_env(config.env.iter().cloned());
        if let Some(dir) = &config.dir {
            runner.set_dir(dir);
        }
        runner
    }
}
