//! Engine configuration.
//!
//! Configuration is read from an optional YAML file and then overridden by
//! environment variables:
//!
//! ```yaml
//! settings_dir: /home/me/.scaffolder
//! components_file: components.json
//! module_suffix: .module.json
//! discovery_suffix: .components.module.json
//! max_load_attempts: 20
//! retry_delay_ms: 2
//! culture_policy: strict
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScaffolderError};
use crate::module::CulturePolicy;

/// Overrides [`EngineConfig::settings_dir`].
pub const SETTINGS_DIR_ENV: &str = "SCAFFOLDER_SETTINGS_DIR";

/// Overrides [`EngineConfig::culture_policy`].
pub const CULTURE_POLICY_ENV: &str = "SCAFFOLDER_CULTURE_POLICY";

/// Engine settings. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding the settings file.
    pub settings_dir: PathBuf,

    /// File name of the component settings file inside `settings_dir`.
    pub components_file: String,

    /// Suffix of module files looked up by the resolver.
    pub module_suffix: String,

    /// Suffix of module files picked up by a scan.
    pub discovery_suffix: String,

    /// Attempts made to read the settings file.
    pub max_load_attempts: u32,

    /// Pause between read attempts, in milliseconds.
    pub retry_delay_ms: u64,

    /// Culture comparison rule used by the resolver.
    pub culture_policy: CulturePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            settings_dir: default_settings_dir(),
            components_file: "components.json".to_string(),
            module_suffix: ".module.json".to_string(),
            discovery_suffix: ".components.module.json".to_string(),
            max_load_attempts: 20,
            retry_delay_ms: 2,
            culture_policy: CulturePolicy::Strict,
        }
    }
}

fn default_settings_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".scaffolder")
}

impl EngineConfig {
    /// Load configuration from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    /// Parse YAML configuration. `path` is used for error messages.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(content).map_err(|e| ScaffolderError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup`.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(dir) = lookup(SETTINGS_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            self.settings_dir = PathBuf::from(dir);
        }
        if let Some(policy) = lookup(CULTURE_POLICY_ENV).filter(|v| !v.trim().is_empty()) {
            self.culture_policy = policy.parse()?;
        }
        Ok(())
    }

    /// Full path of the component settings file.
    pub fn components_file_path(&self) -> PathBuf {
        self.settings_dir.join(&self.components_file)
    }

    /// Pause between settings read attempts.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
