//! Engine configuration loading.
//!
//! # Example
//!
//! ```
//! use scaffolder::config::EngineConfig;
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let path = temp.path().join("engine.yml");
//! fs::write(&path, "components_file: registry.json").unwrap();
//!
//! let config = EngineConfig::load(&path).unwrap();
//! assert!(config.components_file_path().ends_with("registry.json"));
//! ```

pub mod engine;

pub use engine::{EngineConfig, CULTURE_POLICY_ENV, SETTINGS_DIR_ENV};
