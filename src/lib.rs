//! Scaffolder - component registry and module resolution for a template
//! engine.
//!
//! Scaffolder discovers pluggable components (generators, installers,
//! post-action processors) contributed by external modules, keeps a
//! persisted index of them for fast restarts, and resolves which module
//! file satisfies a requested module reference when several versions are
//! on disk.
//!
//! # Modules
//!
//! - [`component`] - Capabilities, component instances and the registry
//! - [`config`] - Engine configuration
//! - [`engine`] - Wiring of registry, resolver and scanner
//! - [`error`] - Error types and result aliases
//! - [`host`] - Host services: file system, diagnostics, built-ins
//! - [`logging`] - Tracing subscriber setup
//! - [`module`] - Module identities, loading and version resolution
//! - [`mount`] - Content sources
//! - [`scan`] - Discovery of templates and components
//! - [`settings`] - Persisted component index
//!
//! # Example
//!
//! ```
//! use scaffolder::module::{ModuleIdentity, ModuleVersion};
//!
//! let identity: ModuleIdentity = "Acme.Components, Version=1.2".parse().unwrap();
//! assert_eq!(identity.version, Some(ModuleVersion::new(1, 2, 0, 0)));
//! assert_eq!(
//!     identity.to_string(),
//!     "Acme.Components, Version=1.2.0.0, Culture=neutral, PublicKey=null"
//! );
//! ```
//!
//! For end-to-end scanning and resolution, see the integration tests.

pub mod component;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod logging;
pub mod module;
pub mod mount;
pub mod scan;
pub mod settings;

pub use engine::EngineEnvironment;
pub use error::{Result, ScaffolderError};
