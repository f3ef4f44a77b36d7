//! Persisted component index.
//!
//! After a scan that found components, the registry writes a JSON file
//! listing every component id, its type reference, the capabilities it
//! was registered under and the content sources it came from. The next
//! process start reads the file back so components can be activated on
//! demand without rescanning.

pub mod store;

pub use store::{
    ComponentSettings, SettingsStore, DEFAULT_MAX_LOAD_ATTEMPTS, DEFAULT_RETRY_DELAY,
    SETTINGS_VERSION,
};
