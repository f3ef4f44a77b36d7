//! Content source scanning.
//!
//! A scan mounts a content source, asks every registered generator for
//! templates and localizations, then loads each module file in the source
//! and collects the components it exports. The outcome is a
//! [`ScanResult`]; registering it is up to the caller.

pub mod result;
pub mod scanner;
pub mod template;

pub use result::ScanResult;
pub use scanner::{Scanner, DEFAULT_DISCOVERY_SUFFIX};
pub use template::{LocalizationLocator, TemplateInfo};
