//! Capability kinds understood by the engine.

use std::collections::BTreeMap;
use std::path::Path;

use super::capability::{Capability, Identified};
use crate::error::Result;
use crate::mount::MountPoint;
use crate::scan::{LocalizationLocator, TemplateInfo};

/// Finds templates and their localizations inside a mounted source.
pub trait Generator: Identified {
    /// Templates and localization files found in `mount`.
    fn templates_and_localizations(
        &self,
        mount: &dyn MountPoint,
    ) -> Result<(Vec<TemplateInfo>, Vec<LocalizationLocator>)>;
}

impl Capability for dyn Generator {
    const NAME: &'static str = "scaffolder.generator";
}

/// Recognizes install sources a host can add content from.
pub trait InstallerFactory: Identified {
    /// Short human-readable name of the installer.
    fn name(&self) -> &str;

    /// Whether this installer can handle `location`.
    fn can_install(&self, location: &str) -> bool;
}

impl Capability for dyn InstallerFactory {
    const NAME: &'static str = "scaffolder.installer-factory";
}

/// Runs an action after a template has been instantiated.
pub trait PostActionProcessor: Identified {
    /// Run the action. Returns whether it succeeded.
    fn process(&self, arguments: &BTreeMap<String, String>, output_root: &Path) -> Result<bool>;
}

impl Capability for dyn PostActionProcessor {
    const NAME: &'static str = "scaffolder.post-action";
}

