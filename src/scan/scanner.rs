//! Discovery of templates and components in a content source.

use std::sync::Arc;

use tracing::{debug, info};

use super::result::ScanResult;
use super::template::{LocalizationLocator, TemplateInfo};
use crate::component::{CapabilityId, CapabilityRegistry, ComponentInstance, Generator};
use crate::error::{Result, ScaffolderError};
use crate::host::Diagnostics;
use crate::module::ModuleLoader;
use crate::mount::{MountPoint, MountPointProvider};

/// Default file name suffix of module files picked up by a scan.
pub const DEFAULT_DISCOVERY_SUFFIX: &str = ".components.module.json";

/// Scans content sources.
pub struct Scanner {
    mounts: Arc<dyn MountPointProvider>,
    loader: Arc<dyn ModuleLoader>,
    diagnostics: Arc<dyn Diagnostics>,
    discovery_suffix: String,
}

impl Scanner {
    /// Create a scanner.
    pub fn new(
        mounts: Arc<dyn MountPointProvider>,
        loader: Arc<dyn ModuleLoader>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            mounts,
            loader,
            diagnostics,
            discovery_suffix: DEFAULT_DISCOVERY_SUFFIX.to_string(),
        }
    }

    /// Use a different module file suffix.
    pub fn with_discovery_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.discovery_suffix = suffix.into();
        self
    }

    /// Scan `source_location`.
    ///
    /// Every generator known to `registry` is asked for templates first,
    /// then every module file under the source is loaded and its
    /// components collected. A generator or module that fails is reported
    /// to diagnostics and skipped.
    pub fn scan(&self, source_location: &str, registry: &CapabilityRegistry) -> Result<ScanResult> {
        if source_location.trim().is_empty() {
            return Err(ScaffolderError::InvalidSource {
                location: source_location.to_string(),
                message: "source location must not be empty".to_string(),
            });
        }

        let mount = self.mounts.try_mount(source_location).ok_or_else(|| {
            ScaffolderError::InvalidSource {
                location: source_location.to_string(),
                message: "location is not supported or does not exist".to_string(),
            }
        })?;

        let (templates, localizations) = self.scan_templates(mount.as_ref(), registry);
        let components = self.scan_components(mount.as_ref());

        info!(
            source = %mount.uri(),
            templates = templates.len(),
            components = components.len(),
            "Scanned source"
        );

        Ok(ScanResult {
            mount_point_uri: mount.uri().to_string(),
            templates,
            localizations,
            components,
        })
    }

    fn scan_templates(
        &self,
        mount: &dyn MountPoint,
        registry: &CapabilityRegistry,
    ) -> (Vec<TemplateInfo>, Vec<LocalizationLocator>) {
        let mut templates = Vec::new();
        let mut localizations = Vec::new();

        for generator in registry.of_type::<dyn Generator>() {
            match generator.templates_and_localizations(mount) {
                Ok((found, locators)) => {
                    templates.extend(found);
                    localizations.extend(locators);
                }
                Err(e) => self.diagnostics.diagnostic(&format!(
                    "Generator {} failed on {}: {}",
                    generator.id(),
                    mount.uri(),
                    e
                )),
            }
        }

        (templates, localizations)
    }

    fn scan_components(&self, mount: &dyn MountPoint) -> Vec<(CapabilityId, ComponentInstance)> {
        let files = match mount.enumerate_files(&self.discovery_suffix) {
            Ok(files) => files,
            Err(e) => {
                self.diagnostics.diagnostic(&format!(
                    "Failed to enumerate modules in {}: {}",
                    mount.uri(),
                    e
                ));
                return Vec::new();
            }
        };

        let mut components = Vec::new();
        for path in files {
            let module = match self.loader.load(&path) {
                Ok(module) => module,
                Err(e) => {
                    self.diagnostics.diagnostic(&e.to_string());
                    continue;
                }
            };

            for instance in module.instantiate_all() {
                let registrations = instance.registrations();
                if registrations.is_empty() {
                    debug!(
                        type_reference = %instance.type_reference(),
                        "Skipping component without capabilities"
                    );
                    continue;
                }
                components.extend(registrations);
            }
        }

        components
    }
}
