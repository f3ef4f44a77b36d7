//! Wiring of the registry, resolver and scanner.

use std::sync::Arc;

use tracing::info;

use crate::component::{CapabilityRegistry, ComponentActivator};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::host::EngineHost;
use crate::module::{ManifestModuleLoader, ModuleCatalog, ModuleLoader, ResolverOptions, VersionResolver};
use crate::scan::{ScanResult, Scanner};
use crate::settings::SettingsStore;

/// A ready-to-use engine: host services, configuration, a seeded
/// registry and a scanner.
pub struct EngineEnvironment {
    host: Arc<dyn EngineHost>,
    config: EngineConfig,
    resolver: Arc<VersionResolver>,
    registry: CapabilityRegistry,
    scanner: Scanner,
}

impl EngineEnvironment {
    /// Build an environment that loads module manifests and binds their
    /// entry points through `catalog`.
    pub fn new(
        host: Arc<dyn EngineHost>,
        config: EngineConfig,
        catalog: Arc<ModuleCatalog>,
    ) -> Result<Self> {
        let loader = Arc::new(ManifestModuleLoader::new(host.file_system(), catalog));
        Self::with_loader(host, config, loader)
    }

    /// Build an environment around a custom module loader.
    pub fn with_loader(
        host: Arc<dyn EngineHost>,
        config: EngineConfig,
        loader: Arc<dyn ModuleLoader>,
    ) -> Result<Self> {
        let resolver = Arc::new(VersionResolver::new(
            host.mount_points(),
            loader.clone(),
            host.diagnostics(),
            ResolverOptions {
                module_suffix: config.module_suffix.clone(),
                culture_policy: config.culture_policy,
            },
        ));

        let store = SettingsStore::new(config.components_file_path(), host.file_system())
            .with_retry(config.max_load_attempts, config.retry_delay());

        let registry = CapabilityRegistry::new(
            host.as_ref(),
            store,
            ComponentActivator::new(resolver.clone()),
        )?;

        let scanner = Scanner::new(host.mount_points(), loader, host.diagnostics())
            .with_discovery_suffix(config.discovery_suffix.clone());

        info!(
            settings = %config.components_file_path().display(),
            probing_locations = resolver.probing_locations().len(),
            "Engine environment ready"
        );

        Ok(Self {
            host,
            config,
            resolver,
            registry,
            scanner,
        })
    }

    /// Host services.
    pub fn host(&self) -> &Arc<dyn EngineHost> {
        &self.host
    }

    /// Configuration in effect.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The component registry.
    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// The module resolver.
    pub fn resolver(&self) -> &Arc<VersionResolver> {
        &self.resolver
    }

    /// The scanner.
    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    /// Scan every location, register what was found and persist the
    /// component index.
    ///
    /// Fails on the first location that cannot be scanned; nothing is
    /// registered in that case.
    pub fn scan_and_update(&self, locations: &[&str]) -> Result<Vec<ScanResult>> {
        let results = locations
            .iter()
            .map(|location| self.scanner.scan(location, &self.registry))
            .collect::<Result<Vec<_>>>()?;

        self.registry.update_user_components(&results)?;
        Ok(results)
    }
}
