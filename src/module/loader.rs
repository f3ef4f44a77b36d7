//! Loading module files.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::identity::ModuleIdentity;
use super::manifest::{ModuleCatalog, ModuleManifest};
use crate::component::{ComponentFactory, ComponentInstance};
use crate::error::{Result, ScaffolderError};
use crate::host::FileSystem;

/// Reads module files.
pub trait ModuleLoader: Send + Sync {
    /// Read only the identity of the module at `path`.
    fn identify(&self, path: &Path) -> Result<ModuleIdentity>;

    /// Load the module at `path`.
    fn load(&self, path: &Path) -> Result<Arc<LoadedModule>>;
}

/// A module that has been loaded and bound to its entry point.
pub struct LoadedModule {
    identity: ModuleIdentity,
    path: PathBuf,
    references: Vec<ModuleIdentity>,
    factories: Vec<ComponentFactory>,
}

impl LoadedModule {
    /// Assemble a loaded module.
    pub fn new(
        identity: ModuleIdentity,
        path: impl Into<PathBuf>,
        references: Vec<ModuleIdentity>,
        factories: Vec<ComponentFactory>,
    ) -> Self {
        Self {
            identity,
            path: path.into(),
            references,
            factories,
        }
    }

    /// Identity declared by the module.
    pub fn identity(&self) -> &ModuleIdentity {
        &self.identity
    }

    /// File the module was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Modules this module depends on.
    pub fn references(&self) -> &[ModuleIdentity] {
        &self.references
    }

    /// Component factories exported by the module.
    pub fn factories(&self) -> &[ComponentFactory] {
        &self.factories
    }

    /// Factory for the component type named `type_name`.
    pub fn factory(&self, type_name: &str) -> Option<&ComponentFactory> {
        self.factories.iter().find(|f| f.type_name == type_name)
    }

    /// Build one instance of every exported component type, with type
    /// references qualified by this module's full identity.
    pub fn instantiate_all(&self) -> Vec<ComponentInstance> {
        self.factories
            .iter()
            .map(|factory| self.instantiate(factory))
            .collect()
    }

    /// Build one instance from `factory`, qualified by this module's
    /// identity so a later activation resolves the same version.
    pub fn instantiate(&self, factory: &ComponentFactory) -> ComponentInstance {
        factory.create().in_module(self.identity.to_string())
    }
}

impl fmt::Debug for LoadedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModule")
            .field("identity", &self.identity.to_string())
            .field("path", &self.path)
            .field("factories", &self.factories.len())
            .finish()
    }
}

/// Loads JSON module manifests and binds their entry points through a
/// [`ModuleCatalog`].
pub struct ManifestModuleLoader {
    fs: Arc<dyn FileSystem>,
    catalog: Arc<ModuleCatalog>,
}

impl ManifestModuleLoader {
    /// Create a loader reading through `fs`.
    pub fn new(fs: Arc<dyn FileSystem>, catalog: Arc<ModuleCatalog>) -> Self {
        Self { fs, catalog }
    }

    fn read_manifest(&self, path: &Path) -> Result<ModuleManifest> {
        let content = self
            .fs
            .read_to_string(path)
            .map_err(|e| load_error(path, e))?;
        serde_json::from_str(&content).map_err(|e| load_error(path, e))
    }
}

impl ModuleLoader for ManifestModuleLoader {
    fn identify(&self, path: &Path) -> Result<ModuleIdentity> {
        self.read_manifest(path)?
            .identity()
            .map_err(|e| load_error(path, e))
    }

    fn load(&self, path: &Path) -> Result<Arc<LoadedModule>> {
        let manifest = self.read_manifest(path)?;
        let identity = manifest.identity().map_err(|e| load_error(path, e))?;
        let references = manifest
            .reference_identities()
            .map_err(|e| load_error(path, e))?;

        let entry_point = self.catalog.get(&manifest.entry_point).ok_or_else(|| {
            load_error(
                path,
                format!("entry point '{}' is not registered", manifest.entry_point),
            )
        })?;
        let factories = entry_point();

        debug!(
            module = %identity,
            path = %path.display(),
            factories = factories.len(),
            "Loaded module"
        );

        Ok(Arc::new(LoadedModule::new(
            identity, path, references, factories,
        )))
    }
}

fn load_error(path: &Path, error: impl fmt::Display) -> ScaffolderError {
    ScaffolderError::ModuleLoad {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}
