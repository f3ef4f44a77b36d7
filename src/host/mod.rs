//! Host environment.
//!
//! The host supplies what the engine needs from the outside world: file
//! access, a diagnostics sink, a way to mount content sources and the
//! components that are built in rather than discovered.

pub mod diagnostics;
pub mod fs;

pub use diagnostics::{Diagnostics, RecordingDiagnostics, TracingDiagnostics};
pub use fs::{has_suffix, FileSystem, PhysicalFileSystem};

use std::sync::Arc;

use crate::component::{builtin_components, CapabilityId, ComponentInstance};
use crate::mount::{DirectoryMountProvider, MountPointProvider};

/// Services the engine takes from its host.
pub trait EngineHost: Send + Sync {
    /// Components registered before anything is loaded from disk.
    fn builtin_components(&self) -> Vec<(CapabilityId, ComponentInstance)>;

    /// File system used for settings and module files.
    fn file_system(&self) -> Arc<dyn FileSystem>;

    /// Sink for non-fatal failures.
    fn diagnostics(&self) -> Arc<dyn Diagnostics>;

    /// Mounts content sources.
    fn mount_points(&self) -> Arc<dyn MountPointProvider>;
}

/// Host backed by the local disk, reporting diagnostics through `tracing`.
#[derive(Clone)]
pub struct DefaultHost {
    fs: Arc<dyn FileSystem>,
    diagnostics: Arc<dyn Diagnostics>,
    mounts: Arc<dyn MountPointProvider>,
    builtins: Vec<(CapabilityId, ComponentInstance)>,
}

impl DefaultHost {
    /// Host with the shipped built-in components.
    pub fn new() -> Self {
        let fs: Arc<dyn FileSystem> = Arc::new(PhysicalFileSystem);
        Self {
            mounts: Arc::new(DirectoryMountProvider::new(fs.clone())),
            fs,
            diagnostics: Arc::new(TracingDiagnostics),
            builtins: builtin_components(),
        }
    }

    /// Replace the diagnostics sink.
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Replace the file system. Directory mounts read through it too.
    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.mounts = Arc::new(DirectoryMountProvider::new(fs.clone()));
        self.fs = fs;
        self
    }

    /// Replace the mount point provider.
    pub fn with_mount_points(mut self, mounts: Arc<dyn MountPointProvider>) -> Self {
        self.mounts = mounts;
        self
    }

    /// Add a built-in component under every capability it implements.
    pub fn with_builtin(mut self, instance: ComponentInstance) -> Self {
        self.builtins.extend(instance.registrations());
        self
    }

    /// Drop the shipped built-in components.
    pub fn without_builtins(mut self) -> Self {
        self.builtins.clear();
        self
    }
}

impl Default for DefaultHost {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineHost for DefaultHost {
    fn builtin_components(&self) -> Vec<(CapabilityId, ComponentInstance)> {
        self.builtins.clone()
    }

    fn file_system(&self) -> Arc<dyn FileSystem> {
        self.fs.clone()
    }

    fn diagnostics(&self) -> Arc<dyn Diagnostics> {
        self.diagnostics.clone()
    }

    fn mount_points(&self) -> Arc<dyn MountPointProvider> {
        self.mounts.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ConfigFileGenerator, FolderInstallerFactory};

    #[test]
    fn default_host_ships_builtins() {
        let ids: Vec<_> = DefaultHost::new()
            .builtin_components()
            .iter()
            .map(|(_, instance)| instance.id())
            .collect();

        assert!(ids.contains(&ConfigFileGenerator::ID));
        assert!(ids.contains(&FolderInstallerFactory::ID));
    }

    #[test]
    fn builtins_can_be_replaced() {
        let host = DefaultHost::new()
            .without_builtins()
            .with_builtin(FolderInstallerFactory::instance());

        let builtins = host.builtin_components();
        assert_eq!(builtins.len(), 1);
        assert_eq!(builtins[0].1.id(), FolderInstallerFactory::ID);
    }

    #[test]
    fn diagnostics_can_be_replaced() {
        let recorder = Arc::new(RecordingDiagnostics::new());
        let host = DefaultHost::new().with_diagnostics(recorder.clone());

        host.diagnostics().diagnostic("hello");
        assert_eq!(recorder.messages(), vec!["hello"]);
    }
}
