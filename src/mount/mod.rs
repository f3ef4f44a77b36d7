//! Content sources exposed as mount points.
//!
//! A mount point gives scanners and generators access to the files of a
//! content source. It is a scoped resource: dropping the boxed mount point
//! releases it. Only directory-backed sources ship with the crate; hosts
//! plug archive support in through [`MountPointProvider`].

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::host::FileSystem;

/// A mounted content source.
pub trait MountPoint: Send + Sync {
    /// Stable identifier of the source. Persisted as a probing location.
    fn uri(&self) -> &str;

    /// Root directory of the mounted content.
    fn root(&self) -> &Path;

    /// Files under the root whose name ends with `suffix` (case-insensitive),
    /// recursively, in path order.
    fn enumerate_files(&self, suffix: &str) -> io::Result<Vec<PathBuf>>;

    /// Read a file belonging to this mount.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Turns a location string into a mount point.
pub trait MountPointProvider: Send + Sync {
    /// Mount `location`, or `None` when it is unsupported or missing.
    fn try_mount(&self, location: &str) -> Option<Box<dyn MountPoint>>;
}

/// Mount point over a plain directory.
pub struct DirectoryMountPoint {
    uri: String,
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl DirectoryMountPoint {
    /// Mount an existing directory.
    pub fn new(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        let root = root.into();
        Self {
            uri: root.to_string_lossy().to_string(),
            root,
            fs,
        }
    }
}

impl MountPoint for DirectoryMountPoint {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn enumerate_files(&self, suffix: &str) -> io::Result<Vec<PathBuf>> {
        self.fs.enumerate_files(&self.root, suffix)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.fs.read_to_string(path)
    }
}

impl Drop for DirectoryMountPoint {
    fn drop(&mut self) {
        debug!(uri = %self.uri, "Released mount point");
    }
}

/// Mounts local directories.
#[derive(Clone)]
pub struct DirectoryMountProvider {
    fs: Arc<dyn FileSystem>,
}

impl DirectoryMountProvider {
    /// Create a provider that reads through the given file system.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

impl MountPointProvider for DirectoryMountProvider {
    fn try_mount(&self, location: &str) -> Option<Box<dyn MountPoint>> {
        let path = Path::new(location);
        if !path.is_dir() {
            return None;
        }

        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        debug!(uri = %root.display(), "Mounted directory");
        Some(Box::new(DirectoryMountPoint::new(root, self.fs.clone())))
    }
}
