//! File system primitives supplied by the host.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// File system operations used by the settings store, the mount points
/// and the module loader.
pub trait FileSystem: Send + Sync {
    /// Read a whole file as UTF-8.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Replace the contents of a file, creating parent directories.
    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;

    /// Check whether a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Delete a file.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// List files under `dir` (recursively) whose file name ends with
    /// `suffix`, compared case-insensitively. Results are sorted by path.
    /// Each directory is walked once even when symlinks lead back into it;
    /// unreadable subdirectories are skipped.
    fn enumerate_files(&self, dir: &Path, suffix: &str) -> io::Result<Vec<PathBuf>>;
}

/// [`FileSystem`] backed by the real disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhysicalFileSystem;

impl PhysicalFileSystem {
    fn collect(
        dir: &Path,
        suffix: &str,
        visited: &mut HashSet<PathBuf>,
        files: &mut Vec<PathBuf>,
    ) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };

            if path.is_dir() {
                let Ok(real) = path.canonicalize() else {
                    warn!(dir = %path.display(), "Skipping unresolvable directory");
                    continue;
                };
                // Symlinks may lead back to a directory already walked.
                if !visited.insert(real) {
                    debug!(dir = %path.display(), "Skipping directory already visited");
                    continue;
                }
                if let Err(e) = Self::collect(&path, suffix, visited, files) {
                    warn!(dir = %path.display(), error = %e, "Skipping unreadable directory");
                }
            } else if has_suffix(&path, suffix) {
                files.push(path);
            }
        }
        Ok(())
    }
}

impl FileSystem for PhysicalFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    /// Uses the write-to-temp-then-rename pattern so readers never observe
    /// a partially written file.
    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
        temp_name.push(".tmp");
        let temp_path = path.with_file_name(temp_name);
        fs::write(&temp_path, contents)?;
        fs::rename(&temp_path, path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn enumerate_files(&self, dir: &Path, suffix: &str) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        if dir.is_dir() {
            let mut visited = HashSet::new();
            visited.insert(dir.canonicalize()?);
            Self::collect(dir, suffix, &mut visited, &mut files)?;
        }
        files.sort();
        Ok(files)
    }
}

/// Case-insensitive file name suffix check.
pub fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .map(|name| {
            name.to_string_lossy()
                .to_ascii_lowercase()
                .ends_with(&suffix.to_ascii_lowercase())
        })
        .unwrap_or(false)
}
