//! In-memory mock filesystem for testing the `/proc` provider without Linux.

use crate::collector::traits::{FileSystem, FsStat};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

/// In-memory filesystem for testing.
///
/// Files can be replaced between sampling cycles to simulate counters
/// advancing, or removed to simulate a provider failure.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    /// Map from path to file contents.
    files: HashMap<PathBuf, String>,
    /// Parent directories of every added file.
    directories: HashSet<PathBuf>,
    /// `statvfs` results by mountpoint.
    fs_stats: HashMap<PathBuf, FsStat>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a file with the given content.
    ///
    /// Parent directories are automatically created.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();

        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }

        self.files.insert(path, content.into());
    }

    /// Removes a file. Directories are left in place.
    pub fn remove_file(&mut self, path: impl AsRef<Path>) -> Option<String> {
        self.files.remove(path.as_ref())
    }

    /// Adds or replaces the filesystem capacity reported for a mountpoint.
    pub fn add_fs_stat(&mut self, mountpoint: impl AsRef<Path>, stat: FsStat) {
        self.fs_stats.insert(mountpoint.as_ref().to_path_buf(), stat);
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.directories.contains(path)
    }

    fn statvfs(&self, path: &Path) -> io::Result<FsStat> {
        self.fs_stats.get(path).copied().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no filesystem mounted at {:?}", path),
            )
        })
    }
}
