//! Virtual directory providers.
//!
//! Discovery never touches the filesystem directly. It asks a
//! [`FileProvider`] for the contents of a path relative to the plugin root,
//! so hosts can serve plugins from disk, from memory, or from anything else
//! that can name a loadable file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Entry name without any directory component.
    pub name: String,

    /// Whether the entry is a directory.
    pub is_directory: bool,

    /// Absolute path a loader can open (files only).
    pub physical_path: Option<PathBuf>,
}

impl FileEntry {
    pub fn file(name: impl Into<String>, physical_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            is_directory: false,
            physical_path: Some(physical_path.into()),
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: true,
            physical_path: None,
        }
    }
}

/// Listing of one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryContents {
    exists: bool,
    entries: Vec<FileEntry>,
}

impl DirectoryContents {
    /// A directory that exists with the given entries.
    pub fn new(entries: Vec<FileEntry>) -> Self {
        Self {
            exists: true,
            entries,
        }
    }

    /// A directory that does not exist.
    pub fn missing() -> Self {
        Self::default()
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    /// Entries in provider order.
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a DirectoryContents {
    type Item = &'a FileEntry;
    type IntoIter = std::slice::Iter<'a, FileEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Source of directory listings relative to a plugin root.
pub trait FileProvider: Send + Sync {
    /// List `subpath` (`""` is the root).
    fn directory_contents(&self, subpath: &str) -> DirectoryContents;
}

/// Provider backed by a directory on disk. Entries are sorted by name.
#[derive(Debug, Clone)]
pub struct PhysicalFileProvider {
    root: PathBuf,
}

impl PhysicalFileProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileProvider for PhysicalFileProvider {
    fn directory_contents(&self, subpath: &str) -> DirectoryContents {
        let dir = if subpath.is_empty() {
            self.root.clone()
        } else {
            self.root.join(subpath)
        };

        if !dir.is_dir() {
            return DirectoryContents::missing();
        }

        let read = match std::fs::read_dir(&dir) {
            Ok(read) => read,
            Err(e) => {
                warn!("Failed to read plugin directory {:?}: {}", dir, e);
                return DirectoryContents::missing();
            }
        };

        let mut entries: Vec<FileEntry> = read
            .flatten()
            .map(|entry| {
                let path = entry.path();
                let name = entry.file_name().to_string_lossy().into_owned();
                if path.is_dir() {
                    FileEntry::directory(name)
                } else {
                    FileEntry::file(name, path)
                }
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        DirectoryContents::new(entries)
    }
}

/// In-memory provider, keyed by relative directory path.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileProvider {
    directories: HashMap<String, Vec<FileEntry>>,
}

impl MemoryFileProvider {
    /// An empty provider; the root exists but has no entries.
    pub fn new() -> Self {
        let mut directories = HashMap::new();
        directories.insert(String::new(), Vec::new());
        Self { directories }
    }

    /// Add a file to `dir`.
    pub fn with_file(
        mut self,
        dir: &str,
        name: impl Into<String>,
        physical_path: impl Into<PathBuf>,
    ) -> Self {
        self.directory_mut(dir)
            .push(FileEntry::file(name, physical_path));
        self
    }

    /// Add a subdirectory `name` to `dir`; it is also listable itself.
    pub fn with_directory(mut self, dir: &str, name: &str) -> Self {
        self.directory_mut(dir).push(FileEntry::directory(name));
        let child = if dir.is_empty() {
            name.to_string()
        } else {
            format!("{dir}/{name}")
        };
        self.directory_mut(&child);
        self
    }

    fn directory_mut(&mut self, dir: &str) -> &mut Vec<FileEntry> {
        self.directories.entry(dir.to_string()).or_default()
    }
}

impl FileProvider for MemoryFileProvider {
    fn directory_contents(&self, subpath: &str) -> DirectoryContents {
        match self.directories.get(subpath) {
            Some(entries) => DirectoryContents::new(entries.clone()),
            None => DirectoryContents::missing(),
        }
    }
}
