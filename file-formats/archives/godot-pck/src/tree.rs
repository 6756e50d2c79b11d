//! Directory trees of loose files

use crate::path::relative_slash_path;
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Files below a root directory, keyed by `/`-separated relative path
///
/// Keys are ordered by their bytes, which fixes the traversal order used by
/// repacking and makes its output reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTree {
    root: PathBuf,
    files: BTreeMap<String, PathBuf>,
}

impl FileTree {
    /// Scan every regular file below `root`
    ///
    /// Symbolic links are not followed. A missing root is
    /// [`Error::MissingPath`].
    pub fn scan<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(Error::MissingPath(root.to_path_buf()));
        }

        let mut files = BTreeMap::new();
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = relative_slash_path(root, entry.path())?;
            files.insert(rel, entry.path().to_path_buf());
        }

        log::debug!("Scanned {}: {} files", root.display(), files.len());
        Ok(Self {
            root: root.to_path_buf(),
            files,
        })
    }

    /// Root directory of the tree
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a relative path
    pub fn get(&self, relative: &str) -> Option<&Path> {
        self.files.get(relative).map(PathBuf::as_path)
    }

    /// Whether the tree holds `relative`
    pub fn contains(&self, relative: &str) -> bool {
        self.files.contains_key(relative)
    }

    /// Iterate `(relative, absolute)` pairs in path order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_path()))
    }

    /// Relative paths in order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Number of files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the tree has no files
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
