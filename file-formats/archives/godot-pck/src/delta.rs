//! Delta computation between two file trees
//!
//! A delta holds every file of the revised tree that is new, or whose
//! SHA-256 differs from the base tree's file at the same path. Files that only
//! exist in the base tree are not represented: a delta can add and replace
//! files but never remove them.

use crate::cancel::{self, CancellationToken};
use crate::digest::hash_file;
use crate::tree::FileTree;
use crate::Result;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Options for delta computation
#[derive(Debug, Clone)]
pub struct DeltaOptions {
    /// Hash files on the rayon thread pool
    pub parallel: bool,
    /// Checked before each file is hashed
    pub cancel: Option<CancellationToken>,
}

impl Default for DeltaOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            cancel: None,
        }
    }
}

/// Why a path is part of a delta
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaKind {
    /// Not present in the base tree
    Added,
    /// Present in both trees with different content
    Modified,
}

/// One file of a delta
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaEntry {
    /// Location of the revised file
    pub source: PathBuf,
    /// Why the file is included
    pub kind: DeltaKind,
}

/// Files that are new or changed in a revised tree, keyed by relative path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeltaSet {
    entries: BTreeMap<String, DeltaEntry>,
}

impl DeltaSet {
    /// Entry for a relative path
    pub fn get(&self, relative: &str) -> Option<&DeltaEntry> {
        self.entries.get(relative)
    }

    /// Iterate entries in path order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DeltaEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Relative paths in order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the trees had no differences
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries of the given kind
    pub fn count(&self, kind: DeltaKind) -> usize {
        self.entries.values().filter(|e| e.kind == kind).count()
    }

    /// Copy every delta file below `destination`
    ///
    /// Existing files at the same relative paths are overwritten; other
    /// content of `destination` is left alone.
    pub fn materialize<P: AsRef<Path>>(&self, destination: P) -> Result<()> {
        let destination = destination.as_ref();
        fs::create_dir_all(destination)?;
        for (relative, entry) in &self.entries {
            let dest = crate::path::destination_for(destination, relative)?;
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&entry.source, &dest)?;
            log::debug!("Delta {:?}: {}", entry.kind, relative);
        }
        Ok(())
    }
}

/// Compare two trees
///
/// Paths missing from `base` are additions. Paths present in both are
/// compared by SHA-256 only; sizes and timestamps play no part.
pub fn compute_delta(base: &FileTree, revised: &FileTree, options: &DeltaOptions) -> Result<DeltaSet> {
    log::info!(
        "Comparing {} against {}",
        revised.root().display(),
        base.root().display()
    );

    let cancel = options.cancel.as_ref();
    let classify = |(relative, source): (&str, &Path)| -> Result<Option<(String, DeltaEntry)>> {
        cancel::check(cancel)?;
        let kind = match base.get(relative) {
            None => Some(DeltaKind::Added),
            Some(base_file) => {
                if hash_file(base_file)? != hash_file(source)? {
                    Some(DeltaKind::Modified)
                } else {
                    None
                }
            }
        };
        Ok(kind.map(|kind| {
            (
                relative.to_string(),
                DeltaEntry {
                    source: source.to_path_buf(),
                    kind,
                },
            )
        }))
    };

    let files: Vec<(&str, &Path)> = revised.iter().collect();
    let results: Vec<Option<(String, DeltaEntry)>> = if options.parallel {
        files.into_par_iter().map(classify).collect::<Result<_>>()?
    } else {
        files.into_iter().map(classify).collect::<Result<_>>()?
    };

    let delta = DeltaSet {
        entries: results.into_iter().flatten().collect(),
    };
    log::info!(
        "Delta: {} added, {} modified",
        delta.count(DeltaKind::Added),
        delta.count(DeltaKind::Modified)
    );
    Ok(delta)
}
