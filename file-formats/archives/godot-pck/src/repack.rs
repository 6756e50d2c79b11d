//! Repacking a directory tree into a PCK archive
//!
//! The tree is walked in byte order of its relative paths, `res://` is put
//! back in front of every path, and the [`ArchiveBuilder`] lays out offsets
//! and writes the archive through a temporary file.

use crate::builder::{ArchiveBuilder, BuildSummary};
use crate::cancel::CancellationToken;
use crate::header::HeaderTemplate;
use crate::path::to_virtual_path;
use crate::tree::FileTree;
use crate::Result;
use std::path::Path;

/// Options for repacking
#[derive(Debug, Clone)]
pub struct RepackOptions {
    /// Compute checksums on the rayon thread pool
    pub parallel: bool,
    /// Checked before each file is hashed or written
    pub cancel: Option<CancellationToken>,
}

impl Default for RepackOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            cancel: None,
        }
    }
}

/// Result of a repack
#[derive(Debug, Clone)]
pub struct RepackSummary {
    /// Number of entries written
    pub file_count: usize,
    /// Sum of payload sizes
    pub data_size: u64,
    /// Size of the written archive
    pub archive_size: u64,
    /// Header metadata that was written
    pub template: HeaderTemplate,
}

/// Pack every file below `tree_root` into a new archive at `output`
///
/// With a `template` its version and reserved block are written verbatim;
/// without one both are zero. The destination is replaced only after the
/// whole archive was written.
pub fn repack<P: AsRef<Path>, Q: AsRef<Path>>(
    tree_root: P,
    output: Q,
    template: Option<&HeaderTemplate>,
    options: &RepackOptions,
) -> Result<RepackSummary> {
    let tree = FileTree::scan(tree_root)?;
    repack_tree(&tree, output, template, options)
}

/// Pack an already scanned tree
pub fn repack_tree<Q: AsRef<Path>>(
    tree: &FileTree,
    output: Q,
    template: Option<&HeaderTemplate>,
    options: &RepackOptions,
) -> Result<RepackSummary> {
    let output = output.as_ref();
    let template = template.cloned().unwrap_or_default();

    log::info!(
        "Repacking {} files from {} -> {}",
        tree.len(),
        tree.root().display(),
        output.display()
    );

    let mut builder = ArchiveBuilder::new()
        .template(template.clone())
        .parallel(options.parallel);
    if let Some(token) = &options.cancel {
        builder = builder.cancel_token(token.clone());
    }
    for (relative, source) in tree.iter() {
        builder = builder.add_file(source, to_virtual_path(relative));
    }

    let BuildSummary {
        entries,
        archive_size,
    } = builder.build(output)?;

    Ok(RepackSummary {
        file_count: entries.len(),
        data_size: entries.iter().map(|e| e.size as u64).sum(),
        archive_size,
        template,
    })
}
