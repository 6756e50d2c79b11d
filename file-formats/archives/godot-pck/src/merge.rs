//! Overlaying override files onto an extracted tree

use crate::path::destination_for;
use crate::tree::FileTree;
use crate::Result;
use std::fs;
use std::path::Path;

/// Result of a merge
#[derive(Debug, Clone, Default)]
pub struct MergeSummary {
    /// Relative paths that replaced an existing file
    pub replaced: Vec<String>,
    /// Relative paths that did not exist before
    pub added: Vec<String>,
}

impl MergeSummary {
    /// Total number of files copied
    pub fn total(&self) -> usize {
        self.replaced.len() + self.added.len()
    }
}

/// Copy every file of `overrides` onto `extracted`
///
/// Copies are unconditional: identical content is copied again and the
/// override always wins. The override root must exist; the extracted root is
/// created when missing.
pub fn merge_overrides<P: AsRef<Path>, Q: AsRef<Path>>(
    extracted: P,
    overrides: Q,
) -> Result<MergeSummary> {
    let extracted = extracted.as_ref();
    let overrides = FileTree::scan(overrides)?;

    log::info!(
        "Merging {} files from {} into {}",
        overrides.len(),
        overrides.root().display(),
        extracted.display()
    );

    fs::create_dir_all(extracted)?;
    let mut summary = MergeSummary::default();
    for (relative, source) in overrides.iter() {
        let dest = destination_for(extracted, relative)?;
        let existed = dest.is_file();
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(source, &dest)?;
        log::debug!("Patched: {relative}");

        if existed {
            summary.replaced.push(relative.to_string());
        } else {
            summary.added.push(relative.to_string());
        }
    }

    Ok(summary)
}
