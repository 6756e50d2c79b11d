//! Extracting archives to a directory
//!
//! Every entry is written below the destination root with the `res://`
//! prefix removed. Entries are independent: each one reads a disjoint byte
//! range of the archive and writes a disjoint file, so extraction runs in
//! parallel with one read-only file handle per worker. Directory creation uses
//! `create_dir_all`, which succeeds when another worker created the directory
//! first.

use crate::archive::Archive;
use crate::cancel::{self, CancellationToken};
use crate::index::IndexEntry;
use crate::io::read_entry;
use crate::path::destination_for;
use crate::{Error, Result};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

/// Options for extraction
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Extract entries on the rayon thread pool
    pub parallel: bool,
    /// Checked before each entry is read
    pub cancel: Option<CancellationToken>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            cancel: None,
        }
    }
}

/// Result of an extraction
#[derive(Debug, Clone, Default)]
pub struct ExtractSummary {
    /// Number of entries written
    pub extracted: usize,
    /// Total payload bytes written
    pub bytes: u64,
}

/// Extract every entry of the archive at `archive_path` into `destination`
pub fn extract_all<P: AsRef<Path>, Q: AsRef<Path>>(
    archive_path: P,
    destination: Q,
    options: &ExtractOptions,
) -> Result<ExtractSummary> {
    let archive_path = archive_path.as_ref();
    let destination = destination.as_ref();

    log::info!(
        "Extracting {} -> {}",
        archive_path.display(),
        destination.display()
    );

    let archive = Archive::open(archive_path)?;
    let plan = plan_extraction(&archive, destination)?;
    fs::create_dir_all(destination)?;

    let summary = if options.parallel {
        extract_parallel(archive_path, &plan, options.cancel.as_ref())?
    } else {
        let mut reader = archive.into_inner();
        extract_sequential(&mut reader, &plan, options.cancel.as_ref())?
    };

    log::info!(
        "Extracted {} entries ({} bytes)",
        summary.extracted,
        summary.bytes
    );
    Ok(summary)
}

/// Extract every entry of an already opened archive, one entry at a time
///
/// Works with any backing storage, including in-memory archives.
pub fn extract_archive<R: Read + Seek>(
    archive: Archive<R>,
    destination: &Path,
    options: &ExtractOptions,
) -> Result<ExtractSummary> {
    let plan = plan_extraction(&archive, destination)?;
    fs::create_dir_all(destination)?;
    let mut reader = archive.into_inner();
    extract_sequential(&mut reader, &plan, options.cancel.as_ref())
}

/// Resolve and check every destination before anything is written
fn plan_extraction<R: Read + Seek>(
    archive: &Archive<R>,
    destination: &Path,
) -> Result<Vec<(IndexEntry, PathBuf)>> {
    let archive_size = archive.archive_size();
    let plan = archive
        .list()
        .iter()
        .map(|entry| {
            let (offset, size) = entry.range()?;
            let end = offset.checked_add(size).unwrap_or(u64::MAX);
            if end > archive_size {
                return Err(Error::ShortRead {
                    path: entry.path.clone(),
                    expected: size,
                    actual: archive_size.saturating_sub(offset),
                });
            }
            let dest = destination_for(destination, &entry.path)?;
            Ok((entry.clone(), dest))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(dedup_destinations(plan))
}

/// Keep only the last entry for each destination file
///
/// Distinct virtual paths such as `res://a//b` and `a/b` resolve to the same
/// file; the later record wins, as it does in the index.
fn dedup_destinations(plan: Vec<(IndexEntry, PathBuf)>) -> Vec<(IndexEntry, PathBuf)> {
    let mut last: HashMap<&Path, usize> = HashMap::with_capacity(plan.len());
    for (i, (_, dest)) in plan.iter().enumerate() {
        last.insert(dest.as_path(), i);
    }
    if last.len() == plan.len() {
        return plan;
    }

    let keep: HashSet<usize> = last.into_values().collect();
    plan.into_iter()
        .enumerate()
        .filter_map(|(i, item)| {
            if keep.contains(&i) {
                Some(item)
            } else {
                log::warn!(
                    "Skipping {}: a later entry extracts to the same file",
                    item.0.path
                );
                None
            }
        })
        .collect()
}

fn extract_sequential<R: Read + Seek>(
    reader: &mut R,
    plan: &[(IndexEntry, PathBuf)],
    cancel: Option<&CancellationToken>,
) -> Result<ExtractSummary> {
    let mut summary = ExtractSummary::default();
    for (entry, dest) in plan {
        cancel::check(cancel)?;
        summary.bytes += write_entry(reader, entry, dest)?;
        summary.extracted += 1;
    }
    Ok(summary)
}

fn extract_parallel(
    archive_path: &Path,
    plan: &[(IndexEntry, PathBuf)],
    cancel: Option<&CancellationToken>,
) -> Result<ExtractSummary> {
    let bytes = plan
        .par_iter()
        .map_init(
            || File::open(archive_path).map(BufReader::new),
            |reader, (entry, dest)| {
                cancel::check(cancel)?;
                let reader = reader.as_mut().map_err(|e| {
                    Error::Io(std::io::Error::new(e.kind(), e.to_string()))
                })?;
                write_entry(reader, entry, dest)
            },
        )
        .collect::<Result<Vec<u64>>>()?;

    Ok(ExtractSummary {
        extracted: bytes.len(),
        bytes: bytes.iter().sum(),
    })
}

fn write_entry<R: Read + Seek>(reader: &mut R, entry: &IndexEntry, dest: &Path) -> Result<u64> {
    let data = read_entry(reader, entry)?;
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(dest, &data)?;
    log::debug!("Extracted: {} -> {}", entry.path, dest.display());
    Ok(data.len() as u64)
}
