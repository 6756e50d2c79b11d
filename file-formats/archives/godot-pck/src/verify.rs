//! Archive verification
//!
//! Reading an archive never validates the stored checksums. This module is
//! the explicit, opt-in check: it confirms that every entry lies inside the
//! archive, that no two payloads overlap, and optionally that each payload's
//! MD5 matches the checksum recorded in the index.

use crate::archive::Archive;
use crate::digest::md5_bytes;
use crate::header::HEADER_SIZE;
use crate::Result;
use std::io::{Read, Seek};
use std::path::Path;

/// Options for verification
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    /// Compare payload MD5 against the stored checksum
    pub check_checksums: bool,
}

/// A problem found while verifying
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyIssue {
    /// Offset or size is negative, or the payload ends past the archive
    OutOfBounds {
        /// Virtual path of the entry
        path: String,
    },
    /// Payload starts inside the header or index table
    InsideIndex {
        /// Virtual path of the entry
        path: String,
    },
    /// Payload ranges of two entries overlap
    Overlap {
        /// Entry that starts first
        first: String,
        /// Entry that starts inside the first one
        second: String,
    },
    /// Stored checksum differs from the payload's MD5
    ChecksumMismatch {
        /// Virtual path of the entry
        path: String,
        /// Checksum in the index
        stored: [u8; 16],
        /// MD5 of the payload
        actual: [u8; 16],
    },
}

/// Outcome of a verification run
#[derive(Debug, Clone, Default)]
pub struct VerifyReport {
    /// Number of entries inspected
    pub checked: usize,
    /// Entries whose checksum field is all zeroes and was skipped
    pub unchecked: usize,
    /// Problems found
    pub issues: Vec<VerifyIssue>,
}

impl VerifyReport {
    /// Whether no problems were found
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Verify the archive at `path`
pub fn verify_archive<P: AsRef<Path>>(path: P, options: &VerifyOptions) -> Result<VerifyReport> {
    let mut archive = Archive::open(path)?;
    verify(&mut archive, options)
}

/// Verify an opened archive
pub fn verify<R: Read + Seek>(archive: &mut Archive<R>, options: &VerifyOptions) -> Result<VerifyReport> {
    let archive_size = archive.archive_size();
    let index_end = crate::index::data_base_offset(archive.list().iter().map(|e| e.path.as_str()));
    let mut report = VerifyReport::default();
    let mut ranges = Vec::new();

    let entries = archive.list().to_vec();
    for entry in &entries {
        report.checked += 1;

        let Some(end) = entry.end().filter(|&end| end <= archive_size) else {
            report.issues.push(VerifyIssue::OutOfBounds {
                path: entry.path.clone(),
            });
            continue;
        };
        let start = entry.offset as u64;
        if start < index_end.max(HEADER_SIZE) && entry.size > 0 {
            report.issues.push(VerifyIssue::InsideIndex {
                path: entry.path.clone(),
            });
        }
        ranges.push((start, end, entry.path.clone()));

        if options.check_checksums {
            if entry.checksum == [0u8; 16] {
                report.unchecked += 1;
                continue;
            }
            let actual = md5_bytes(&archive.read_entry(entry)?);
            if actual != entry.checksum {
                log::warn!("Checksum mismatch for {}", entry.path);
                report.issues.push(VerifyIssue::ChecksumMismatch {
                    path: entry.path.clone(),
                    stored: entry.checksum,
                    actual,
                });
            }
        }
    }

    ranges.sort();
    for pair in ranges.windows(2) {
        let (_, first_end, first) = &pair[0];
        let (second_start, second_end, second) = &pair[1];
        if second_start < first_end && second_start < second_end {
            report.issues.push(VerifyIssue::Overlap {
                first: first.clone(),
                second: second.clone(),
            });
        }
    }

    log::info!(
        "Verified {} entries, {} issues",
        report.checked,
        report.issues.len()
    );
    Ok(report)
}
