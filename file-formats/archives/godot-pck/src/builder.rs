//! Archive builder for creating PCK archives

use crate::cancel::{self, CancellationToken};
use crate::digest::{md5_bytes, md5_file};
use crate::header::HeaderTemplate;
use crate::index::{IndexEntry, data_base_offset, index_layout, serialize_header_index};
use crate::{Error, Result};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug)]
enum FileSource {
    Path(PathBuf),
    Data(Vec<u8>),
}

/// A source whose size and checksum are known
#[derive(Debug)]
struct PreparedFile<'a> {
    entry: IndexEntry,
    source: &'a FileSource,
}

/// Summary of a written archive
#[derive(Debug, Clone)]
pub struct BuildSummary {
    /// Entries in table order with their final offsets
    pub entries: Vec<IndexEntry>,
    /// Total bytes written, header included
    pub archive_size: u64,
}

/// Builder for creating new PCK archives
///
/// Entries are written in byte order of their virtual paths, whatever order
/// they were added in, so the same inputs always produce the same bytes.
/// Adding a path twice keeps the later source.
///
/// # Examples
///
/// ```no_run
/// use godot_pck::{ArchiveBuilder, HeaderTemplate};
///
/// # fn main() -> Result<(), godot_pck::Error> {
/// let template = HeaderTemplate::from_archive("game.pck")?;
/// ArchiveBuilder::new()
///     .template(template)
///     .add_file("assets/icon.png", "res://icon.png")
///     .add_file_data(b"[gd_scene]".to_vec(), "res://main.tscn")
///     .build("game_patched.pck")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ArchiveBuilder {
    template: HeaderTemplate,
    pending_files: BTreeMap<String, FileSource>,
    parallel: bool,
    cancel: Option<CancellationToken>,
}

impl ArchiveBuilder {
    /// Create a builder with a zeroed header template
    pub fn new() -> Self {
        Self {
            parallel: true,
            ..Self::default()
        }
    }

    /// Header version and reserved block to write
    pub fn template(mut self, template: HeaderTemplate) -> Self {
        self.template = template;
        self
    }

    /// Compute checksums on the rayon thread pool
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Abort between files once `token` is cancelled
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Add a file from disk
    pub fn add_file<P: AsRef<Path>, S: Into<String>>(mut self, path: P, virtual_path: S) -> Self {
        self.pending_files.insert(
            virtual_path.into(),
            FileSource::Path(path.as_ref().to_path_buf()),
        );
        self
    }

    /// Add a file from memory
    pub fn add_file_data<S: Into<String>>(mut self, data: Vec<u8>, virtual_path: S) -> Self {
        self.pending_files
            .insert(virtual_path.into(), FileSource::Data(data));
        self
    }

    /// Number of entries the archive will hold
    pub fn len(&self) -> usize {
        self.pending_files.len()
    }

    /// Whether no entries were added
    pub fn is_empty(&self) -> bool {
        self.pending_files.is_empty()
    }

    /// Build the archive and write it to `path`
    ///
    /// The archive is written to a temporary file next to `path` and renamed
    /// into place only after every byte was written, so a failure never
    /// replaces an existing archive with a partial one.
    pub fn build<P: AsRef<Path>>(self, path: P) -> Result<BuildSummary> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut temp_file = NamedTempFile::new_in(dir)?;
        let summary = {
            let mut writer = BufWriter::new(temp_file.as_file_mut());
            let summary = self.write_to(&mut writer)?;
            writer.flush()?;
            summary
        };
        temp_file.as_file().sync_all()?;

        // Atomically rename temp file to final destination
        temp_file.persist(path).map_err(|e| Error::Io(e.error))?;
        log::info!(
            "Wrote {} ({} entries, {} bytes)",
            path.display(),
            summary.entries.len(),
            summary.archive_size
        );
        Ok(summary)
    }

    /// Write the archive to any writer
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<BuildSummary> {
        let prepared = self.prepare()?;

        let mut entries: Vec<IndexEntry> = prepared.iter().map(|p| p.entry.clone()).collect();
        index_layout(&mut entries)?;

        serialize_header_index(writer, &self.template, &entries)?;

        let mut written = data_base_offset(entries.iter().map(|e| e.path.as_str()));
        for file in &prepared {
            cancel::check(self.cancel.as_ref())?;
            written += write_payload(writer, file)?;
        }

        Ok(BuildSummary {
            entries,
            archive_size: written,
        })
    }

    /// Size and checksum of every pending file, in table order
    fn prepare(&self) -> Result<Vec<PreparedFile<'_>>> {
        let cancel = self.cancel.as_ref();
        if self.parallel {
            self.pending_files
                .par_iter()
                .map(|(name, source)| prepare_file(name, source, cancel))
                .collect()
        } else {
            self.pending_files
                .iter()
                .map(|(name, source)| prepare_file(name, source, cancel))
                .collect()
        }
    }
}

fn prepare_file<'a>(
    name: &str,
    source: &'a FileSource,
    cancel: Option<&CancellationToken>,
) -> Result<PreparedFile<'a>> {
    cancel::check(cancel)?;
    let (size, checksum) = match source {
        FileSource::Data(data) => (data.len() as u64, md5_bytes(data)),
        FileSource::Path(path) => (fs::metadata(path)?.len(), md5_file(path)?),
    };
    let size =
        i64::try_from(size).map_err(|_| Error::format(format!("File too large: {name}")))?;
    Ok(PreparedFile {
        entry: IndexEntry::new(name, 0, size).with_checksum(checksum),
        source,
    })
}

/// Copy one payload, checking that the source still has the prepared size
fn write_payload<W: Write>(writer: &mut W, file: &PreparedFile<'_>) -> Result<u64> {
    let expected = file.entry.size as u64;
    let actual = match file.source {
        FileSource::Data(data) => {
            writer.write_all(data)?;
            data.len() as u64
        }
        FileSource::Path(path) => {
            let mut reader = File::open(path)?.take(expected);
            io::copy(&mut reader, writer)?
        }
    };

    if actual != expected {
        return Err(Error::ShortRead {
            path: file.entry.path.clone(),
            expected,
            actual,
        });
    }
    log::debug!("Packed {} ({} bytes)", file.entry.path, expected);
    Ok(actual)
}
