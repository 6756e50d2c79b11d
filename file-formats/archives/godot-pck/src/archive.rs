//! Reading PCK archives

use crate::header::ArchiveHeader;
use crate::index::{ArchiveIndex, IndexEntry, parse_header_index};
use crate::io::read_entry;
use crate::path::to_virtual_path;
use crate::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Summary information about an archive
#[derive(Debug, Clone)]
pub struct ArchiveInfo {
    /// Path of the archive, if opened from a file
    pub path: Option<PathBuf>,
    /// Header of the archive
    pub header: ArchiveHeader,
    /// Number of unique entries in the index
    pub entry_count: usize,
    /// Sum of all payload sizes
    pub data_size: u64,
    /// Total size of the backing storage
    pub archive_size: u64,
}

/// A parsed PCK archive over any seekable backing storage
///
/// The header and index are read once when the archive is opened; payloads
/// are read on demand.
///
/// # Examples
///
/// ```no_run
/// use godot_pck::Archive;
///
/// # fn main() -> Result<(), godot_pck::Error> {
/// let mut archive = Archive::open("game.pck")?;
/// for entry in archive.list() {
///     println!("{} ({} bytes)", entry.path, entry.size);
/// }
/// let data = archive.read_file("res://project.binary")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Archive<R = BufReader<File>> {
    reader: R,
    path: Option<PathBuf>,
    header: ArchiveHeader,
    index: ArchiveIndex,
    archive_size: u64,
}

impl Archive<BufReader<File>> {
    /// Open an archive file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut archive = Self::from_reader(BufReader::new(file))?;
        archive.path = Some(path.to_path_buf());
        log::info!(
            "Opened {}: {} entries",
            path.display(),
            archive.index.len()
        );
        Ok(archive)
    }
}

impl<R: Read + Seek> Archive<R> {
    /// Parse an archive from any reader positioned anywhere
    pub fn from_reader(mut reader: R) -> Result<Self> {
        let archive_size = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;
        let (header, index) = parse_header_index(&mut reader)?;

        Ok(Self {
            reader,
            path: None,
            header,
            index,
            archive_size,
        })
    }

    /// Archive header
    pub fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    /// Parsed index
    pub fn index(&self) -> &ArchiveIndex {
        &self.index
    }

    /// Path the archive was opened from
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Size of the backing storage in bytes
    pub fn archive_size(&self) -> u64 {
        self.archive_size
    }

    /// Entries in table order
    pub fn list(&self) -> &[IndexEntry] {
        self.index.entries()
    }

    /// Summary of the archive
    pub fn info(&self) -> ArchiveInfo {
        ArchiveInfo {
            path: self.path.clone(),
            header: self.header.clone(),
            entry_count: self.index.len(),
            data_size: self.index.data_size(),
            archive_size: self.archive_size,
        }
    }

    /// Read the payload of an entry
    ///
    /// Accepts the full virtual path or the path without `res://`.
    pub fn read_file(&mut self, name: &str) -> Result<Vec<u8>> {
        let entry = self
            .index
            .get(name)
            .or_else(|| self.index.get(&to_virtual_path(name)))
            .ok_or_else(|| Error::FileNotFound(name.to_string()))?;
        read_entry(&mut self.reader, entry)
    }

    /// Read the payload of an index entry
    pub fn read_entry(&mut self, entry: &IndexEntry) -> Result<Vec<u8>> {
        read_entry(&mut self.reader, entry)
    }

    /// Give back the underlying reader
    pub fn into_inner(self) -> R {
        self.reader
    }
}
