//! PCK index table
//!
//! The index follows the header directly and holds one record per entry:
//!
//! ```text
//! i32  path_length
//! [u8] path (UTF-8, may be NUL-padded up to path_length)
//! i64  offset (absolute position of the payload)
//! i64  size
//! [u8; 16] checksum (MD5 of the payload when written by this crate)
//! ```
//!
//! Payloads follow the index contiguously, in table order.

use crate::header::{ArchiveHeader, HEADER_SIZE, HeaderTemplate};
use crate::io::FieldReader;
use crate::{Error, Result};
use byteorder::{LittleEndian, WriteBytesExt};
use std::collections::HashMap;
use std::io::{Read, Write};

/// Size of the checksum field of an index record
pub const CHECKSUM_SIZE: usize = 16;

/// Fixed part of an index record: path length, offset, size, checksum
pub const RECORD_FIXED_SIZE: u64 = 4 + 8 + 8 + CHECKSUM_SIZE as u64;

/// One record of the index table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Virtual path, NUL padding removed
    pub path: String,
    /// Absolute payload offset within the archive
    pub offset: i64,
    /// Payload size in bytes
    pub size: i64,
    /// Stored checksum, not verified on read
    pub checksum: [u8; CHECKSUM_SIZE],
}

impl IndexEntry {
    /// Create an entry with a zeroed checksum
    pub fn new<S: Into<String>>(path: S, offset: i64, size: i64) -> Self {
        Self {
            path: path.into(),
            offset,
            size,
            checksum: [0u8; CHECKSUM_SIZE],
        }
    }

    /// Attach a checksum
    pub fn with_checksum(mut self, checksum: [u8; CHECKSUM_SIZE]) -> Self {
        self.checksum = checksum;
        self
    }

    /// Size of this entry's record in the index table
    pub fn record_size(&self) -> u64 {
        RECORD_FIXED_SIZE + self.path.len() as u64
    }

    /// Offset and size as unsigned values
    ///
    /// Negative values cannot address anything in a file and are rejected.
    pub fn range(&self) -> Result<(u64, u64)> {
        let offset = u64::try_from(self.offset)
            .map_err(|_| Error::format(format!("Negative offset for {}", self.path)))?;
        let size = u64::try_from(self.size)
            .map_err(|_| Error::format(format!("Negative size for {}", self.path)))?;
        Ok((offset, size))
    }

    /// End of the payload, `None` on negative values or overflow
    pub fn end(&self) -> Option<u64> {
        let (offset, size) = self.range().ok()?;
        offset.checked_add(size)
    }
}

/// Index entries in table order, addressable by path
///
/// Paths are unique. Inserting a path that is already present replaces the
/// earlier record (last write wins) while keeping the table position of the
/// first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveIndex {
    entries: Vec<IndexEntry>,
    positions: HashMap<String, usize>,
}

impl ArchiveIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, returning the record it replaced
    pub fn insert(&mut self, entry: IndexEntry) -> Option<IndexEntry> {
        match self.positions.get(&entry.path) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos], entry)),
            None => {
                self.positions.insert(entry.path.clone(), self.entries.len());
                self.entries.push(entry);
                None
            }
        }
    }

    /// Look up an entry by virtual path
    pub fn get(&self, path: &str) -> Option<&IndexEntry> {
        self.positions.get(path).map(|&pos| &self.entries[pos])
    }

    /// Offset and size of an entry by virtual path
    pub fn range_of(&self, path: &str) -> Option<(i64, i64)> {
        self.get(path).map(|e| (e.offset, e.size))
    }

    /// Whether the index holds `path`
    pub fn contains(&self, path: &str) -> bool {
        self.positions.contains_key(path)
    }

    /// Entries in table order
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Iterate entries in table order
    pub fn iter(&self) -> std::slice::Iter<'_, IndexEntry> {
        self.entries.iter()
    }

    /// Number of unique paths
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total payload bytes referenced by the index
    pub fn data_size(&self) -> u64 {
        self.entries
            .iter()
            .map(|e| u64::try_from(e.size).unwrap_or(0))
            .sum()
    }
}

impl FromIterator<IndexEntry> for ArchiveIndex {
    fn from_iter<I: IntoIterator<Item = IndexEntry>>(iter: I) -> Self {
        let mut index = ArchiveIndex::new();
        for entry in iter {
            index.insert(entry);
        }
        index
    }
}

impl<'a> IntoIterator for &'a ArchiveIndex {
    type Item = &'a IndexEntry;
    type IntoIter = std::slice::Iter<'a, IndexEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Parse the header and index table from the start of `reader`
///
/// Every record declared by the header must be present. A stream that ends
/// early fails with [`Error::Truncated`]; a partial index is never returned.
pub fn parse_header_index<R: Read>(reader: &mut R) -> Result<(ArchiveHeader, ArchiveIndex)> {
    let mut fields = FieldReader::new(reader);
    let header = ArchiveHeader::read_fields(&mut fields)?;

    let mut index = ArchiveIndex::new();
    for i in 0..header.file_count as usize {
        fields.set_entry(i);

        let path_len = fields.read_i32("path_length")?;
        let path_len = u64::try_from(path_len)
            .map_err(|_| Error::format(format!("Negative path length in entry {i}")))?;
        let raw = fields.read_vec(path_len, "path")?;
        let path = String::from_utf8(raw)
            .map_err(|_| Error::format(format!("Path of entry {i} is not UTF-8")))?
            .trim_end_matches('\0')
            .to_string();

        let offset = fields.read_i64("offset")?;
        let size = fields.read_i64("size")?;
        let checksum = fields.read_array::<CHECKSUM_SIZE>("checksum")?;

        log::trace!("Index entry {i}: {path} @ {offset} ({size} bytes)");

        let entry = IndexEntry {
            path,
            offset,
            size,
            checksum,
        };
        if let Some(previous) = index.insert(entry) {
            log::warn!("Duplicate index path {}, keeping the later record", previous.path);
        }
    }

    Ok((header, index))
}

/// Write the header and index table
///
/// Paths are written with their exact UTF-8 length, without padding. The
/// entry count is taken from `entries`.
pub fn serialize_header_index<W: Write>(
    writer: &mut W,
    template: &HeaderTemplate,
    entries: &[IndexEntry],
) -> Result<()> {
    let count = i32::try_from(entries.len())
        .map_err(|_| Error::format(format!("Too many entries: {}", entries.len())))?;
    ArchiveHeader::from_template(template, count).write(writer)?;

    for entry in entries {
        let path = entry.path.as_bytes();
        let path_len = i32::try_from(path.len())
            .map_err(|_| Error::format(format!("Path too long: {}", entry.path)))?;
        writer.write_i32::<LittleEndian>(path_len)?;
        writer.write_all(path)?;
        writer.write_i64::<LittleEndian>(entry.offset)?;
        writer.write_i64::<LittleEndian>(entry.size)?;
        writer.write_all(&entry.checksum)?;
    }

    Ok(())
}

/// Offset of the first payload for a table holding `paths`
pub fn data_base_offset<'a, I>(paths: I) -> u64
where
    I: IntoIterator<Item = &'a str>,
{
    HEADER_SIZE
        + paths
            .into_iter()
            .map(|p| RECORD_FIXED_SIZE + p.len() as u64)
            .sum::<u64>()
}

/// Assign offsets to `entries` in table order
///
/// The index size only depends on paths and entry count, so the data base can
/// be computed up front; each offset is the base plus the sizes of the entries
/// before it.
pub fn index_layout(entries: &mut [IndexEntry]) -> Result<()> {
    let base = data_base_offset(entries.iter().map(|e| e.path.as_str()));
    let mut cursor = i64::try_from(base)
        .map_err(|_| Error::format("Index table exceeds the addressable range"))?;

    for entry in entries.iter_mut() {
        if entry.size < 0 {
            return Err(Error::format(format!("Negative size for {}", entry.path)));
        }
        entry.offset = cursor;
        cursor = cursor
            .checked_add(entry.size)
            .ok_or_else(|| Error::format("Archive exceeds the addressable range"))?;
    }

    Ok(())
}
