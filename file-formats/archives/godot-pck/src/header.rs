//! PCK header structures and parsing

use crate::io::FieldReader;
use crate::{Error, Result};
use byteorder::{LittleEndian, WriteBytesExt};
use std::fmt;
use std::io::{Read, Write};

/// PCK archive signature
pub const PCK_MAGIC: [u8; 4] = *b"GDPC";

/// Size of the opaque reserved block following the version
pub const RESERVED_SIZE: usize = 64;

/// Size of the fixed header: magic, version, reserved block and entry count
pub const HEADER_SIZE: u64 = 4 + 16 + RESERVED_SIZE as u64 + 4;

/// Four-part version number stored after the magic
///
/// Godot 3 writes `(pack_format, major, minor, patch)`. The values are kept
/// opaque here and only ever copied between archives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PackVersion(pub [u32; 4]);

impl PackVersion {
    /// Create a version from its four components
    pub fn new(a: u32, b: u32, c: u32, d: u32) -> Self {
        Self([a, b, c, d])
    }
}

impl fmt::Display for PackVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{a}.{b}.{c}.{d}")
    }
}

/// Header metadata reused verbatim when repacking
///
/// Repacking a modified tree should not change what the engine sees in the
/// header, so the version and reserved block are taken from an existing archive
/// and passed explicitly to the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderTemplate {
    /// Version tuple
    pub version: PackVersion,
    /// Opaque reserved block
    pub reserved: [u8; RESERVED_SIZE],
}

impl Default for HeaderTemplate {
    fn default() -> Self {
        Self {
            version: PackVersion::default(),
            reserved: [0u8; RESERVED_SIZE],
        }
    }
}

impl HeaderTemplate {
    /// Create a template from a version and a reserved block of any length
    ///
    /// The reserved block must be exactly [`RESERVED_SIZE`] bytes.
    pub fn new(version: PackVersion, reserved: &[u8]) -> Result<Self> {
        let reserved: [u8; RESERVED_SIZE] = reserved.try_into().map_err(|_| {
            Error::format(format!(
                "Reserved block must be {RESERVED_SIZE} bytes, got {}",
                reserved.len()
            ))
        })?;
        Ok(Self { version, reserved })
    }

    /// Read the template from the header of an existing archive
    pub fn from_archive<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let mut reader = std::io::BufReader::new(file);
        Ok(ArchiveHeader::read(&mut reader)?.template())
    }
}

/// Fixed-size PCK header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveHeader {
    /// Version tuple
    pub version: PackVersion,
    /// Opaque reserved block
    pub reserved: [u8; RESERVED_SIZE],
    /// Number of index records following the header
    pub file_count: i32,
}

impl ArchiveHeader {
    /// Build a header from a template and an entry count
    pub fn from_template(template: &HeaderTemplate, file_count: i32) -> Self {
        Self {
            version: template.version,
            reserved: template.reserved,
            file_count,
        }
    }

    /// Version and reserved block of this header
    pub fn template(&self) -> HeaderTemplate {
        HeaderTemplate {
            version: self.version,
            reserved: self.reserved,
        }
    }

    /// Read and validate a header
    ///
    /// The magic is checked before anything else is consumed past it, so a
    /// foreign file never gets its index interpreted.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut fields = FieldReader::new(reader);
        Self::read_fields(&mut fields)
    }

    pub(crate) fn read_fields<R: Read>(fields: &mut FieldReader<'_, R>) -> Result<Self> {
        let magic = fields.read_array::<4>("magic")?;
        if magic != PCK_MAGIC {
            return Err(Error::format(format!(
                "Not a Godot 3 PCK (bad magic: {})",
                hex::encode(magic)
            )));
        }

        let mut version = [0u32; 4];
        for part in &mut version {
            *part = fields.read_u32("version")?;
        }
        let reserved = fields.read_array::<RESERVED_SIZE>("reserved")?;
        let file_count = fields.read_i32("entry_count")?;
        if file_count < 0 {
            return Err(Error::format(format!(
                "Negative entry count: {file_count}"
            )));
        }

        log::debug!(
            "PCK header: version {}, {} entries",
            PackVersion(version),
            file_count
        );

        Ok(Self {
            version: PackVersion(version),
            reserved,
            file_count,
        })
    }

    /// Write the header
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&PCK_MAGIC)?;
        for part in self.version.0 {
            writer.write_u32::<LittleEndian>(part)?;
        }
        writer.write_all(&self.reserved)?;
        writer.write_i32::<LittleEndian>(self.file_count)?;
        Ok(())
    }
}
