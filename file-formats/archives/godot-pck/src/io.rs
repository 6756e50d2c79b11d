//! Low-level I/O helpers for PCK archives
//!
//! Header and index fields are read through [`FieldReader`], which turns a
//! premature end of input into [`Error::Truncated`] naming the field that was
//! cut short. Payloads are read through [`read_entry`], which reports
//! [`Error::ShortRead`] instead.

use crate::index::IndexEntry;
use crate::{Error, Result};
use byteorder::{ByteOrder, LittleEndian};
use std::io::{ErrorKind, Read, Seek, SeekFrom};

/// Reader that tracks which index entry is being decoded
#[derive(Debug)]
pub(crate) struct FieldReader<'a, R> {
    inner: &'a mut R,
    entry: usize,
}

impl<'a, R: Read> FieldReader<'a, R> {
    pub(crate) fn new(inner: &'a mut R) -> Self {
        Self { inner, entry: 0 }
    }

    /// Set the entry number reported by truncation errors
    pub(crate) fn set_entry(&mut self, entry: usize) {
        self.entry = entry;
    }

    /// Fill `buf` completely or fail with [`Error::Truncated`]
    pub(crate) fn read_exact(&mut self, buf: &mut [u8], field: &'static str) -> Result<()> {
        let filled = fill(self.inner, buf)?;
        if filled < buf.len() {
            return Err(Error::Truncated {
                field,
                entry: self.entry,
                needed: (buf.len() - filled) as u64,
            });
        }
        Ok(())
    }

    pub(crate) fn read_array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_exact(&mut buf, field)?;
        Ok(buf)
    }

    pub(crate) fn read_u32(&mut self, field: &'static str) -> Result<u32> {
        Ok(LittleEndian::read_u32(&self.read_array::<4>(field)?))
    }

    pub(crate) fn read_i32(&mut self, field: &'static str) -> Result<i32> {
        Ok(LittleEndian::read_i32(&self.read_array::<4>(field)?))
    }

    pub(crate) fn read_i64(&mut self, field: &'static str) -> Result<i64> {
        Ok(LittleEndian::read_i64(&self.read_array::<8>(field)?))
    }

    /// Read a variable-length field without trusting `len` for allocation
    pub(crate) fn read_vec(&mut self, len: u64, field: &'static str) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.inner.by_ref().take(len).read_to_end(&mut buf)?;
        let got = buf.len() as u64;
        if got < len {
            return Err(Error::Truncated {
                field,
                entry: self.entry,
                needed: len - got,
            });
        }
        Ok(buf)
    }
}

/// Read into `buf` until it is full or the input ends, returning bytes read
fn fill<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

/// Read up to `size` bytes starting at `offset`
///
/// Returns fewer bytes than requested when the input ends early; callers
/// decide whether that is an error.
pub fn read_range<R: Read + Seek>(reader: &mut R, offset: u64, size: u64) -> Result<Vec<u8>> {
    reader.seek(SeekFrom::Start(offset))?;
    let mut data = Vec::new();
    reader.by_ref().take(size).read_to_end(&mut data)?;
    Ok(data)
}

/// Read the payload of `entry`
///
/// Seeks to the entry's offset and reads exactly its size. A payload that
/// ends before `size` bytes is an [`Error::ShortRead`].
pub fn read_entry<R: Read + Seek>(reader: &mut R, entry: &IndexEntry) -> Result<Vec<u8>> {
    let (offset, size) = entry.range()?;
    let data = read_range(reader, offset, size)?;
    if (data.len() as u64) < size {
        return Err(Error::ShortRead {
            path: entry.path.clone(),
            expected: size,
            actual: data.len() as u64,
        });
    }
    log::trace!("Read {} bytes for {} at {}", size, entry.path, offset);
    Ok(data)
}
