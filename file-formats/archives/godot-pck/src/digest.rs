//! Content digests
//!
//! Two digests are in play. SHA-256 decides whether two files are the same
//! when computing deltas. MD5 fills the 16-byte checksum field of index
//! records, which is the width the format reserves for it.

use crate::Result;
use md5::Md5;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const CHUNK_SIZE: usize = 64 * 1024;

/// SHA-256 of a file's contents
pub type ContentHash = [u8; 32];

/// Stream a reader through a digest
fn digest_reader<D: Digest, R: Read>(mut reader: R) -> Result<D> {
    let mut hasher = D::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        hasher.update(&buf[..n]);
    }
    Ok(hasher)
}

/// SHA-256 of the file at `path`
pub fn hash_file<P: AsRef<Path>>(path: P) -> Result<ContentHash> {
    let file = BufReader::new(File::open(path.as_ref())?);
    Ok(digest_reader::<Sha256, _>(file)?.finalize().into())
}

/// SHA-256 of a byte slice
pub fn hash_bytes(data: &[u8]) -> ContentHash {
    Sha256::digest(data).into()
}

/// MD5 checksum of the file at `path`, as stored in index records
pub fn md5_file<P: AsRef<Path>>(path: P) -> Result<[u8; 16]> {
    let file = BufReader::new(File::open(path.as_ref())?);
    Ok(digest_reader::<Md5, _>(file)?.finalize().into())
}

/// MD5 checksum of a byte slice
pub fn md5_bytes(data: &[u8]) -> [u8; 16] {
    Md5::digest(data).into()
}
