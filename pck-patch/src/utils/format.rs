//! Formatting utilities

use humansize::{DECIMAL, format_size};

/// Format file size in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, DECIMAL)
}

/// Format a stored checksum, or a dash when the field is empty
pub fn format_checksum(checksum: &[u8; 16]) -> String {
    if checksum.iter().all(|&b| b == 0) {
        "-".to_string()
    } else {
        hex::encode(checksum)
    }
}

/// Format the reserved header block, or "zeroed" when it carries no data
pub fn format_reserved(reserved: &[u8]) -> String {
    if reserved.iter().all(|&b| b == 0) {
        "zeroed".to_string()
    } else {
        hex::encode(reserved)
    }
}
