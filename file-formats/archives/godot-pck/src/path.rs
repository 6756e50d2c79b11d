//! Path utilities for PCK archives
//!
//! Entries are addressed by virtual paths rooted at `res://` with `/` as the
//! separator on every platform. On disk the prefix is dropped and the
//! remainder becomes a path relative to the extraction directory.
//!
//! # Examples
//!
//! ```
//! use godot_pck::path::{strip_virtual_root, to_virtual_path};
//!
//! assert_eq!(to_virtual_path("scenes/main.tscn"), "res://scenes/main.tscn");
//! assert_eq!(strip_virtual_root("res://scenes/main.tscn"), "scenes/main.tscn");
//! ```

use crate::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Virtual root prefix of every entry path
pub const VIRTUAL_ROOT: &str = "res://";

/// Prefix a relative path with the virtual root
pub fn to_virtual_path(relative: &str) -> String {
    format!("{VIRTUAL_ROOT}{}", relative.trim_start_matches('/'))
}

/// Remove the virtual root prefix, if present
pub fn strip_virtual_root(path: &str) -> &str {
    path.strip_prefix(VIRTUAL_ROOT).unwrap_or(path)
}

/// Relative path of `path` below `root`, with `/` separators
pub fn relative_slash_path(root: &Path, path: &Path) -> Result<String> {
    let rel = path.strip_prefix(root).map_err(|_| {
        Error::UnsafePath(format!(
            "{} is not below {}",
            path.display(),
            root.display()
        ))
    })?;

    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => parts.push(
                part.to_str()
                    .ok_or_else(|| {
                        Error::UnsafePath(format!("Non UTF-8 file name: {}", path.display()))
                    })?
                    .to_string(),
            ),
            Component::CurDir => {}
            _ => {
                return Err(Error::UnsafePath(format!(
                    "Unexpected component in {}",
                    rel.display()
                )));
            }
        }
    }
    Ok(parts.join("/"))
}

/// Validate a relative entry path before it is joined to a directory
///
/// Rejects empty paths, absolute paths, parent references and NUL bytes, so
/// that an archive can never write outside of the extraction directory.
pub fn validate_relative_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(Error::UnsafePath("Empty entry path".to_string()));
    }
    if path.contains('\0') {
        return Err(Error::UnsafePath(format!("NUL byte in {path:?}")));
    }
    if path.starts_with('/') || path.starts_with('\\') {
        return Err(Error::UnsafePath(format!("Absolute entry path {path}")));
    }

    for part in path.split(['/', '\\']) {
        if part == ".." {
            return Err(Error::UnsafePath(format!("Parent reference in {path}")));
        }
    }

    for component in Path::new(path).components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => return Err(Error::UnsafePath(format!("Unsafe entry path {path}"))),
        }
    }

    Ok(())
}

/// Destination of a virtual path below `root`
pub fn destination_for(root: &Path, virtual_path: &str) -> Result<PathBuf> {
    let relative = strip_virtual_root(virtual_path);
    validate_relative_path(relative)?;
    Ok(relative
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .fold(root.to_path_buf(), |dest, part| dest.join(part)))
}
