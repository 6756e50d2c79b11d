//! Path utilities

use std::path::Path;

/// Truncate a path for display
pub fn truncate_path(path: &str, max_len: usize) -> String {
    if path.len() <= max_len {
        return path.to_string();
    }

    let filename = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if filename.len() + 4 > max_len {
        // Filename alone is too long, keep its tail
        let keep = max_len.saturating_sub(3);
        let start = filename
            .char_indices()
            .map(|(i, _)| i)
            .find(|&i| filename.len() - i <= keep)
            .unwrap_or(filename.len());
        return format!("...{}", &filename[start..]);
    }

    // Keep leading directories while they fit
    let space_for_dirs = max_len - filename.len() - 4;
    let mut prefix = String::new();
    for part in path.split('/').take_while(|p| *p != filename) {
        let needed = if prefix.is_empty() {
            part.len()
        } else {
            part.len() + 1
        };
        if prefix.len() + needed > space_for_dirs {
            break;
        }
        if !prefix.is_empty() {
            prefix.push('/');
        }
        prefix.push_str(part);
    }

    if prefix.is_empty() {
        format!(".../{filename}")
    } else {
        format!("{prefix}/.../{filename}")
    }
}

/// Simple wildcard pattern matching
///
/// `*` matches any run of characters. Without a `*` the pattern matches as a
/// substring. Matching ignores case.
pub fn matches_pattern(text: &str, pattern: &str) -> bool {
    if pattern.is_empty() || pattern == "*" {
        return true;
    }

    let pattern_lower = pattern.to_lowercase();
    let text_lower = text.to_lowercase();

    if !pattern_lower.contains('*') {
        return text_lower.contains(&pattern_lower);
    }

    let parts: Vec<&str> = pattern_lower.split('*').collect();
    let mut pos = 0;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }

        if i == 0 && !text_lower.starts_with(part) {
            return false;
        }

        if let Some(found) = text_lower[pos..].find(part) {
            pos += found + part.len();
        } else {
            return false;
        }
    }

    if let Some(last) = parts.last()
        && !last.is_empty()
        && !text_lower.ends_with(last)
    {
        return false;
    }

    true
}
