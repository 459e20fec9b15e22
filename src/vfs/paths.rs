/*!
 * Virtual Paths
 * Splitting of full paths into a drive specifier and a drive-relative sub-path
 */

use std::fmt;

use super::types::{VfsError, VfsResult};

/// Canonical separator; `/` is rewritten to it before parsing
pub const SEPARATOR: char = '\\';

/// Delimiter between a drive specifier and its sub-path
pub const DRIVE_DELIMITER: &str = ":\\";

/// Full path split at the first drive delimiter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VirtualPath {
    /// Drive specifier including the trailing `:\`
    pub specifier: String,
    /// Everything after the delimiter, forwarded verbatim to the backend
    pub sub_path: String,
}

impl VirtualPath {
    /// Specifier without its trailing `:\`
    pub fn drive_name(&self) -> &str {
        strip_delimiter(&self.specifier)
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.specifier, self.sub_path)
    }
}

/// Rewrite alternate separators to the canonical one
#[inline]
pub fn normalize_separators(path: &str) -> String {
    path.replace('/', "\\")
}

/// Split `path` at the first `:\`
///
/// Leading whitespace before the specifier is dropped; the sub-path is kept
/// exactly as given apart from separator normalization.
pub fn split(path: &str) -> VfsResult<VirtualPath> {
    let path = normalize_separators(path.trim_start());
    let idx = path
        .find(DRIVE_DELIMITER)
        .ok_or_else(|| VfsError::InvalidPath(describe(&path)))?;
    if idx == 0 {
        return Err(VfsError::InvalidPath(describe(&path)));
    }

    let (specifier, sub_path) = path.split_at(idx + DRIVE_DELIMITER.len());
    Ok(VirtualPath {
        specifier: specifier.to_string(),
        sub_path: sub_path.to_string(),
    })
}

/// Drop one trailing `:\` (or `:`) if present
pub fn strip_delimiter(specifier: &str) -> &str {
    specifier
        .strip_suffix(DRIVE_DELIMITER)
        .or_else(|| specifier.strip_suffix(':'))
        .unwrap_or(specifier)
}

/// Join a native root and a sub-path with exactly one separator between them
pub fn join_root(root: &str, sub_path: &str) -> String {
    let sub_path = sub_path.trim_start_matches(SEPARATOR);
    if root.ends_with(SEPARATOR) {
        format!("{}{}", root, sub_path)
    } else {
        format!("{}{}{}", root, SEPARATOR, sub_path)
    }
}

fn describe(path: &str) -> String {
    if path.is_empty() {
        "<empty>".to_string()
    } else {
        path.to_string()
    }
}
