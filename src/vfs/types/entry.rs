/*!
 * VFS Entry
 * File or folder handle returned by drive backends, with validation
 */

use super::errors::VfsError;
use super::file_type::FileType;
use serde::{Deserialize, Deserializer, Serialize};

/// File or folder on a drive
///
/// Entry names must be non-empty and cannot contain null bytes or path
/// separators. `full_path` is the backend's own rendering of the location
/// (drive root included) and is not interpreted by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Entry {
    #[serde(deserialize_with = "deserialize_valid_filename")]
    pub name: String,
    pub file_type: FileType,
    #[serde(default)]
    pub size: u64,
    pub full_path: String,
}

impl Entry {
    /// Create a new entry with validation
    #[must_use = "validation result must be checked"]
    pub fn new(
        name: impl Into<String>,
        file_type: FileType,
        size: u64,
        full_path: impl Into<String>,
    ) -> Result<Self, VfsError> {
        let name = name.into();
        Self::validate_name(&name)?;
        Ok(Self {
            name,
            file_type,
            size,
            full_path: full_path.into(),
        })
    }

    /// Create a file entry
    #[inline]
    #[must_use = "validation result must be checked"]
    pub fn file(
        name: impl Into<String>,
        size: u64,
        full_path: impl Into<String>,
    ) -> Result<Self, VfsError> {
        Self::new(name, FileType::File, size, full_path)
    }

    /// Create a folder entry
    #[inline]
    #[must_use = "validation result must be checked"]
    pub fn folder(name: impl Into<String>, full_path: impl Into<String>) -> Result<Self, VfsError> {
        Self::new(name, FileType::Directory, 0, full_path)
    }

    #[inline]
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        matches!(self.file_type, FileType::Directory)
    }

    #[inline]
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self.file_type, FileType::File)
    }

    /// Validate entry name
    #[must_use = "validation result must be checked"]
    pub fn validate_name(name: &str) -> Result<(), VfsError> {
        if name.is_empty() {
            return Err(VfsError::InvalidPath("entry name cannot be empty".into()));
        }
        if name.contains('\0') {
            return Err(VfsError::InvalidPath(
                "entry name cannot contain null bytes".into(),
            ));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(VfsError::InvalidPath(
                "entry name cannot contain path separators".into(),
            ));
        }
        Ok(())
    }
}

/// Deserialize and validate filename
fn deserialize_valid_filename<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    Entry::validate_name(&name).map_err(serde::de::Error::custom)?;
    Ok(name)
}
