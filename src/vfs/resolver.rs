/*!
 * Virtual Path Resolver
 * Routes backend-agnostic paths to the drive that owns them
 *
 * Every call works on one registry snapshot, so a concurrent refresh can
 * never make a single resolution mix two drive lists.
 */

use tracing::debug;

use super::paths::{split, VirtualPath};
use super::specifier::find_drive;
use super::types::{Entry, VfsError, VfsResult};
use crate::devices::{DeviceRegistry, DriveHandle};

/// Drive plus the sub-path to forward to it
#[derive(Debug, Clone)]
pub struct Resolved {
    pub drive: DriveHandle,
    pub path: VirtualPath,
}

impl Resolved {
    /// Sub-path handed verbatim to the drive backend
    pub fn sub_path(&self) -> &str {
        &self.path.sub_path
    }
}

/// Path resolver bound to a registry
#[derive(Debug, Clone)]
pub struct Resolver {
    registry: DeviceRegistry,
}

impl Resolver {
    pub fn new(registry: DeviceRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Drive named by a bare specifier (`D:\`, `{id}:\`, `id`, `[a0]:\`)
    pub fn try_drive(&self, specifier: &str) -> Option<DriveHandle> {
        let drives = self.registry.drives();
        find_drive(&drives, specifier).cloned()
    }

    pub fn drive(&self, specifier: &str) -> VfsResult<DriveHandle> {
        self.try_drive(specifier)
            .ok_or_else(|| VfsError::DriveNotFound(specifier.to_string()))
    }

    /// Split a full path and resolve its drive
    pub fn resolve_path(&self, path: &str) -> VfsResult<Resolved> {
        let path = split(path)?;
        let drive = self.drive(&path.specifier)?;
        debug!(specifier = %path.specifier, root = %drive.root_name(), "Resolved drive");
        Ok(Resolved { drive, path })
    }

    /// Drive owning `path`, or `None` for malformed or unknown paths
    pub fn try_resolve(&self, path: &str) -> Option<DriveHandle> {
        self.resolve_path(path).ok().map(|r| r.drive)
    }

    /// Drive owning `path`
    pub fn resolve(&self, path: &str) -> VfsResult<DriveHandle> {
        self.resolve_path(path).map(|r| r.drive)
    }

    pub fn parse_file(&self, path: &str) -> VfsResult<Entry> {
        let resolved = self.resolve_path(path)?;
        resolved.drive.parse_file(resolved.sub_path())
    }

    pub fn try_parse_file(&self, path: &str) -> Option<Entry> {
        self.parse_file(path).ok()
    }

    pub fn parse_folder(&self, path: &str) -> VfsResult<Entry> {
        let resolved = self.resolve_path(path)?;
        resolved.drive.parse_folder(resolved.sub_path())
    }

    pub fn try_parse_folder(&self, path: &str) -> Option<Entry> {
        self.parse_folder(path).ok()
    }

    /// Create a folder and any missing parents
    pub fn create_folder(&self, path: &str) -> VfsResult<Entry> {
        let resolved = self.resolve_path(path)?;
        resolved.drive.create_folder(resolved.sub_path())
    }

    /// Whether `path` names an existing file or folder
    pub fn exists(&self, path: &str) -> bool {
        let Ok(resolved) = self.resolve_path(path) else {
            return false;
        };
        resolved.drive.parse_folder(resolved.sub_path()).is_ok()
            || resolved.drive.parse_file(resolved.sub_path()).is_ok()
    }

    pub fn file_size(&self, path: &str) -> VfsResult<u64> {
        self.parse_file(path).map(|entry| entry.size)
    }

    /// Recursive size of a folder
    pub fn folder_size(&self, path: &str) -> VfsResult<u64> {
        let resolved = self.resolve_path(path)?;
        resolved.drive.parse_folder(resolved.sub_path())?;
        resolved.drive.size_of(resolved.sub_path())
    }
}
