/*!
 * Backend Traits
 * Interfaces the registry needs from drive enumeration and per-drive I/O
 */

use std::sync::Arc;

use super::errors::BackendResult;
use crate::core::types::DriveType;
use crate::vfs::types::{Entry, VfsResult};

/// Native handle to one drive as surfaced by a backend
///
/// Implementations own the backend-internal path syntax: sub-paths are
/// forwarded verbatim and never interpreted by the resolver.
pub trait DriveBackend: Send + Sync {
    /// Native root name, e.g. `D:\` or a shell-namespace device path
    fn root_name(&self) -> &str;

    fn drive_type(&self) -> DriveType;

    /// Volume label or device name as reported by the backend
    fn label(&self) -> &str;

    /// Identity the backend can vouch for on its own
    ///
    /// Fixed drives usually return their root; removable volumes return the
    /// serial of the owning USB device once known. Portable drives return
    /// `None` and get their stable id from the identity map.
    fn native_unique_id(&self) -> Option<String> {
        None
    }

    /// Whether the backend still answers for this drive
    fn is_reachable(&self) -> bool {
        true
    }

    /// Top-level folders and files of the drive
    fn children(&self) -> VfsResult<Vec<Entry>>;

    fn parse_file(&self, sub_path: &str) -> VfsResult<Entry>;

    fn parse_folder(&self, sub_path: &str) -> VfsResult<Entry>;

    /// Create every missing folder up to `sub_path`; existing folders are returned as-is
    fn create_folder(&self, sub_path: &str) -> VfsResult<Entry>;

    /// Recursive size of a folder, or the size of a file
    fn size_of(&self, sub_path: &str) -> VfsResult<u64> {
        self.parse_file(sub_path).map(|entry| entry.size)
    }
}

/// Shared drive backend handle
pub type BackendHandle = Arc<dyn DriveBackend>;

/// Host-level drive enumeration
///
/// `fixed_drives` and `classify_external` are expensive on real hosts;
/// the registry calls the classifier only when the fixed volume set changed.
#[cfg_attr(test, mockall::automock)]
pub trait DriveSource: Send + Sync {
    /// Current fixed/removable volumes, typed using the given external-volume roots
    fn fixed_drives(&self, external_roots: &[String]) -> BackendResult<Vec<BackendHandle>>;

    /// Roots of the volumes that live on external (USB) disks
    fn classify_external(&self) -> BackendResult<Vec<String>>;

    /// Portable devices currently exposed by the shell namespace
    fn portable_drives(&self) -> BackendResult<Vec<BackendHandle>>;
}
