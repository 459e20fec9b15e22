/*!
 * Logical Drive
 * The registry's unit of identity: one currently or previously seen storage endpoint
 *
 * Identity fields (stable id, connectivity) and the native handle are only
 * mutated by the registry. A refresh that finds the same drive again reuses
 * the existing object and swaps in the fresh handle, so cached state survives.
 */

use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use super::backend::BackendHandle;
use super::extract::hardware_id_from_root;
use super::identity::HardwareId;
use crate::core::limits::FRIENDLY_NAME_FORBIDDEN_CHARS;
use crate::core::types::{BackendKind, DriveType};
use crate::vfs::paths::strip_delimiter;
use crate::vfs::types::{Entry, VfsResult};

/// Current native handle and what is derived from it
struct Native {
    backend: BackendHandle,
    hardware_id: Option<HardwareId>,
    friendly_name: String,
}

impl Native {
    fn new(backend: BackendHandle, drive_type: DriveType) -> Self {
        let hardware_id = if drive_type.is_portable() {
            hardware_id_from_root(backend.root_name())
        } else {
            None
        };
        let friendly_name = friendly_name(backend.label(), backend.root_name(), drive_type);
        Self {
            backend,
            hardware_id,
            friendly_name,
        }
    }
}

/// Registry-owned drive record
pub struct LogicalDrive {
    instance: Uuid,
    drive_type: DriveType,
    native: RwLock<Native>,
    stable_id: RwLock<Option<String>>,
    connected: AtomicBool,
    children: Mutex<Option<Vec<Entry>>>,
}

impl LogicalDrive {
    pub(crate) fn new(backend: BackendHandle) -> Self {
        let drive_type = backend.drive_type();
        // Portable drives start with a placeholder; the identity map fills it in
        let stable_id = if drive_type.is_portable() {
            None
        } else {
            backend.native_unique_id()
        };

        Self {
            instance: Uuid::new_v4(),
            drive_type,
            native: RwLock::new(Native::new(backend, drive_type)),
            stable_id: RwLock::new(stable_id),
            connected: AtomicBool::new(true),
            children: Mutex::new(None),
        }
    }

    /// Attach a freshly enumerated handle to this drive
    pub(crate) fn replace_backend(&self, backend: BackendHandle) {
        let mut native = self.native.write();
        if Arc::ptr_eq(&native.backend, &backend) {
            return;
        }
        if !self.drive_type.is_portable() {
            *self.stable_id.write() = backend.native_unique_id();
        }
        *native = Native::new(backend, self.drive_type);
    }

    /// Identity of this object, preserved when a refresh reuses it
    #[inline]
    pub fn instance_id(&self) -> Uuid {
        self.instance
    }

    /// Native root name of the current handle
    pub fn root_name(&self) -> String {
        self.native.read().backend.root_name().to_string()
    }

    pub(crate) fn root_matches(&self, root: &str) -> bool {
        self.native
            .read()
            .backend
            .root_name()
            .eq_ignore_ascii_case(root)
    }

    #[inline]
    pub fn drive_type(&self) -> DriveType {
        self.drive_type
    }

    #[inline]
    pub fn backend_kind(&self) -> BackendKind {
        self.drive_type.backend_kind()
    }

    #[inline]
    pub fn is_portable(&self) -> bool {
        self.drive_type.is_portable()
    }

    pub fn friendly_name(&self) -> String {
        self.native.read().friendly_name.clone()
    }

    /// Vendor/product pair, known for portable devices only
    pub fn hardware_id(&self) -> Option<HardwareId> {
        self.native.read().hardware_id.clone()
    }

    /// Stable id, absent until the identity map can vouch for it
    pub fn stable_id(&self) -> Option<String> {
        self.stable_id.read().clone()
    }

    pub(crate) fn has_stable_id(&self, id: &str) -> bool {
        self.stable_id
            .read()
            .as_deref()
            .map_or(false, |own| own.eq_ignore_ascii_case(id))
    }

    pub(crate) fn set_stable_id(&self, id: Option<String>) {
        *self.stable_id.write() = id;
    }

    /// Key used to compare drive sets across refreshes
    pub(crate) fn identity_key(&self) -> String {
        self.stable_id()
            .unwrap_or_else(|| self.root_name())
            .to_ascii_lowercase()
    }

    /// Bus-level connectivity as last reported by hot-plug events
    #[inline]
    pub fn connected_flag(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    /// Whether the drive can be used right now
    ///
    /// Portable drives additionally require the connectivity flag, since the
    /// shell may keep listing a device after it was unplugged.
    pub fn is_connected(&self) -> bool {
        if self.is_portable() && !self.connected_flag() {
            return false;
        }
        self.backend().is_reachable()
    }

    /// Top-level entries, enumerated once and cached
    pub fn children(&self) -> VfsResult<Vec<Entry>> {
        let mut cache = self.children.lock();
        if let Some(children) = cache.as_ref() {
            return Ok(children.clone());
        }
        let children = self.backend().children()?;
        *cache = Some(children.clone());
        Ok(children)
    }

    pub fn children_cached(&self) -> bool {
        self.children.lock().is_some()
    }

    pub fn invalidate_children(&self) {
        *self.children.lock() = None;
    }

    /// Render a drive-relative path in the most stable addressing form
    pub fn canonical_path(&self, sub_path: &str) -> String {
        let sub_path = sub_path.replace('/', "\\");
        match self.stable_id() {
            Some(id) => format!("{{{}}}:\\{}", id, sub_path),
            None => format!("{}:\\{}", strip_delimiter(&self.root_name()), sub_path),
        }
    }

    /// Current native handle; calls into it run without any registry lock
    pub fn backend(&self) -> BackendHandle {
        self.native.read().backend.clone()
    }

    pub fn parse_file(&self, sub_path: &str) -> VfsResult<Entry> {
        self.backend().parse_file(sub_path)
    }

    pub fn parse_folder(&self, sub_path: &str) -> VfsResult<Entry> {
        self.backend().parse_folder(sub_path)
    }

    pub fn create_folder(&self, sub_path: &str) -> VfsResult<Entry> {
        let created = self.backend().create_folder(sub_path)?;
        // A new top-level folder makes the cached listing stale
        if !sub_path.trim_matches(|c| c == '\\' || c == '/').contains(['\\', '/']) {
            self.invalidate_children();
        }
        Ok(created)
    }

    pub fn size_of(&self, sub_path: &str) -> VfsResult<u64> {
        self.backend().size_of(sub_path)
    }
}

impl fmt::Debug for LogicalDrive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogicalDrive")
            .field("instance", &self.instance)
            .field("root_name", &self.root_name())
            .field("drive_type", &self.drive_type)
            .field("stable_id", &self.stable_id())
            .field("connected", &self.connected_flag())
            .finish()
    }
}

/// Shared handle to a registry entry
pub type DriveHandle = Arc<LogicalDrive>;

/// Pick a display name: sanitized label for removable media, label otherwise
pub fn friendly_name(label: &str, root_name: &str, drive_type: DriveType) -> String {
    if drive_type.backend_kind() == BackendKind::Removable {
        let cleaned: String = label
            .trim()
            .chars()
            .filter(|ch| !FRIENDLY_NAME_FORBIDDEN_CHARS.contains(*ch))
            .collect();
        let cleaned = cleaned.trim();
        if !cleaned.is_empty() {
            return cleaned.to_string();
        }
        if let Some(generic) = drive_type.generic_name() {
            return generic.to_string();
        }
        return root_name.to_string();
    }

    let label = label.trim();
    if label.is_empty() {
        root_name.to_string()
    } else {
        label.to_string()
    }
}
