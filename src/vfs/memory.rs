/*!
 * In-Memory Drive Backend
 * Volatile drive used by the simulated host, tests and the demo binary
 *
 * Paths are case-insensitive. Only names and sizes are tracked; file
 * contents are out of scope for the resolver and the completion tracker.
 */

use ahash::RandomState;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use super::paths::{join_root, strip_delimiter, SEPARATOR};
use super::types::{Entry, FileType, VfsError, VfsResult};
use crate::core::types::DriveType;
use crate::devices::DriveBackend;

/// In-memory node
#[derive(Debug, Clone)]
struct Node {
    name: String,
    // Display path relative to the drive root
    path: String,
    kind: NodeKind,
}

#[derive(Debug, Clone, Copy)]
enum NodeKind {
    File { size: u64 },
    Folder,
}

impl Node {
    fn file_type(&self) -> FileType {
        match self.kind {
            NodeKind::File { .. } => FileType::File,
            NodeKind::Folder => FileType::Directory,
        }
    }
}

/// Drive whose tree lives in a concurrent map
pub struct MemoryDrive {
    root: String,
    label: String,
    unique_id: Option<String>,
    drive_type: RwLock<DriveType>,
    reachable: AtomicBool,
    // lowercase relative path -> node; the root itself is implicit
    nodes: DashMap<String, Node, RandomState>,
}

impl MemoryDrive {
    /// Create an empty drive
    pub fn new(root: impl Into<String>, drive_type: DriveType) -> Self {
        Self {
            root: root.into(),
            label: String::new(),
            unique_id: None,
            drive_type: RwLock::new(drive_type),
            reachable: AtomicBool::new(true),
            nodes: DashMap::with_hasher(RandomState::new()),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Identity reported through `native_unique_id` (non-portable drives)
    pub fn with_unique_id(mut self, unique_id: impl Into<String>) -> Self {
        self.unique_id = Some(unique_id.into());
        self
    }

    /// Re-type the drive, e.g. after external-volume classification
    pub fn set_drive_type(&self, drive_type: DriveType) {
        *self.drive_type.write() = drive_type;
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::Release);
    }

    /// Create or resize a file, creating missing parent folders
    pub fn add_file(&self, sub_path: &str, size: u64) -> VfsResult<()> {
        let parts = components(sub_path)?;
        let (name, parents) = parts
            .split_last()
            .ok_or_else(|| VfsError::IsADirectory(self.full_path(sub_path)))?;
        self.ensure_folders(parents)?;

        let key = key_of(&parts);
        if let Some(existing) = self.nodes.get(&key) {
            if matches!(existing.kind, NodeKind::Folder) {
                return Err(VfsError::IsADirectory(self.full_path(&existing.path)));
            }
        }
        self.nodes.insert(
            key,
            Node {
                name: (*name).to_string(),
                path: parts.join("\\"),
                kind: NodeKind::File { size },
            },
        );
        Ok(())
    }

    /// Change the size of an existing file
    pub fn set_file_size(&self, sub_path: &str, size: u64) -> VfsResult<()> {
        let key = key_of(&components(sub_path)?);
        let mut node = self
            .nodes
            .get_mut(&key)
            .ok_or_else(|| VfsError::NotFound(self.full_path(sub_path)))?;
        match node.kind {
            NodeKind::File { .. } => {
                node.kind = NodeKind::File { size };
                Ok(())
            }
            NodeKind::Folder => Err(VfsError::IsADirectory(self.full_path(sub_path))),
        }
    }

    /// Remove a file or a whole folder subtree; returns whether anything was removed
    pub fn remove(&self, sub_path: &str) -> VfsResult<bool> {
        let key = key_of(&components(sub_path)?);
        if key.is_empty() {
            let had = !self.nodes.is_empty();
            self.nodes.clear();
            return Ok(had);
        }
        let prefix = format!("{}{}", key, SEPARATOR);
        let removed = self.nodes.remove(&key).is_some();
        self.nodes.retain(|k, _| !k.starts_with(&prefix));
        Ok(removed)
    }

    /// Number of files and folders on the drive
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn ensure_folders(&self, parts: &[&str]) -> VfsResult<()> {
        for depth in 1..=parts.len() {
            let prefix = &parts[..depth];
            let key = key_of(prefix);
            let entry = self.nodes.entry(key).or_insert_with(|| Node {
                name: prefix[depth - 1].to_string(),
                path: prefix.join("\\"),
                kind: NodeKind::Folder,
            });
            if let NodeKind::File { .. } = entry.kind {
                return Err(VfsError::NotADirectory(self.full_path(&entry.path)));
            }
        }
        Ok(())
    }

    fn full_path(&self, sub_path: &str) -> String {
        join_root(&self.root, sub_path)
    }

    fn to_entry(&self, node: &Node) -> VfsResult<Entry> {
        let size = match node.kind {
            NodeKind::File { size } => size,
            NodeKind::Folder => 0,
        };
        Entry::new(
            node.name.clone(),
            node.file_type(),
            size,
            self.full_path(&node.path),
        )
    }

    fn root_entry(&self) -> VfsResult<Entry> {
        let name = [self.label.trim(), strip_delimiter(&self.root)]
            .into_iter()
            .find(|candidate| Entry::validate_name(candidate).is_ok())
            .unwrap_or("root");
        Entry::folder(name, self.root.clone())
    }

    fn subtree_size(&self, key: &str) -> u64 {
        let prefix = format!("{}{}", key, SEPARATOR);
        self.nodes
            .iter()
            .filter(|n| key.is_empty() || n.key().starts_with(&prefix))
            .map(|n| match n.kind {
                NodeKind::File { size } => size,
                NodeKind::Folder => 0,
            })
            .sum()
    }
}

impl DriveBackend for MemoryDrive {
    fn root_name(&self) -> &str {
        &self.root
    }

    fn drive_type(&self) -> DriveType {
        *self.drive_type.read()
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn native_unique_id(&self) -> Option<String> {
        if self.drive_type().is_portable() {
            return None;
        }
        self.unique_id.clone()
    }

    fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::Acquire)
    }

    fn children(&self) -> VfsResult<Vec<Entry>> {
        let mut children = self
            .nodes
            .iter()
            .filter(|n| !n.key().contains(SEPARATOR))
            .map(|n| self.to_entry(n.value()))
            .collect::<VfsResult<Vec<_>>>()?;
        children.sort_by_key(|e| (e.is_file(), e.name.to_lowercase()));
        Ok(children)
    }

    fn parse_file(&self, sub_path: &str) -> VfsResult<Entry> {
        let key = key_of(&components(sub_path)?);
        match self.nodes.get(&key) {
            Some(node) if matches!(node.kind, NodeKind::File { .. }) => self.to_entry(&node),
            Some(_) => Err(VfsError::IsADirectory(self.full_path(sub_path))),
            None if key.is_empty() => Err(VfsError::IsADirectory(self.root.clone())),
            None => Err(VfsError::NotFound(self.full_path(sub_path))),
        }
    }

    fn parse_folder(&self, sub_path: &str) -> VfsResult<Entry> {
        let key = key_of(&components(sub_path)?);
        if key.is_empty() {
            return self.root_entry();
        }
        match self.nodes.get(&key) {
            Some(node) if matches!(node.kind, NodeKind::Folder) => self.to_entry(&node),
            Some(_) => Err(VfsError::NotADirectory(self.full_path(sub_path))),
            None => Err(VfsError::NotFound(self.full_path(sub_path))),
        }
    }

    fn create_folder(&self, sub_path: &str) -> VfsResult<Entry> {
        let parts = components(sub_path)?;
        self.ensure_folders(&parts)?;
        self.parse_folder(sub_path)
    }

    fn size_of(&self, sub_path: &str) -> VfsResult<u64> {
        let key = key_of(&components(sub_path)?);
        if key.is_empty() {
            return Ok(self.subtree_size(&key));
        }
        let kind = self
            .nodes
            .get(&key)
            .map(|n| n.kind)
            .ok_or_else(|| VfsError::NotFound(self.full_path(sub_path)))?;
        match kind {
            NodeKind::File { size } => Ok(size),
            NodeKind::Folder => Ok(self.subtree_size(&key)),
        }
    }
}

impl fmt::Debug for MemoryDrive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDrive")
            .field("root", &self.root)
            .field("label", &self.label)
            .field("drive_type", &self.drive_type())
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

/// Split a sub-path into clean components, resolving `.` and `..`
fn components(sub_path: &str) -> VfsResult<Vec<&str>> {
    if sub_path.contains('\0') {
        return Err(VfsError::InvalidPath("path cannot contain null bytes".into()));
    }
    let mut parts = Vec::new();
    for part in sub_path.split(|c| c == '\\' || c == '/') {
        match part {
            "" | "." => {}
            ".." => {
                // Never escape the drive root
                parts.pop();
            }
            name => parts.push(name),
        }
    }
    Ok(parts)
}

fn key_of(parts: &[&str]) -> String {
    parts.join("\\").to_lowercase()
}
