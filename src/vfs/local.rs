/*!
 * Local Directory Backend
 * Exposes a host directory as a drive via std::fs
 */

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use super::paths::join_root;
use super::types::{Entry, FileType, VfsError, VfsResult};
use crate::core::types::DriveType;
use crate::devices::DriveBackend;

/// Drive backed by a directory on the host filesystem
#[derive(Debug, Clone)]
pub struct LocalDrive {
    dir: PathBuf,
    root_name: String,
    label: String,
    drive_type: DriveType,
    unique_id: Option<String>,
    readonly: bool,
}

impl LocalDrive {
    /// Mount `dir` under the native root name `root_name`
    pub fn new<P: Into<PathBuf>>(dir: P, root_name: impl Into<String>, drive_type: DriveType) -> Self {
        Self {
            dir: dir.into(),
            root_name: root_name.into(),
            label: String::new(),
            drive_type,
            unique_id: None,
            readonly: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_unique_id(mut self, unique_id: impl Into<String>) -> Self {
        self.unique_id = Some(unique_id.into());
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Map a drive-relative path into `dir`
    ///
    /// `..` is clamped at the drive root so a sub-path can never escape it.
    fn resolve(&self, sub_path: &str) -> PathBuf {
        let normalized = sub_path.replace('\\', "/");
        let mut parts = Vec::with_capacity(8);
        for component in Path::new(&normalized).components() {
            match component {
                Component::Normal(name) => parts.push(name),
                Component::ParentDir => {
                    parts.pop();
                }
                _ => {}
            }
        }

        let mut result = self.dir.clone();
        result.extend(parts);
        result
    }

    fn check_write(&self, sub_path: &str) -> VfsResult<()> {
        if self.readonly {
            return Err(VfsError::PermissionDenied(format!(
                "read-only drive: {}",
                self.full_path(sub_path)
            )));
        }
        Ok(())
    }

    fn full_path(&self, sub_path: &str) -> String {
        join_root(&self.root_name, sub_path)
    }

    fn entry_for(&self, path: &Path, sub_path: &str) -> VfsResult<Entry> {
        let md = fs::metadata(path).map_err(|e| VfsError::from_io(e, self.full_path(sub_path)))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| VfsError::InvalidPath(format!("invalid UTF-8 in {}", path.display())))?;
        let (file_type, size) = if md.is_dir() {
            (FileType::Directory, 0)
        } else {
            (FileType::File, md.len())
        };
        Entry::new(name, file_type, size, self.full_path(sub_path))
    }

    fn root_entry(&self) -> VfsResult<Entry> {
        if !self.dir.is_dir() {
            return Err(VfsError::NotFound(self.root_name.clone()));
        }
        let name = if Entry::validate_name(self.label.trim()).is_ok() {
            self.label.trim()
        } else {
            "root"
        };
        Entry::folder(name, self.root_name.clone())
    }
}

impl DriveBackend for LocalDrive {
    fn root_name(&self) -> &str {
        &self.root_name
    }

    fn drive_type(&self) -> DriveType {
        self.drive_type
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn native_unique_id(&self) -> Option<String> {
        self.unique_id.clone()
    }

    fn is_reachable(&self) -> bool {
        self.dir.is_dir()
    }

    fn children(&self) -> VfsResult<Vec<Entry>> {
        let entries =
            fs::read_dir(&self.dir).map_err(|e| VfsError::from_io(e, self.root_name.clone()))?;

        let mut result = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| VfsError::from_io(e, self.root_name.clone()))?;
            let name = entry
                .file_name()
                .into_string()
                .map_err(|_| VfsError::InvalidPath("invalid UTF-8 in filename".to_string()))?;
            result.push(self.entry_for(&entry.path(), &name)?);
        }
        result.sort_by_key(|e| (e.is_file(), e.name.to_lowercase()));
        Ok(result)
    }

    fn parse_file(&self, sub_path: &str) -> VfsResult<Entry> {
        let path = self.resolve(sub_path);
        if path.is_dir() {
            return Err(VfsError::IsADirectory(self.full_path(sub_path)));
        }
        self.entry_for(&path, sub_path)
    }

    fn parse_folder(&self, sub_path: &str) -> VfsResult<Entry> {
        let path = self.resolve(sub_path);
        if path == self.dir {
            return self.root_entry();
        }
        if path.is_file() {
            return Err(VfsError::NotADirectory(self.full_path(sub_path)));
        }
        self.entry_for(&path, sub_path)
    }

    fn create_folder(&self, sub_path: &str) -> VfsResult<Entry> {
        let path = self.resolve(sub_path);
        if !path.is_dir() {
            self.check_write(sub_path)?;
            fs::create_dir_all(&path).map_err(|e| VfsError::from_io(e, self.full_path(sub_path)))?;
        }
        self.parse_folder(sub_path)
    }

    fn size_of(&self, sub_path: &str) -> VfsResult<u64> {
        let path = self.resolve(sub_path);
        tree_size(&path).map_err(|e| VfsError::from_io(e, self.full_path(sub_path)))
    }
}

/// Recursive size of every file under `path` (or the size of `path` itself)
///
/// Symlinks are not followed.
pub fn tree_size(path: &Path) -> io::Result<u64> {
    let md = fs::symlink_metadata(path)?;
    if !md.is_dir() {
        return Ok(if md.is_file() { md.len() } else { 0 });
    }

    let mut total = 0u64;
    let mut pending = vec![path.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() {
                total = total.saturating_add(entry.metadata()?.len());
            }
        }
    }
    Ok(total)
}
