/*!
 * Simulated Host
 * In-memory `DriveSource` with scriptable volumes, devices and failures
 *
 * Drives the integration tests and the demo binary. A host can be built
 * programmatically or loaded from a JSON manifest.
 */

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::backend::{BackendHandle, DriveBackend, DriveSource};
use super::errors::{BackendError, BackendResult};
use super::events::EventSource;
use crate::core::types::DriveType;
use crate::vfs::types::VfsResult;
use crate::vfs::MemoryDrive;

/// One file to create on a simulated drive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSpec {
    pub path: String,
    #[serde(default)]
    pub size: u64,
}

/// One simulated drive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveSpec {
    pub root: String,
    #[serde(default)]
    pub drive_type: DriveType,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub unique_id: Option<String>,
    /// Reported by the external-volume classifier
    #[serde(default)]
    pub external: bool,
    #[serde(default)]
    pub folders: Vec<String>,
    #[serde(default)]
    pub files: Vec<FileSpec>,
}

impl DriveSpec {
    fn build(&self) -> VfsResult<MemoryDrive> {
        let mut drive =
            MemoryDrive::new(self.root.clone(), self.drive_type).with_label(self.label.clone());
        if let Some(id) = &self.unique_id {
            drive = drive.with_unique_id(id.clone());
        }
        for folder in &self.folders {
            drive.create_folder(folder)?;
        }
        for file in &self.files {
            drive.add_file(&file.path, file.size)?;
        }
        Ok(drive)
    }
}

/// A device already attached when the registry starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentDevice {
    pub source: EventSource,
    pub descriptor: String,
}

/// JSON description of a host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostManifest {
    #[serde(default)]
    pub volumes: Vec<DriveSpec>,
    #[serde(default)]
    pub portable: Vec<DriveSpec>,
    #[serde(default)]
    pub present_devices: Vec<PresentDevice>,
}

impl HostManifest {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

struct Volume {
    drive: Arc<MemoryDrive>,
    declared: DriveType,
    external: bool,
}

#[derive(Default)]
struct HostState {
    volumes: Vec<Volume>,
    portable: Vec<Arc<MemoryDrive>>,
    fixed_failure: Option<BackendError>,
    portable_failure: Option<BackendError>,
}

/// Scriptable host
#[derive(Default)]
pub struct SimulatedHost {
    state: Mutex<HostState>,
    fixed_calls: AtomicUsize,
    classify_calls: AtomicUsize,
    portable_calls: AtomicUsize,
}

impl SimulatedHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_manifest(manifest: &HostManifest) -> VfsResult<Self> {
        let host = Self::new();
        for spec in &manifest.volumes {
            host.add_volume(spec.build()?, spec.external);
        }
        for spec in &manifest.portable {
            host.add_portable(spec.build()?);
        }
        Ok(host)
    }

    /// Attach a fixed/removable volume
    pub fn add_volume(&self, drive: MemoryDrive, external: bool) -> Arc<MemoryDrive> {
        let drive = Arc::new(drive);
        let declared = drive.drive_type();
        self.state.lock().volumes.push(Volume {
            drive: drive.clone(),
            declared,
            external,
        });
        drive
    }

    pub fn remove_volume(&self, root: &str) -> bool {
        let mut state = self.state.lock();
        let before = state.volumes.len();
        state
            .volumes
            .retain(|v| !v.drive.root_name().eq_ignore_ascii_case(root));
        state.volumes.len() != before
    }

    /// Make a portable device visible to the shell enumeration
    pub fn add_portable(&self, drive: MemoryDrive) -> Arc<MemoryDrive> {
        let drive = Arc::new(drive);
        self.state.lock().portable.push(drive.clone());
        drive
    }

    pub fn remove_portable(&self, root: &str) -> bool {
        let mut state = self.state.lock();
        let before = state.portable.len();
        state
            .portable
            .retain(|d| !d.root_name().eq_ignore_ascii_case(root));
        state.portable.len() != before
    }

    /// Make the fixed path (enumeration and classifier) fail until cleared
    pub fn fail_fixed(&self, failure: Option<BackendError>) {
        self.state.lock().fixed_failure = failure;
    }

    /// Make the portable enumeration fail until cleared
    pub fn fail_portable(&self, failure: Option<BackendError>) {
        self.state.lock().portable_failure = failure;
    }

    pub fn fixed_calls(&self) -> usize {
        self.fixed_calls.load(Ordering::Relaxed)
    }

    pub fn classify_calls(&self) -> usize {
        self.classify_calls.load(Ordering::Relaxed)
    }

    pub fn portable_calls(&self) -> usize {
        self.portable_calls.load(Ordering::Relaxed)
    }
}

impl DriveSource for SimulatedHost {
    fn fixed_drives(&self, external_roots: &[String]) -> BackendResult<Vec<BackendHandle>> {
        self.fixed_calls.fetch_add(1, Ordering::Relaxed);
        let state = self.state.lock();
        if let Some(failure) = &state.fixed_failure {
            return Err(failure.clone());
        }

        let drives = state
            .volumes
            .iter()
            .map(|v| {
                let root = v.drive.root_name();
                let external = external_roots.iter().any(|r| r.eq_ignore_ascii_case(root));
                let drive_type = match v.declared {
                    DriveType::InternalHdd if external => DriveType::ExternalHdd,
                    other => other,
                };
                v.drive.set_drive_type(drive_type);
                v.drive.clone() as BackendHandle
            })
            .collect();
        Ok(drives)
    }

    fn classify_external(&self) -> BackendResult<Vec<String>> {
        self.classify_calls.fetch_add(1, Ordering::Relaxed);
        let state = self.state.lock();
        if let Some(failure) = &state.fixed_failure {
            return Err(failure.clone());
        }
        Ok(state
            .volumes
            .iter()
            .filter(|v| v.external)
            .map(|v| v.drive.root_name().to_string())
            .collect())
    }

    fn portable_drives(&self) -> BackendResult<Vec<BackendHandle>> {
        self.portable_calls.fetch_add(1, Ordering::Relaxed);
        let state = self.state.lock();
        if let Some(failure) = &state.portable_failure {
            return Err(failure.clone());
        }
        Ok(state
            .portable
            .iter()
            .map(|d| d.clone() as BackendHandle)
            .collect())
    }
}
