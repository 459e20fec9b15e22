/*!
 * Device Registry
 * Authoritative list of logical drives, kept in sync with hot-plug events
 *
 * All drive-list and identity-map access happens under one mutex per
 * registry. Backend enumeration always runs with that mutex released; the
 * results are merged in under a short critical section.
 */

use ahash::{HashMap, HashSet};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::backend::{BackendHandle, DriveSource};
use super::builder::RegistryBuilder;
use super::config::RegistryConfig;
use super::drive::{DriveHandle, LogicalDrive};
use super::errors::{RegistryError, RegistryResult};
use super::extract::{hardware_id_from_root, DeviceIdentity};
use super::identity::{HardwareId, IdentityMap, Observation};
use crate::core::clock::Sleeper;
use crate::core::deferred::DelayedExecutor;
use crate::core::limits::SLOW_REFRESH_MS;
use crate::monitoring::span_operation;

/// Mutable registry state, guarded by `RegistryInner::state`
#[derive(Default)]
struct RegistryState {
    drives: Vec<DriveHandle>,
    identities: IdentityMap,
    external_roots: Vec<String>,
    // Handle keys of the last fixed enumeration; None until one succeeded
    fixed_keys: Option<Vec<String>>,
    pending_probes: HashSet<HardwareId>,
    // Last add/remove seen per hardware id, applied to drives created later
    presence: HashMap<HardwareId, bool>,
}

impl RegistryState {
    /// Re-derive every portable drive's stable id from the identity map
    fn apply_stable_ids(&self) {
        for drive in self.drives.iter().filter(|d| d.is_portable()) {
            let id = drive
                .hardware_id()
                .and_then(|hw| self.identities.stable_id(&hw))
                .map(str::to_string);
            drive.set_stable_id(id);
        }
    }

    fn find_by_stable_id(&self, id: &str) -> Option<&DriveHandle> {
        self.drives.iter().find(|d| d.has_stable_id(id))
    }

    /// Merge freshly enumerated handles, reusing existing drive objects
    fn merge(&mut self, fixed: Option<FixedEnumeration>, portable: Vec<BackendHandle>) {
        let previous = std::mem::take(&mut self.drives);
        let (mut old_fixed, mut old_portable): (Vec<_>, Vec<_>) =
            previous.into_iter().partition(|d| !d.is_portable());

        let mut drives = Vec::with_capacity(old_fixed.len() + portable.len());

        match fixed {
            None => drives.append(&mut old_fixed),
            Some(fixed) => {
                for backend in fixed.drives {
                    let key = backend_key(&backend);
                    let drive = match old_fixed.iter().position(|d| d.identity_key() == key) {
                        Some(idx) => {
                            let drive = old_fixed.remove(idx);
                            drive.replace_backend(backend);
                            drive
                        }
                        None => {
                            debug!(root = %backend.root_name(), "New fixed drive");
                            Arc::new(LogicalDrive::new(backend))
                        }
                    };
                    drives.push(drive);
                }
                self.external_roots = fixed.external_roots;
                self.fixed_keys = Some(fixed.keys);
            }
        }

        for backend in portable {
            let hardware_id = hardware_id_from_root(backend.root_name());
            let stable_id = hardware_id
                .as_ref()
                .and_then(|hw| self.identities.stable_id(hw))
                .map(str::to_string);

            let reused = old_portable
                .iter()
                .position(|d| d.root_matches(backend.root_name()))
                .or_else(|| {
                    let id = stable_id.as_deref()?;
                    old_portable.iter().position(|d| d.has_stable_id(id))
                });

            let drive = match reused {
                Some(idx) => {
                    let drive = old_portable.remove(idx);
                    drive.replace_backend(backend);
                    drive
                }
                None => {
                    let drive = Arc::new(LogicalDrive::new(backend));
                    if let Some(&present) = hardware_id.as_ref().and_then(|hw| self.presence.get(hw)) {
                        drive.set_connected(present);
                    }
                    debug!(root = %drive.root_name(), "New portable drive");
                    drive
                }
            };
            drives.push(drive);
        }

        for gone in old_fixed.iter().chain(old_portable.iter()) {
            debug!(root = %gone.root_name(), "Drive no longer enumerated");
        }

        self.drives = drives;
        self.apply_stable_ids();
    }
}

/// Result of the (expensive) fixed-drive path of a refresh
struct FixedEnumeration {
    external_roots: Vec<String>,
    drives: Vec<BackendHandle>,
    keys: Vec<String>,
}

/// Root plus native id; a remount under another root counts as a change
fn handle_key(backend: &BackendHandle) -> String {
    format!(
        "{}|{}",
        backend.root_name(),
        backend.native_unique_id().unwrap_or_default()
    )
    .to_ascii_lowercase()
}

/// Key matched against `LogicalDrive::identity_key` when reusing drives
fn backend_key(backend: &BackendHandle) -> String {
    backend
        .native_unique_id()
        .unwrap_or_else(|| backend.root_name().to_string())
        .to_ascii_lowercase()
}

struct RegistryInner {
    source: Arc<dyn DriveSource>,
    executor: Arc<dyn DelayedExecutor>,
    sleeper: Arc<dyn Sleeper>,
    config: RegistryConfig,
    state: Mutex<RegistryState>,
    // Serializes whole refreshes; never taken while `state` is held
    refresh_gate: Mutex<()>,
    shut_down: AtomicBool,
}

/// Device registry handle
///
/// Cheap to clone; all clones share the same state. Construct it once with
/// [`DeviceRegistry::builder`] and hand it to every consumer.
#[derive(Clone)]
pub struct DeviceRegistry {
    inner: Arc<RegistryInner>,
}

impl DeviceRegistry {
    /// Start building a registry over the given host
    pub fn builder(source: Arc<dyn DriveSource>) -> RegistryBuilder {
        RegistryBuilder::new(source)
    }

    pub(super) fn from_parts(
        source: Arc<dyn DriveSource>,
        executor: Arc<dyn DelayedExecutor>,
        sleeper: Arc<dyn Sleeper>,
        config: RegistryConfig,
        identities: IdentityMap,
    ) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                source,
                executor,
                sleeper,
                config,
                state: Mutex::new(RegistryState {
                    identities,
                    ..RegistryState::default()
                }),
                refresh_gate: Mutex::new(()),
                shut_down: AtomicBool::new(false),
            }),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    /// Snapshot of every drive in registry order
    ///
    /// The returned vector is a copy; reordering or clearing it does not
    /// affect the registry.
    pub fn drives(&self) -> Vec<DriveHandle> {
        self.inner.state.lock().drives.clone()
    }

    /// Number of drives currently on record
    pub fn len(&self) -> usize {
        self.inner.state.lock().drives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Re-enumerate the host and merge the result into the drive list
    ///
    /// The fixed/removable path (including the external-volume classifier)
    /// is only re-run when the set of fixed handles changed. Portable devices
    /// are always re-enumerated. On failure the previous list is kept.
    pub fn refresh(&self) -> RegistryResult<()> {
        let _gate = self.inner.refresh_gate.lock();
        let span = span_operation("registry_refresh", SLOW_REFRESH_MS);
        let _entered = span.enter();
        let source = &self.inner.source;

        let (external_roots, known_keys) = {
            let state = self.inner.state.lock();
            (state.external_roots.clone(), state.fixed_keys.clone())
        };

        let current = source
            .fixed_drives(&external_roots)
            .map_err(RegistryError::fixed)?;
        let keys: Vec<String> = current.iter().map(handle_key).collect();

        let fixed = if known_keys.as_ref() == Some(&keys) {
            None
        } else {
            debug!(count = keys.len(), "Fixed drive set changed, reclassifying");
            let external_roots = source.classify_external().map_err(RegistryError::fixed)?;
            let drives = source
                .fixed_drives(&external_roots)
                .map_err(RegistryError::fixed)?;
            let keys = drives.iter().map(handle_key).collect();
            Some(FixedEnumeration {
                external_roots,
                drives,
                keys,
            })
        };

        let portable = source.portable_drives().map_err(RegistryError::portable)?;

        let mut state = self.inner.state.lock();
        state.merge(fixed, portable);
        debug!(drives = state.drives.len(), "Registry refreshed");
        Ok(())
    }

    /// Handle an add notification
    ///
    /// Duplicate adds (both feeds firing for one attach) converge on the
    /// same state: an existing drive is only marked connected again, and at
    /// most one attach probe runs per hardware id.
    pub fn on_new_device(&self, device: &DeviceIdentity) -> RegistryResult<()> {
        self.ensure_running()?;
        let hardware_id = &device.hardware_id;

        {
            let mut state = self.inner.state.lock();
            state.presence.insert(hardware_id.clone(), true);

            let observation = state.identities.observe(hardware_id, &device.unique_id);
            state.apply_stable_ids();

            if matches!(
                observation,
                Observation::Invalidated | Observation::AlreadyInvalid
            ) {
                debug!(hardware_id = %hardware_id, "Ignoring add for ambiguous device");
                return Ok(());
            }

            if let Some(drive) = state.find_by_stable_id(&device.unique_id) {
                drive.set_connected(true);
                debug!(root = %drive.root_name(), unique_id = %device.unique_id, "Device reattached");
                return Ok(());
            }

            if !state.pending_probes.insert(hardware_id.clone()) {
                debug!(hardware_id = %hardware_id, "Attach probe already pending");
                return Ok(());
            }
        }

        info!(hardware_id = %hardware_id, unique_id = %device.unique_id, "New device, waiting for its drive");
        self.schedule_probe(device.clone());
        Ok(())
    }

    /// Handle a remove notification
    ///
    /// Matching drives are marked disconnected, not destroyed; the refresh
    /// that follows decides whether they are still enumerated.
    pub fn on_deleted_device(&self, device: &DeviceIdentity) -> RegistryResult<()> {
        self.ensure_running()?;
        let hardware_id = &device.hardware_id;

        {
            let mut state = self.inner.state.lock();
            state.presence.insert(hardware_id.clone(), false);
            let unambiguous = !state.identities.is_invalid(hardware_id);

            let mut matched = 0usize;
            for drive in &state.drives {
                let by_id = drive.has_stable_id(&device.unique_id);
                let by_hardware =
                    unambiguous && drive.hardware_id().as_ref() == Some(hardware_id);
                if by_id || by_hardware {
                    drive.set_connected(false);
                    matched += 1;
                }
            }

            if matched == 0 {
                debug!(hardware_id = %hardware_id, "Removed device had no drive on record");
            } else {
                info!(hardware_id = %hardware_id, drives = matched, "Device disconnected");
            }
        }

        self.refresh()
    }

    /// Wait for a newly announced device to surface as a drive, then refresh
    ///
    /// Polls the portable enumeration (matched by hardware id) and the fixed
    /// enumeration (matched by the volume's unique id). Between probes the
    /// injected sleeper is used, so the loop is testable without real delays.
    pub fn monitor_for_drive(&self, device: &DeviceIdentity) -> RegistryResult<()> {
        let result = self.probe_until_attached(device);
        self.inner
            .state
            .lock()
            .pending_probes
            .remove(&device.hardware_id);
        result
    }

    fn probe_until_attached(&self, device: &DeviceIdentity) -> RegistryResult<()> {
        let attempts = self.inner.config.probe_attempts;

        for attempt in 0..=attempts {
            self.ensure_running()?;
            if self.drive_surfaced(device) {
                debug!(hardware_id = %device.hardware_id, attempt, "Device surfaced");
                return self.refresh();
            }
            if attempt < attempts {
                self.inner.sleeper.sleep(self.inner.config.probe_delay);
            }
        }

        Err(RegistryError::AttachTimeout {
            hardware_id: device.hardware_id.to_string(),
            attempts: attempts + 1,
        })
    }

    fn drive_surfaced(&self, device: &DeviceIdentity) -> bool {
        let source = &self.inner.source;

        match source.portable_drives() {
            Ok(drives) => {
                let found = drives.iter().any(|b| {
                    hardware_id_from_root(b.root_name()).as_ref() == Some(&device.hardware_id)
                });
                if found {
                    return true;
                }
            }
            Err(e) => debug!(error = %e, "Portable probe failed"),
        }

        let external_roots = self.inner.state.lock().external_roots.clone();
        match source.fixed_drives(&external_roots) {
            Ok(drives) => drives.iter().any(|b| {
                b.native_unique_id()
                    .map_or(false, |id| id.eq_ignore_ascii_case(&device.unique_id))
            }),
            Err(e) => {
                debug!(error = %e, "Fixed probe failed");
                false
            }
        }
    }

    fn schedule_probe(&self, device: DeviceIdentity) {
        let registry = self.clone();
        self.inner.executor.schedule(
            Box::new(move || {
                if let Err(e) = registry.monitor_for_drive(&device) {
                    warn!(hardware_id = %device.hardware_id, error = %e, "Device attach failed");
                }
            }),
            self.inner.config.initial_probe_delay,
        );
    }

    /// Stable id for a hardware id; `AmbiguousIdentity` if it was invalidated
    pub fn stable_id_for(&self, hardware_id: &HardwareId) -> RegistryResult<Option<String>> {
        let state = self.inner.state.lock();
        state
            .identities
            .resolve(hardware_id)
            .map(|id| id.map(str::to_string))
    }

    /// Attach probes currently in flight
    pub fn pending_probes(&self) -> usize {
        self.inner.state.lock().pending_probes.len()
    }

    /// Stop accepting events; in-flight probes give up at their next attempt
    pub fn shutdown(&self) {
        if !self.inner.shut_down.swap(true, Ordering::AcqRel) {
            info!("Device registry shut down");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::Acquire)
    }

    fn ensure_running(&self) -> RegistryResult<()> {
        if self.is_shut_down() {
            return Err(RegistryError::ShutDown);
        }
        Ok(())
    }
}

impl fmt::Debug for DeviceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("DeviceRegistry")
            .field("drives", &state.drives.len())
            .field("identities", &state.identities.len())
            .field("pending_probes", &state.pending_probes.len())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}
