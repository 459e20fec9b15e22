/*!
 * Reconciler Tests
 * Both feeds through the single worker, flush barrier and shutdown
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use drivehub::core::{InlineExecutor, ManualSleeper};
use drivehub::devices::{
    BackendHandle, BackendResult, DeviceRegistry, DriveSource, Reconciler, RegistryConfig,
    RegistryError,
};
use drivehub::{EventSource, SimulatedHost};
use pretty_assertions::assert_eq;

use super::fixtures::{build, phone, PHONE_CONTROLLER, PHONE_HUB, PHONE_ROOT};

fn setup() -> (Arc<SimulatedHost>, DeviceRegistry, Reconciler) {
    let host = Arc::new(SimulatedHost::new());
    host.add_portable(phone());
    let (registry, _) = build(&host, ManualSleeper::new());
    let reconciler = Reconciler::spawn(registry.clone()).unwrap();
    (host, registry, reconciler)
}

#[test]
fn test_duplicate_adds_from_both_feeds_converge() {
    let (_host, registry, reconciler) = setup();
    let hub = reconciler.feed(EventSource::Hub);
    let controller = reconciler.feed(EventSource::Controller);

    hub.added(PHONE_HUB).unwrap();
    controller.added(PHONE_CONTROLLER).unwrap();
    reconciler.flush().unwrap();

    let drives = registry.drives();
    assert_eq!(drives.len(), 1);
    assert_eq!(drives[0].stable_id().as_deref(), Some("r58m"));
    assert!(drives[0].is_connected());
    assert_eq!(registry.pending_probes(), 0);
    reconciler.shutdown();
}

#[test]
fn test_unparseable_events_are_dropped() {
    let (_host, registry, reconciler) = setup();
    let hub = reconciler.feed(EventSource::Hub);
    let controller = reconciler.feed(EventSource::Controller);

    // No serial number: the OS made up an instance id
    hub.added("USB\\VID_04E8&PID_6860\\6&1A2B3C&0&2").unwrap();
    controller.added("Win32_USBControllerDevice.Dependent").unwrap();
    hub.removed("").unwrap();
    reconciler.flush().unwrap();

    let drives = registry.drives();
    assert_eq!(drives.len(), 1);
    assert_eq!(drives[0].stable_id(), None);
    assert!(drives[0].connected_flag());

    // The worker is still alive
    hub.added(PHONE_HUB).unwrap();
    reconciler.flush().unwrap();
    assert_eq!(registry.drives()[0].stable_id().as_deref(), Some("r58m"));
}

#[test]
fn test_non_ascii_descriptors_do_not_stop_the_worker() {
    let (_host, registry, reconciler) = setup();
    let hub = reconciler.feed(EventSource::Hub);
    let controller = reconciler.feed(EventSource::Controller);

    hub.added("USB\\VID_04E8&abcé&PID_686é\\SERIAL1").unwrap();
    controller
        .added(r#"Win32_PnPEntity.DeviceID="USB\\VID_04é8&PID_6860\\SERIAL1""#)
        .unwrap();
    reconciler.flush().unwrap();
    assert!(reconciler.is_running());

    hub.added(PHONE_HUB).unwrap();
    reconciler.flush().unwrap();
    assert_eq!(registry.drives()[0].stable_id().as_deref(), Some("r58m"));
}

/// Host whose portable enumeration panics while armed
struct PanickingHost {
    host: Arc<SimulatedHost>,
    armed: AtomicBool,
}

impl DriveSource for PanickingHost {
    fn fixed_drives(&self, external_roots: &[String]) -> BackendResult<Vec<BackendHandle>> {
        self.host.fixed_drives(external_roots)
    }

    fn classify_external(&self) -> BackendResult<Vec<String>> {
        self.host.classify_external()
    }

    fn portable_drives(&self) -> BackendResult<Vec<BackendHandle>> {
        if self.armed.load(Ordering::SeqCst) {
            panic!("shell namespace enumeration crashed");
        }
        self.host.portable_drives()
    }
}

#[test]
fn test_panicking_handler_drops_only_that_event() {
    let host = Arc::new(SimulatedHost::new());
    host.add_portable(phone());
    let source = Arc::new(PanickingHost {
        host,
        armed: AtomicBool::new(false),
    });
    let (registry, _) = DeviceRegistry::builder(source.clone())
        .with_executor(InlineExecutor)
        .with_sleeper(ManualSleeper::new())
        .with_config(RegistryConfig::fast())
        .build();
    let reconciler = Reconciler::spawn(registry.clone()).unwrap();
    let hub = reconciler.feed(EventSource::Hub);

    source.armed.store(true, Ordering::SeqCst);
    hub.removed(PHONE_HUB).unwrap();
    // Barrier queued right behind the panicking event still gets answered
    reconciler.flush().unwrap();
    assert!(reconciler.is_running());
    assert!(!registry.drives()[0].connected_flag());

    source.armed.store(false, Ordering::SeqCst);
    hub.added(PHONE_HUB).unwrap();
    reconciler.flush().unwrap();

    let drives = registry.drives();
    assert_eq!(drives.len(), 1);
    assert_eq!(drives[0].stable_id().as_deref(), Some("r58m"));
    assert!(drives[0].is_connected());
    reconciler.shutdown();
}

#[test]
fn test_transient_disconnect_keeps_drive_state() {
    let (_host, registry, reconciler) = setup();
    let hub = reconciler.feed(EventSource::Hub);

    hub.added(PHONE_HUB).unwrap();
    reconciler.flush().unwrap();
    let drive = registry.drives()[0].clone();
    assert_eq!(drive.children().unwrap().len(), 1);

    hub.removed(PHONE_HUB).unwrap();
    reconciler.flush().unwrap();
    assert!(!drive.is_connected());

    hub.added(PHONE_HUB).unwrap();
    reconciler.flush().unwrap();

    let current = registry.drives()[0].clone();
    assert_eq!(current.instance_id(), drive.instance_id());
    assert!(current.is_connected());
    assert!(current.children_cached());
}

#[test]
fn test_full_unplug_and_replug() {
    let (host, registry, reconciler) = setup();
    let hub = reconciler.feed(EventSource::Hub);
    hub.added(PHONE_HUB).unwrap();
    reconciler.flush().unwrap();

    host.remove_portable(PHONE_ROOT);
    hub.removed(PHONE_HUB).unwrap();
    reconciler.flush().unwrap();
    assert!(registry.is_empty());

    host.add_portable(phone());
    hub.added(PHONE_HUB).unwrap();
    reconciler.flush().unwrap();

    let drives = registry.drives();
    assert_eq!(drives.len(), 1);
    assert_eq!(drives[0].stable_id().as_deref(), Some("r58m"));
    assert!(drives[0].is_connected());
}

#[test]
fn test_shutdown_closes_feeds() {
    let (_host, _registry, reconciler) = setup();
    let hub = reconciler.feed(EventSource::Hub);
    reconciler.shutdown();
    assert_eq!(hub.added(PHONE_HUB), Err(RegistryError::ShutDown));
}

#[test]
fn test_drop_closes_feeds() {
    let (_host, _registry, reconciler) = setup();
    let controller = reconciler.feed(EventSource::Controller);
    drop(reconciler);
    assert_eq!(
        controller.removed(PHONE_CONTROLLER),
        Err(RegistryError::ShutDown)
    );
}
