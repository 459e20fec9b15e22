/*!
 * Registry Tests
 * Refresh, reuse and identity behavior against a simulated host
 */

use std::sync::Arc;

use drivehub::core::{InlineExecutor, ManualSleeper};
use drivehub::devices::{
    BackendError, DeviceRegistry, EnumerationKind, HardwareId, InitWarning, RegistryConfig,
    RegistryError,
};
use drivehub::{DriveType, EventSource, MemoryDrive, SimulatedHost};
use pretty_assertions::assert_eq;

use super::fixtures::{build, phone, phone_identity, PHONE_HUB};

#[test]
fn test_classifier_only_reruns_when_fixed_set_changes() {
    let host = Arc::new(SimulatedHost::new());
    host.add_volume(
        MemoryDrive::new("C:\\", DriveType::InternalHdd).with_unique_id("vol-c"),
        false,
    );

    let (registry, report) = build(&host, ManualSleeper::new());
    assert!(report.is_clean());
    assert_eq!(host.classify_calls(), 1);

    registry.refresh().unwrap();
    registry.refresh().unwrap();
    assert_eq!(host.classify_calls(), 1);

    host.add_volume(
        MemoryDrive::new("E:\\", DriveType::InternalHdd).with_unique_id("vol-e"),
        true,
    );
    registry.refresh().unwrap();
    assert_eq!(host.classify_calls(), 2);

    let external = registry
        .drives()
        .into_iter()
        .find(|d| d.root_name() == "E:\\")
        .unwrap();
    assert_eq!(external.drive_type(), DriveType::ExternalHdd);
    assert_eq!(external.stable_id().as_deref(), Some("vol-e"));
}

#[test]
fn test_init_report_collects_warnings() {
    let host = Arc::new(SimulatedHost::new());
    host.fail_portable(Some(BackendError::Unavailable("shell".into())));

    let (registry, report) = DeviceRegistry::builder(host.clone())
        .with_executor(InlineExecutor)
        .with_config(RegistryConfig::fast())
        .with_present_device(EventSource::Hub, PHONE_HUB)
        .with_present_device(EventSource::Hub, "PCI\\VEN_8086&DEV_A12F\\3&11583659")
        .with_present_device(EventSource::Controller, "no reference here")
        .build();

    let warnings = report.warnings();
    assert_eq!(warnings.len(), 3);
    assert!(matches!(warnings[0], InitWarning::UnreadableDevice { .. }));
    assert!(matches!(warnings[1], InitWarning::UnreadableDevice { .. }));
    assert!(matches!(
        warnings[2],
        InitWarning::Refresh(RegistryError::Enumeration {
            kind: EnumerationKind::Portable,
            ..
        })
    ));

    // Seeded identities survive a failed first refresh
    assert_eq!(
        registry.stable_id_for(&HardwareId::new("04e8", "6860")),
        Ok(Some("r58m".to_string()))
    );

    host.fail_portable(None);
    host.add_portable(phone());
    registry.refresh().unwrap();
    assert_eq!(registry.drives()[0].stable_id().as_deref(), Some("r58m"));
}

#[test]
fn test_late_drive_gets_identity_from_earlier_event() {
    let host = Arc::new(SimulatedHost::new());
    let sleeper = ManualSleeper::new();
    let (registry, _) = build(&host, sleeper.clone());

    // Probe runs inline and gives up: the drive never surfaces
    registry.on_new_device(&phone_identity()).unwrap();
    assert_eq!(
        sleeper.count(),
        RegistryConfig::fast().probe_attempts as usize
    );
    assert_eq!(registry.pending_probes(), 0);
    assert!(registry.is_empty());

    host.add_portable(phone());
    registry.refresh().unwrap();

    let drive = registry.drives()[0].clone();
    assert_eq!(drive.stable_id().as_deref(), Some("r58m"));
    assert!(drive.is_connected());
    assert_eq!(drive.canonical_path("DCIM"), "{r58m}:\\DCIM");
}

#[test]
fn test_remove_before_surfacing_creates_disconnected_drive() {
    let host = Arc::new(SimulatedHost::new());
    let (registry, _) = build(&host, ManualSleeper::new());

    registry.on_deleted_device(&phone_identity()).unwrap();
    host.add_portable(phone());
    registry.refresh().unwrap();

    let drive = registry.drives()[0].clone();
    assert!(!drive.connected_flag());
    assert!(!drive.is_connected());

    registry.on_new_device(&phone_identity()).unwrap();
    assert!(drive.is_connected());
    assert_eq!(registry.drives()[0].instance_id(), drive.instance_id());
}

#[test]
fn test_fixed_volume_reused_across_letter_change() {
    let host = Arc::new(SimulatedHost::new());
    host.add_volume(
        MemoryDrive::new("F:\\", DriveType::UsbStick).with_unique_id("1234-ABCD"),
        false,
    );
    let (registry, _) = build(&host, ManualSleeper::new());
    let before = registry.drives()[0].clone();
    assert_eq!(before.friendly_name(), "USB Stick");

    host.remove_volume("F:\\");
    host.add_volume(
        MemoryDrive::new("G:\\", DriveType::UsbStick).with_unique_id("1234-ABCD"),
        false,
    );
    registry.refresh().unwrap();

    let after = registry.drives()[0].clone();
    assert_eq!(after.instance_id(), before.instance_id());
    assert_eq!(after.root_name(), "G:\\");
    assert_eq!(after.stable_id().as_deref(), Some("1234-ABCD"));
}

#[test]
fn test_unreachable_backend_is_disconnected() {
    let host = Arc::new(SimulatedHost::new());
    let card = host.add_volume(
        MemoryDrive::new("E:\\", DriveType::SdCard).with_label("CARD"),
        false,
    );
    let (registry, _) = build(&host, ManualSleeper::new());
    let drive = registry.drives()[0].clone();
    assert!(drive.is_connected());

    card.set_reachable(false);
    assert!(!drive.is_connected());
}

#[test]
fn test_vanished_drive_is_dropped() {
    let host = Arc::new(SimulatedHost::new());
    host.add_portable(phone());
    let (registry, _) = build(&host, ManualSleeper::new());
    assert_eq!(registry.len(), 1);

    host.remove_portable(super::fixtures::PHONE_ROOT);
    registry.on_deleted_device(&phone_identity()).unwrap();
    assert!(registry.is_empty());
}

#[test]
fn test_non_ascii_portable_root_has_no_hardware_id() {
    let host = Arc::new(SimulatedHost::new());
    host.add_portable(phone());
    host.add_portable(MemoryDrive::new(
        "::{20D04FE0}\\\\?\\usb#vid_04é8&abcé&pid_ü860&ms_comp_mtp#7&9f&0&0000#{6ac27878}",
        DriveType::Android,
    ));

    let (registry, report) = build(&host, ManualSleeper::new());
    assert!(report.is_clean());
    assert_eq!(registry.len(), 2);

    registry.on_new_device(&phone_identity()).unwrap();
    registry.refresh().unwrap();

    let drives = registry.drives();
    assert_eq!(drives[0].stable_id().as_deref(), Some("r58m"));
    assert_eq!(drives[1].hardware_id(), None);
    assert_eq!(drives[1].stable_id(), None);
}
