/*!
 * Shared device fixtures
 */

use std::sync::Arc;

use drivehub::core::{InlineExecutor, ManualSleeper};
use drivehub::devices::{DeviceIdentity, DeviceRegistry, InitReport, RegistryConfig};
use drivehub::{DriveType, EventSource, MemoryDrive, SimulatedHost};

pub const PHONE_ROOT: &str =
    "::{20D04FE0}\\\\?\\usb#vid_04e8&pid_6860&ms_comp_mtp&sm-g920#7&1a2b&0&0000#{6ac27878}";
pub const PHONE_HUB: &str = "USB\\VID_04E8&PID_6860\\R58M";
pub const PHONE_CONTROLLER: &str =
    r#"\\HOST\root\cimv2:Win32_PnPEntity.DeviceID="USB\\VID_04E8&PID_6860\\R58M""#;

pub fn phone() -> MemoryDrive {
    let drive = MemoryDrive::new(PHONE_ROOT, DriveType::AndroidPhone).with_label("Galaxy S6");
    drive.add_file("Phone\\DCIM\\Camera\\a.jpg", 100).unwrap();
    drive
}

pub fn phone_identity() -> DeviceIdentity {
    EventSource::Hub.extract(PHONE_HUB).unwrap()
}

/// Registry running probes inline with no real sleeping
pub fn build(host: &Arc<SimulatedHost>, sleeper: ManualSleeper) -> (DeviceRegistry, InitReport) {
    DeviceRegistry::builder(host.clone())
        .with_executor(InlineExecutor)
        .with_sleeper(sleeper)
        .with_config(RegistryConfig::fast())
        .build()
}
