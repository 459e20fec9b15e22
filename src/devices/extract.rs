/*!
 * Descriptor Extraction
 * Feed-specific parsing of raw device descriptors into (hardware id, unique id)
 *
 * Hub feed:        `USB\VID_04E8&PID_6860\R58M12ABCDE`
 * Controller feed: `\\HOST\root\cimv2:Win32_PnPEntity.DeviceID="USB\\VID_04E8&PID_6860\\R58M12ABCDE"`
 * Portable root:   `...\\?\usb#vid_04e8&pid_6860&ms_comp_mtp&...#{...}`
 */

use super::errors::ExtractError;
use super::events::EventSource;
use super::identity::HardwareId;

/// Identity carried by one device notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub hardware_id: HardwareId,
    pub unique_id: String,
}

impl EventSource {
    /// Parse a raw descriptor using this feed's format
    pub fn extract(self, descriptor: &str) -> Result<DeviceIdentity, ExtractError> {
        match self {
            EventSource::Hub => parse_device_instance(descriptor),
            EventSource::Controller => parse_dependent(descriptor),
        }
    }
}

/// Parse a device instance path (`USB\VID_xxxx&PID_yyyy\serial`)
pub fn parse_device_instance(descriptor: &str) -> Result<DeviceIdentity, ExtractError> {
    let mut parts = descriptor.trim().split('\\');

    let bus = parts.next().filter(|s| !s.is_empty()).ok_or(ExtractError::Missing("bus"))?;
    if !bus.eq_ignore_ascii_case("usb") {
        return Err(ExtractError::Malformed(format!("not a usb device: {}", descriptor)));
    }

    let ids = parts.next().ok_or(ExtractError::Missing("vendor/product"))?;
    let hardware_id = parse_vid_pid(ids)
        .ok_or_else(|| ExtractError::Malformed(format!("no vid/pid in {}", descriptor)))?;

    let serial = parts
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ExtractError::Missing("serial"))?;

    // Devices without a serial get an OS-generated instance id like `6&1a2b3c&0&2`
    if serial.contains('&') {
        return Err(ExtractError::NoSerial(descriptor.to_string()));
    }

    Ok(DeviceIdentity {
        hardware_id,
        unique_id: serial.to_ascii_lowercase(),
    })
}

/// Parse a controller association (`...DeviceID="USB\\VID_xxxx&PID_yyyy\\serial"`)
pub fn parse_dependent(descriptor: &str) -> Result<DeviceIdentity, ExtractError> {
    const KEY: &str = "deviceid=\"";

    let lower = descriptor.to_ascii_lowercase();
    let start = lower
        .find(KEY)
        .map(|idx| idx + KEY.len())
        .ok_or(ExtractError::Missing("DeviceID"))?;
    let len = descriptor[start..]
        .find('"')
        .ok_or_else(|| ExtractError::Malformed(format!("unterminated DeviceID in {}", descriptor)))?;

    let instance = descriptor[start..start + len].replace("\\\\", "\\");
    parse_device_instance(&instance)
}

/// Hardware id embedded in a portable device's shell root name
pub fn hardware_id_from_root(root_name: &str) -> Option<HardwareId> {
    let lower = root_name.to_ascii_lowercase();
    let vid = lower.find("vid_")?;
    let pid = vid + lower[vid..].find("pid_")?;
    let end = lower[pid..]
        .find(|c: char| c == '&' || c == '#' || c == '\\')
        .map(|idx| pid + idx)
        .unwrap_or(lower.len());

    parse_vid_pid(&lower[vid..end])
}

/// `VID_04E8&PID_6860[&MI_00]` -> `vid_04e8&pid_6860`
fn parse_vid_pid(segment: &str) -> Option<HardwareId> {
    let mut vendor = None;
    let mut product = None;

    for part in segment.split('&') {
        let part = part.trim();
        // `get` refuses to cut inside a multi-byte character
        let (Some(key), Some(value)) = (part.get(..4), part.get(4..)) else {
            continue;
        };
        if key.eq_ignore_ascii_case("vid_") {
            vendor = Some(value);
        } else if key.eq_ignore_ascii_case("pid_") {
            product = Some(value);
        }
    }

    match (vendor, product) {
        (Some(v), Some(p)) if is_hex_code(v) && is_hex_code(p) => Some(HardwareId::new(v, p)),
        _ => None,
    }
}

fn is_hex_code(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_hexdigit())
}
