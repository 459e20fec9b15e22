/*!
 * Core Types
 * Drive classification shared by the registry, resolver and backends
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage backend a drive is served by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Internal disks, optical drives, network shares
    Fixed,
    /// SD cards, USB sticks, external HDDs mounted as real volumes
    Removable,
    /// Phones and tablets reachable only through the shell namespace
    Portable,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BackendKind::Fixed => write!(f, "fixed"),
            BackendKind::Removable => write!(f, "removable"),
            BackendKind::Portable => write!(f, "portable"),
        }
    }
}

/// Fine-grained drive type
///
/// `Android` is used when we know it is an Android device but cannot tell
/// whether it is a phone or a tablet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveType {
    Android,
    AndroidPhone,
    AndroidTablet,
    Ios,
    SdCard,
    UsbStick,
    ExternalHdd,
    InternalHdd,
    CdRom,
    Network,
    Unknown,
}

impl DriveType {
    #[inline]
    #[must_use]
    pub const fn is_android(self) -> bool {
        matches!(
            self,
            DriveType::Android | DriveType::AndroidPhone | DriveType::AndroidTablet
        )
    }

    #[inline]
    #[must_use]
    pub const fn is_ios(self) -> bool {
        matches!(self, DriveType::Ios)
    }

    /// Portable devices are served by the shell namespace, not a volume
    #[inline]
    #[must_use]
    pub const fn is_portable(self) -> bool {
        self.is_android() || self.is_ios()
    }

    #[must_use]
    pub const fn backend_kind(self) -> BackendKind {
        match self {
            DriveType::Android
            | DriveType::AndroidPhone
            | DriveType::AndroidTablet
            | DriveType::Ios => BackendKind::Portable,
            DriveType::SdCard | DriveType::UsbStick | DriveType::ExternalHdd => {
                BackendKind::Removable
            }
            DriveType::InternalHdd
            | DriveType::CdRom
            | DriveType::Network
            | DriveType::Unknown => BackendKind::Fixed,
        }
    }

    /// Fallback name used when a volume has no usable label
    #[must_use]
    pub const fn generic_name(self) -> Option<&'static str> {
        match self {
            DriveType::SdCard => Some("SD Card"),
            DriveType::UsbStick => Some("USB Stick"),
            _ => None,
        }
    }
}

impl Default for DriveType {
    fn default() -> Self {
        Self::Unknown
    }
}

impl fmt::Display for DriveType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            DriveType::Android => "android",
            DriveType::AndroidPhone => "android phone",
            DriveType::AndroidTablet => "android tablet",
            DriveType::Ios => "ios",
            DriveType::SdCard => "sd card",
            DriveType::UsbStick => "usb stick",
            DriveType::ExternalHdd => "external hdd",
            DriveType::InternalHdd => "internal hdd",
            DriveType::CdRom => "cd-rom",
            DriveType::Network => "network",
            DriveType::Unknown => "unknown",
        };
        f.write_str(name)
    }
}
