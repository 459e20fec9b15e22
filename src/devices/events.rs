/*!
 * Device Events
 * Raw hot-plug notifications as delivered by the two OS feeds
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which notification feed delivered an event
///
/// Not every device registers as a USB hub; some only show up as
/// controller devices, so both feeds are watched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    /// Hub-level notifications carrying a device instance path
    Hub,
    /// Controller-level notifications carrying a quoted `Dependent` reference
    Controller,
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EventSource::Hub => write!(f, "hub"),
            EventSource::Controller => write!(f, "controller"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceAction {
    Added,
    Removed,
}

/// One raw notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEvent {
    pub source: EventSource,
    pub action: DeviceAction,
    pub descriptor: String,
}

impl DeviceEvent {
    pub fn added(source: EventSource, descriptor: impl Into<String>) -> Self {
        Self {
            source,
            action: DeviceAction::Added,
            descriptor: descriptor.into(),
        }
    }

    pub fn removed(source: EventSource, descriptor: impl Into<String>) -> Self {
        Self {
            source,
            action: DeviceAction::Removed,
            descriptor: descriptor.into(),
        }
    }
}
