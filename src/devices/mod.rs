/*!
 * Devices Module
 * Device identity, hot-plug reconciliation and the drive registry
 */

pub mod backend;
pub mod builder;
pub mod config;
pub mod drive;
pub mod errors;
pub mod events;
pub mod extract;
pub mod identity;
pub mod reconciler;
pub mod registry;
pub mod simulated;

// Re-exports
pub use backend::{BackendHandle, DriveBackend, DriveSource};
pub use builder::{InitReport, InitWarning, RegistryBuilder};
pub use config::RegistryConfig;
pub use drive::{DriveHandle, LogicalDrive};
pub use errors::{
    BackendError, BackendResult, EnumerationKind, ExtractError, RegistryError, RegistryResult,
};
pub use events::{DeviceAction, DeviceEvent, EventSource};
pub use extract::DeviceIdentity;
pub use identity::{HardwareId, IdentityMap, Mapping, Observation};
pub use reconciler::{DeviceFeed, Reconciler};
pub use registry::DeviceRegistry;
pub use simulated::{DriveSpec, FileSpec, HostManifest, PresentDevice, SimulatedHost};
