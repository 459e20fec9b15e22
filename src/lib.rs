/*!
 * DriveHub Library
 * Hot-plug aware virtual filesystem over heterogeneous external drives
 *
 * The `DeviceRegistry` owns the live drive list and is fed by a single
 * `Reconciler` worker. A `Resolver` maps virtual paths such as
 * `{unique-id}:\DCIM` or `[a0]:\Music` onto registry drives, and the
 * `CompletionTracker` infers when asynchronous copies and moves have landed.
 */

pub mod completion;
pub mod core;
pub mod devices;
pub mod monitoring;
pub mod vfs;

// Re-exports
pub use completion::{
    CompletionError, CompletionResult, CompletionTracker, FileCompletionConfig,
    FolderCompletionConfig, FolderOutcome,
};
pub use crate::core::{
    BackendKind, DelayedExecutor, DriveHubError, DriveType, InlineExecutor, ManualSleeper,
    Result, Sleeper, ThreadExecutor, ThreadSleeper, TokioExecutor,
};
pub use devices::{
    BackendError, DeviceFeed, DeviceIdentity, DeviceRegistry, DriveBackend, DriveHandle,
    DriveSource, EventSource, HardwareId, HostManifest, InitReport, InitWarning, LogicalDrive,
    Reconciler, RegistryBuilder, RegistryConfig, RegistryError, RegistryResult, SimulatedHost,
};
pub use monitoring::init_tracing;
pub use vfs::{
    Entry, FileType, LocalDrive, MemoryDrive, Resolved, Resolver, VfsError, VfsResult,
    VirtualPath,
};
