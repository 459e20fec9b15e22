/*!
 * Core Module
 * Shared drive types, limits, timing seams and the crate-wide error
 */

pub mod clock;
pub mod deferred;
pub mod errors;
pub mod limits;
pub mod types;

// Re-export for convenience
pub use clock::{ManualSleeper, Sleeper, ThreadSleeper};
pub use deferred::{DeferredTask, DelayedExecutor, InlineExecutor, ThreadExecutor, TokioExecutor};
pub use errors::{DriveHubError, Result};
pub use types::{BackendKind, DriveType};
