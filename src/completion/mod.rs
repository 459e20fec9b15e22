/*!
 * Completion Tracking
 * Size-convergence waits for asynchronous copies and moves
 */

pub mod config;
pub mod errors;
pub mod file;
pub mod folder;
pub mod wait;

pub use config::{FileCompletionConfig, FolderCompletionConfig};
pub use errors::{CompletionError, CompletionResult};
pub use file::wait_for_file;
pub use folder::{wait_for_folder, FolderOutcome};
pub use wait::CompletionTracker;
