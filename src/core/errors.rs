/*!
 * Error Types
 * Crate-wide error wrapping the per-subsystem errors
 */

use miette::Diagnostic;
use thiserror::Error;

pub use crate::completion::errors::CompletionError;
pub use crate::devices::errors::{BackendError, ExtractError, RegistryError};
pub use crate::vfs::types::VfsError;

/// Result over any drivehub failure
pub type Result<T> = std::result::Result<T, DriveHubError>;

/// Top-level error for callers that span several subsystems
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum DriveHubError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Vfs(#[from] VfsError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    #[diagnostic(code(drivehub::backend))]
    Backend(#[from] BackendError),

    #[error(transparent)]
    #[diagnostic(code(drivehub::descriptor))]
    Extract(#[from] ExtractError),
}

impl DriveHubError {
    /// Whether the error means a path or drive does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            DriveHubError::Vfs(e) => e.is_not_found(),
            _ => false,
        }
    }
}
