/*!
 * Completion Error Types
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::vfs::types::VfsError;

/// Completion wait result
pub type CompletionResult<T> = Result<T, CompletionError>;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Diagnostic)]
#[serde(rename_all = "snake_case", tag = "error")]
pub enum CompletionError {
    #[error("{label} may not have been copied: got 0 bytes, expected {target}")]
    #[diagnostic(
        code(completion::never_started),
        help("The backend never showed the target growing within the start budget.")
    )]
    NeverStarted { label: String, target: u64 },

    #[error("{label} stalled at {observed} bytes{}", describe_target(.target))]
    #[diagnostic(
        code(completion::stalled),
        help("No progress was observed across a whole retry window.")
    )]
    Stalled {
        label: String,
        observed: u64,
        target: Option<u64>,
    },

    #[error("could not observe {label}: {source}")]
    #[diagnostic(code(completion::probe))]
    Probe {
        label: String,
        #[source]
        source: VfsError,
    },
}

fn describe_target(target: &Option<u64>) -> String {
    match target {
        Some(target) => format!(", expected {}", target),
        None => String::new(),
    }
}

impl CompletionError {
    #[must_use]
    pub const fn is_never_started(&self) -> bool {
        matches!(self, CompletionError::NeverStarted { .. })
    }

    #[must_use]
    pub const fn is_stalled(&self) -> bool {
        matches!(self, CompletionError::Stalled { .. })
    }
}
