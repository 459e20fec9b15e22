/*!
 * Device Error Types
 * Registry, enumeration and descriptor extraction failures
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Registry operation result
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Backend enumeration result
pub type BackendResult<T> = Result<T, BackendError>;

/// Failure reported by an external drive backend while listing or classifying drives
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "error", content = "details")]
pub enum BackendError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Enumeration failed: {0}")]
    Failed(String),
}

/// Which enumeration path of `refresh()` failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumerationKind {
    /// Fixed/removable volumes, including the external-volume classifier
    Fixed,
    /// Shell-namespace portable devices
    Portable,
}

impl fmt::Display for EnumerationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EnumerationKind::Fixed => write!(f, "fixed"),
            EnumerationKind::Portable => write!(f, "portable"),
        }
    }
}

/// Device registry errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum RegistryError {
    #[error("error enumerating {kind} drives: {source}")]
    #[diagnostic(
        code(registry::enumeration),
        help("The backend failed while listing drives. The previous drive list is kept.")
    )]
    Enumeration {
        kind: EnumerationKind,
        #[source]
        source: BackendError,
    },

    #[error("hardware id {0} maps to more than one unique id")]
    #[diagnostic(
        code(registry::ambiguous_identity),
        help("Two devices report conflicting identities. Disconnect one of them.")
    )]
    AmbiguousIdentity(String),

    #[error("device {hardware_id} did not surface a drive after {attempts} probes")]
    #[diagnostic(
        code(registry::attach_timeout),
        help("The device was announced on the bus but the shell never listed it.")
    )]
    AttachTimeout { hardware_id: String, attempts: u32 },

    #[error("device event reconciler has shut down")]
    #[diagnostic(code(registry::shut_down))]
    ShutDown,
}

impl RegistryError {
    pub(crate) fn fixed(source: BackendError) -> Self {
        Self::Enumeration {
            kind: EnumerationKind::Fixed,
            source,
        }
    }

    pub(crate) fn portable(source: BackendError) -> Self {
        Self::Enumeration {
            kind: EnumerationKind::Portable,
            source,
        }
    }
}

/// Raw descriptor could not be turned into a hardware id / unique id pair
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("descriptor is missing {0}")]
    Missing(&'static str),

    #[error("malformed descriptor: {0}")]
    Malformed(String),

    #[error("device has no serial number: {0}")]
    NoSerial(String),
}
