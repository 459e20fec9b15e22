/*!
 * Identity Map
 * Hardware id (vendor/product pair) to stable unique id, with collision invalidation
 *
 * Once a mapping turns invalid it stays invalid: the ambiguity cannot be
 * settled from hardware ids alone.
 */

use ahash::HashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use super::errors::{RegistryError, RegistryResult};

/// Vendor/product pair in canonical form (`vid_04e8&pid_6860`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HardwareId(String);

impl HardwareId {
    /// Build from vendor and product codes (hex digits, any case)
    pub fn new(vendor: &str, product: &str) -> Self {
        Self(format!(
            "vid_{}&pid_{}",
            vendor.to_ascii_lowercase(),
            product.to_ascii_lowercase()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HardwareId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// State of one hardware id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mapping {
    Valid(String),
    Invalid,
}

/// Result of a single `observe` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// First time this hardware id was seen
    Recorded,
    /// Same hardware id, same unique id
    Unchanged,
    /// This observation made the mapping ambiguous
    Invalidated,
    /// The mapping was already ambiguous
    AlreadyInvalid,
}

/// Hardware id to stable id mapping
#[derive(Debug, Default)]
pub struct IdentityMap {
    mappings: HashMap<HardwareId, Mapping>,
    // unique id -> hardware id that first claimed it
    claims: HashMap<String, HardwareId>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `hardware_id` reported `unique_id`
    ///
    /// Idempotent for repeated identical observations. A different unique id
    /// for a known hardware id, or a unique id already claimed by another
    /// hardware id, invalidates the mappings involved.
    pub fn observe(&mut self, hardware_id: &HardwareId, unique_id: &str) -> Observation {
        let outcome = match self.mappings.get(hardware_id) {
            None => {
                self.mappings
                    .insert(hardware_id.clone(), Mapping::Valid(unique_id.to_string()));
                Observation::Recorded
            }
            Some(Mapping::Invalid) => return Observation::AlreadyInvalid,
            Some(Mapping::Valid(known)) if known == unique_id => Observation::Unchanged,
            Some(Mapping::Valid(known)) => {
                warn!(
                    hardware_id = %hardware_id,
                    known = %known,
                    reported = %unique_id,
                    "Hardware id reported a second unique id, ignoring it from now on"
                );
                self.mappings.insert(hardware_id.clone(), Mapping::Invalid);
                return Observation::Invalidated;
            }
        };

        match self.claims.get(unique_id) {
            None => {
                self.claims
                    .insert(unique_id.to_string(), hardware_id.clone());
                outcome
            }
            Some(owner) if owner == hardware_id => outcome,
            Some(owner) => {
                let owner = owner.clone();
                warn!(
                    unique_id = %unique_id,
                    first = %owner,
                    second = %hardware_id,
                    "Two hardware ids share one unique id, ignoring both"
                );
                self.mappings.insert(owner, Mapping::Invalid);
                self.mappings.insert(hardware_id.clone(), Mapping::Invalid);
                Observation::Invalidated
            }
        }
    }

    /// Stable id for a hardware id, if known and unambiguous
    pub fn stable_id(&self, hardware_id: &HardwareId) -> Option<&str> {
        match self.mappings.get(hardware_id) {
            Some(Mapping::Valid(id)) => Some(id.as_str()),
            _ => None,
        }
    }

    /// Like `stable_id` but distinguishes "unknown" from "ambiguous"
    pub fn resolve(&self, hardware_id: &HardwareId) -> RegistryResult<Option<&str>> {
        match self.mappings.get(hardware_id) {
            None => Ok(None),
            Some(Mapping::Valid(id)) => Ok(Some(id.as_str())),
            Some(Mapping::Invalid) => {
                debug!(hardware_id = %hardware_id, "Lookup of ambiguous hardware id");
                Err(RegistryError::AmbiguousIdentity(hardware_id.to_string()))
            }
        }
    }

    pub fn is_invalid(&self, hardware_id: &HardwareId) -> bool {
        matches!(self.mappings.get(hardware_id), Some(Mapping::Invalid))
    }

    pub fn mapping(&self, hardware_id: &HardwareId) -> Option<&Mapping> {
        self.mappings.get(hardware_id)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
