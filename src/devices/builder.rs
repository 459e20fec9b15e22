/*!
 * Device Registry Builder
 * Builder pattern for DeviceRegistry construction with best-effort startup
 */

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::backend::DriveSource;
use super::config::RegistryConfig;
use super::errors::{ExtractError, RegistryError};
use super::events::EventSource;
use super::identity::{IdentityMap, Observation};
use super::registry::DeviceRegistry;
use crate::core::clock::{Sleeper, ThreadSleeper};
use crate::core::deferred::{DelayedExecutor, ThreadExecutor};

/// Non-fatal problem found while constructing the registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InitWarning {
    #[error("ignored present {feed} device {descriptor}: {error}")]
    UnreadableDevice {
        feed: EventSource,
        descriptor: String,
        error: ExtractError,
    },

    #[error("present device {hardware_id} reports conflicting unique ids")]
    AmbiguousDevice { hardware_id: String },

    #[error("initial refresh failed: {0}")]
    Refresh(RegistryError),
}

/// Outcome of registry construction
///
/// The registry always exists; anything that went wrong on the way is
/// listed here instead of failing construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitReport {
    warnings: Vec<InitWarning>,
}

impl InitReport {
    pub fn warnings(&self) -> &[InitWarning] {
        &self.warnings
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    fn push(&mut self, warning: InitWarning) {
        warn!(warning = %warning, "Registry init warning");
        self.warnings.push(warning);
    }
}

/// Builder for DeviceRegistry
pub struct RegistryBuilder {
    source: Arc<dyn DriveSource>,
    executor: Option<Arc<dyn DelayedExecutor>>,
    sleeper: Option<Arc<dyn Sleeper>>,
    config: RegistryConfig,
    present: Vec<(EventSource, String)>,
}

impl RegistryBuilder {
    pub fn new(source: Arc<dyn DriveSource>) -> Self {
        Self {
            source,
            executor: None,
            sleeper: None,
            config: RegistryConfig::default(),
            present: Vec::new(),
        }
    }

    /// Facility that runs deferred attach probes (default: one thread per probe)
    pub fn with_executor<E: DelayedExecutor + 'static>(mut self, executor: E) -> Self {
        self.executor = Some(Arc::new(executor));
        self
    }

    /// Sleeper used between attach probes (default: real sleep)
    pub fn with_sleeper<S: Sleeper + 'static>(mut self, sleeper: S) -> Self {
        self.sleeper = Some(Arc::new(sleeper));
        self
    }

    pub fn with_config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    /// Seed the identity map with a device already attached at startup
    pub fn with_present_device(mut self, source: EventSource, descriptor: impl Into<String>) -> Self {
        self.present.push((source, descriptor.into()));
        self
    }

    pub fn with_present_devices<I, D>(mut self, devices: I) -> Self
    where
        I: IntoIterator<Item = (EventSource, D)>,
        D: Into<String>,
    {
        self.present
            .extend(devices.into_iter().map(|(source, d)| (source, d.into())));
        self
    }

    /// Build the registry and run the initial refresh
    ///
    /// Never fails: unreadable startup devices and enumeration errors end
    /// up in the returned report.
    pub fn build(self) -> (DeviceRegistry, InitReport) {
        let mut report = InitReport::default();
        let mut identities = IdentityMap::new();

        for (source, descriptor) in self.present {
            match source.extract(&descriptor) {
                Ok(device) => {
                    let observation = identities.observe(&device.hardware_id, &device.unique_id);
                    if observation == Observation::Invalidated {
                        report.push(InitWarning::AmbiguousDevice {
                            hardware_id: device.hardware_id.to_string(),
                        });
                    }
                }
                Err(error) => report.push(InitWarning::UnreadableDevice {
                    feed: source,
                    descriptor,
                    error,
                }),
            }
        }

        let registry = DeviceRegistry::from_parts(
            self.source,
            self.executor
                .unwrap_or_else(|| Arc::new(ThreadExecutor)),
            self.sleeper.unwrap_or_else(|| Arc::new(ThreadSleeper)),
            self.config,
            identities,
        );

        if let Err(e) = registry.refresh() {
            report.push(InitWarning::Refresh(e));
        }

        info!(
            drives = registry.len(),
            warnings = report.warnings.len(),
            "Device registry initialized"
        );

        (registry, report)
    }
}
