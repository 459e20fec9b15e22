/*!
 * Registry Configuration
 * Attach-probe timing and event queue sizing
 */

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::limits::{
    ATTACH_PROBE_DELAY, DEVICE_EVENT_QUEUE_CAPACITY, INITIAL_ATTACH_PROBE_DELAY,
    MAX_ATTACH_PROBES,
};

/// Device registry configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Delay before the first attach probe after an add notification
    pub initial_probe_delay: Duration,
    /// Delay between consecutive attach probes
    pub probe_delay: Duration,
    /// Probes after the first one before the attach is reported as failed
    pub probe_attempts: u32,
    /// Capacity of the reconciler's event queue
    pub event_queue_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            initial_probe_delay: INITIAL_ATTACH_PROBE_DELAY,
            probe_delay: ATTACH_PROBE_DELAY,
            probe_attempts: MAX_ATTACH_PROBES,
            event_queue_capacity: DEVICE_EVENT_QUEUE_CAPACITY,
        }
    }
}

impl RegistryConfig {
    /// No delays; for simulated hosts and tests
    pub fn fast() -> Self {
        Self {
            initial_probe_delay: Duration::ZERO,
            probe_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Defaults overridden by the environment
    ///
    /// Environment variables:
    /// - DRIVEHUB_PROBE_ATTEMPTS: attach probes before giving up
    /// - DRIVEHUB_PROBE_DELAY_MS: delay between attach probes
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(attempts) = env_parse::<u32>("DRIVEHUB_PROBE_ATTEMPTS") {
            config.probe_attempts = attempts;
        }
        if let Some(ms) = env_parse::<u64>("DRIVEHUB_PROBE_DELAY_MS") {
            config.probe_delay = Duration::from_millis(ms);
        }

        config
    }

    /// Worst-case time between an add notification and an attach failure
    pub fn attach_window(&self) -> Duration {
        self.initial_probe_delay + self.probe_delay * self.probe_attempts
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.trim().parse().ok()
}
