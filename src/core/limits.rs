/*!
 * System Limits and Constants
 *
 * Centralized location for retry budgets, delays and capacities.
 * Organized by subsystem.
 */

use std::time::Duration;

// =============================================================================
// DEVICE REGISTRY
// =============================================================================

/// Delay between the bus-level add notification and the first attach probe
pub const INITIAL_ATTACH_PROBE_DELAY: Duration = Duration::from_millis(50);

/// Delay between consecutive attach probes
pub const ATTACH_PROBE_DELAY: Duration = Duration::from_millis(100);

/// Attach probes after the first one before the attach is reported as failed
pub const MAX_ATTACH_PROBES: u32 = 10;

/// Capacity of the raw device event queue feeding the reconciler
pub const DEVICE_EVENT_QUEUE_CAPACITY: usize = 256;

/// Refreshes slower than this are logged as warnings
pub const SLOW_REFRESH_MS: u128 = 500;

// =============================================================================
// FILE COMPLETION
// =============================================================================

/// Interval between two size observations of a single file
pub const FILE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Observations allowed for a copy to show any size at all
pub const FILE_START_ATTEMPTS: u32 = 100;

/// Observations allowed per progress window once the copy has started
pub const FILE_PROGRESS_ATTEMPTS: u32 = 25;

// =============================================================================
// FOLDER COMPLETION
// =============================================================================

/// Interval between two recursive size measurements of a folder
pub const FOLDER_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Extra measurements taken in a round before it counts as "no growth"
pub const FOLDER_STABILITY_CHECKS: u32 = 4;

/// Consecutive no-growth rounds tolerated while the source still exists
pub const FOLDER_MAX_IDLE_ROUNDS: u32 = 20;

// =============================================================================
// NAMES
// =============================================================================

/// Characters removed from volume labels before they are used as friendly names
pub const FRIENDLY_NAME_FORBIDDEN_CHARS: &str = "~#%&*{}\\:<>?/+|\"";
