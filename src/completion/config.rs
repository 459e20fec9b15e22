/*!
 * Completion Tracker Configuration
 * Polling intervals and retry budgets for convergence waits
 */

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::limits::{
    FILE_POLL_INTERVAL, FILE_PROGRESS_ATTEMPTS, FILE_START_ATTEMPTS, FOLDER_MAX_IDLE_ROUNDS,
    FOLDER_POLL_INTERVAL, FOLDER_STABILITY_CHECKS,
};

/// Single-file convergence settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCompletionConfig {
    /// Sleep between two observations below the target size
    pub poll_interval: Duration,
    /// Observations allowed before the copy must have shown any size
    pub start_attempts: u32,
    /// Observations per progress window once the copy has started
    pub progress_attempts: u32,
}

impl Default for FileCompletionConfig {
    fn default() -> Self {
        Self {
            poll_interval: FILE_POLL_INTERVAL,
            start_attempts: FILE_START_ATTEMPTS,
            progress_attempts: FILE_PROGRESS_ATTEMPTS,
        }
    }
}

impl FileCompletionConfig {
    /// Short budgets for fast local backends
    pub fn aggressive() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            start_attempts: 50,
            progress_attempts: 10,
        }
    }

    /// Long budgets for slow portable devices
    pub fn relaxed() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            start_attempts: 200,
            progress_attempts: 50,
        }
    }

    /// Longest wait before `NeverStarted` can be reported
    pub fn start_window(&self) -> Duration {
        self.poll_interval * self.start_attempts
    }
}

/// Folder convergence settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderCompletionConfig {
    /// Sleep between two measurements within a round
    pub poll_interval: Duration,
    /// Extra measurements taken while the size looks unchanged
    pub stability_checks: u32,
    /// No-growth rounds tolerated while the source still exists
    pub max_idle_rounds: u32,
}

impl Default for FolderCompletionConfig {
    fn default() -> Self {
        Self {
            poll_interval: FOLDER_POLL_INTERVAL,
            stability_checks: FOLDER_STABILITY_CHECKS,
            max_idle_rounds: FOLDER_MAX_IDLE_ROUNDS,
        }
    }
}

impl FolderCompletionConfig {
    pub fn aggressive() -> Self {
        Self {
            poll_interval: Duration::from_millis(20),
            stability_checks: 2,
            max_idle_rounds: 10,
        }
    }

    pub fn relaxed() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            stability_checks: 6,
            max_idle_rounds: 40,
        }
    }
}
