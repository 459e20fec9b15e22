/*!
 * Sleep Abstraction
 * Lets retry loops wait without tying them to wall-clock time
 */

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Blocks the calling thread between two polling attempts
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Real sleeper backed by `std::thread::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    #[inline]
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Sleeper that never blocks and records every requested delay
///
/// Used by tests to drive polling loops deterministically.
#[derive(Debug, Clone, Default)]
pub struct ManualSleeper {
    slept: Arc<Mutex<Vec<Duration>>>,
}

impl ManualSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sleeps requested so far
    pub fn count(&self) -> usize {
        self.slept.lock().len()
    }

    /// Sum of all requested delays
    pub fn total(&self) -> Duration {
        self.slept.lock().iter().sum()
    }

    pub fn history(&self) -> Vec<Duration> {
        self.slept.lock().clone()
    }
}

impl Sleeper for ManualSleeper {
    fn sleep(&self, duration: Duration) {
        self.slept.lock().push(duration);
    }
}

impl<S: Sleeper + ?Sized> Sleeper for Arc<S> {
    #[inline]
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

impl<S: Sleeper + ?Sized> Sleeper for &S {
    #[inline]
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}
