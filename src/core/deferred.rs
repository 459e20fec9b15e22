/*!
 * Delayed Execution
 * `schedule(action, delay)` facility used for deferred attach probes
 */

use std::time::Duration;
use tracing::warn;

/// Boxed unit of deferred work
pub type DeferredTask = Box<dyn FnOnce() + Send + 'static>;

/// Runs an action after a delay, off the caller's thread where possible
pub trait DelayedExecutor: Send + Sync {
    fn schedule(&self, task: DeferredTask, delay: Duration);
}

/// Spawns a short-lived named thread per task
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadExecutor;

impl DelayedExecutor for ThreadExecutor {
    fn schedule(&self, task: DeferredTask, delay: Duration) {
        let spawned = std::thread::Builder::new()
            .name("drivehub-deferred".into())
            .spawn(move || {
                if !delay.is_zero() {
                    std::thread::sleep(delay);
                }
                task();
            });

        if let Err(e) = spawned {
            warn!(error = %e, "Failed to spawn deferred task thread");
        }
    }
}

/// Runs deferred work on a tokio runtime
///
/// The delay is awaited on the runtime; the task itself runs on the blocking
/// pool since registry work performs synchronous backend enumeration.
#[derive(Debug, Clone)]
pub struct TokioExecutor {
    handle: tokio::runtime::Handle,
}

impl TokioExecutor {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Bind to the runtime of the calling context
    ///
    /// Returns `None` outside of a tokio runtime.
    pub fn current() -> Option<Self> {
        tokio::runtime::Handle::try_current().ok().map(Self::new)
    }
}

impl DelayedExecutor for TokioExecutor {
    fn schedule(&self, task: DeferredTask, delay: Duration) {
        self.handle.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if let Err(e) = tokio::task::spawn_blocking(task).await {
                warn!(error = %e, "Deferred task panicked");
            }
        });
    }
}

/// Runs the task immediately on the calling thread, ignoring the delay
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl DelayedExecutor for InlineExecutor {
    #[inline]
    fn schedule(&self, task: DeferredTask, _delay: Duration) {
        task();
    }
}
