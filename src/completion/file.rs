/*!
 * Single-File Convergence
 *
 * Infers completion of an asynchronous copy by watching the target's size.
 * Phase one waits (long budget) for the copy to show any size at all.
 * Phase two repeats short observation windows; a window that ends on the
 * same size as the previous one means the copy stalled.
 */

use tracing::{debug, warn};

use super::config::FileCompletionConfig;
use super::errors::{CompletionError, CompletionResult};
use crate::core::clock::Sleeper;

/// Wait until `probe` reports at least `target` bytes
///
/// `probe` returns `None` while the size cannot be read (e.g. the file does
/// not exist yet); the last readable size is kept in that case. Returns the
/// final observed size.
pub fn wait_for_file<P, S>(
    label: &str,
    target: u64,
    mut probe: P,
    config: &FileCompletionConfig,
    sleeper: &S,
) -> CompletionResult<u64>
where
    P: FnMut() -> Option<u64>,
    S: Sleeper + ?Sized,
{
    let mut last = observe(&mut probe, target, 0, config.start_attempts, config, sleeper);
    if last >= target {
        return Ok(last);
    }
    if last == 0 {
        warn!(label, target, "Copy never started");
        return Err(CompletionError::NeverStarted {
            label: label.to_string(),
            target,
        });
    }

    loop {
        let current = observe(&mut probe, target, last, config.progress_attempts, config, sleeper);
        if current >= target {
            return Ok(current);
        }
        if current == last {
            warn!(label, observed = current, target, "Copy stalled");
            return Err(CompletionError::Stalled {
                label: label.to_string(),
                observed: current,
                target: Some(target),
            });
        }
        debug!(label, observed = current, target, "Copy progressing");
        last = current;
    }
}

/// One observation window: up to `attempts` reads, stopping at the target
fn observe<P, S>(
    probe: &mut P,
    target: u64,
    initial: u64,
    attempts: u32,
    config: &FileCompletionConfig,
    sleeper: &S,
) -> u64
where
    P: FnMut() -> Option<u64>,
    S: Sleeper + ?Sized,
{
    let mut current = initial;
    for _ in 0..attempts {
        if let Some(size) = probe() {
            current = size;
        }
        if current >= target {
            break;
        }
        sleeper.sleep(config.poll_interval);
    }
    current
}
