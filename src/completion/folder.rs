/*!
 * Folder Convergence
 *
 * Infers completion of an asynchronous folder move from the destination's
 * recursive size and the source's existence. The mover deletes the source
 * once it is fully drained, so a round without growth succeeds as soon as
 * the source is gone. Any growth resets the no-growth counter.
 */

use tracing::{debug, warn};

use super::config::FolderCompletionConfig;
use super::errors::{CompletionError, CompletionResult};
use crate::core::clock::Sleeper;

/// How a folder wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FolderOutcome {
    /// Zero-based index of the round that saw the source disappear
    pub round: u32,
    /// Destination size measured in that round
    pub size: u64,
}

/// Wait until the source disappears after the destination stopped growing
///
/// `measure` returns the destination's current recursive size;
/// `source_exists` is only consulted on rounds without growth.
pub fn wait_for_folder<M, E, S>(
    label: &str,
    mut measure: M,
    mut source_exists: E,
    config: &FolderCompletionConfig,
    sleeper: &S,
) -> CompletionResult<FolderOutcome>
where
    M: FnMut() -> u64,
    E: FnMut() -> bool,
    S: Sleeper + ?Sized,
{
    let mut last: Option<u64> = None;
    let mut idle_rounds = 0u32;
    let mut round = 0u32;

    while idle_rounds < config.max_idle_rounds {
        let mut current = measure();
        let mut checks = 0;
        while checks < config.stability_checks && Some(current) == last {
            sleeper.sleep(config.poll_interval);
            current = measure();
            checks += 1;
        }

        if last.map_or(true, |last| current > last) {
            debug!(label, round, size = current, "Move still growing");
            last = Some(current);
            idle_rounds = 0;
        } else if !source_exists() {
            debug!(label, round, size = current, "Source drained, move complete");
            return Ok(FolderOutcome {
                round,
                size: current,
            });
        } else {
            idle_rounds += 1;
        }
        round += 1;
    }

    let observed = last.unwrap_or(0);
    warn!(label, observed, rounds = round, "Could not complete move");
    Err(CompletionError::Stalled {
        label: label.to_string(),
        observed,
        target: None,
    })
}
