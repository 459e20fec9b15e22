/*!
 * Copy Completion Tests
 * `wait_for_copy` against a drive whose file grows while the tracker sleeps
 */

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use drivehub::core::{InlineExecutor, ManualSleeper, Sleeper};
use drivehub::devices::{DeviceRegistry, RegistryConfig};
use drivehub::{
    CompletionError, CompletionTracker, DriveType, MemoryDrive, Resolver, SimulatedHost, VfsError,
};
use pretty_assertions::assert_eq;

const TARGET: &str = "DCIM\\a.jpg";

/// Simulated asynchronous copy: every sleep lets the file grow by `step`
struct GrowingCopy {
    card: Arc<MemoryDrive>,
    step: u64,
    limit: u64,
    /// Sleeps that pass before the file first appears
    delay: usize,
    sleeps: AtomicUsize,
    size: AtomicU64,
}

impl GrowingCopy {
    fn new(card: Arc<MemoryDrive>, step: u64, limit: u64, delay: usize) -> Self {
        Self {
            card,
            step,
            limit,
            delay,
            sleeps: AtomicUsize::new(0),
            size: AtomicU64::new(0),
        }
    }
}

impl Sleeper for GrowingCopy {
    fn sleep(&self, _duration: Duration) {
        let n = self.sleeps.fetch_add(1, Ordering::SeqCst) + 1;
        if n < self.delay {
            return;
        }
        let next = (self.size.load(Ordering::SeqCst) + self.step).min(self.limit);
        self.size.store(next, Ordering::SeqCst);
        self.card.add_file(TARGET, next).unwrap();
    }
}

fn setup() -> (Arc<MemoryDrive>, Resolver) {
    let host = Arc::new(SimulatedHost::new());
    let card = host.add_volume(
        MemoryDrive::new("E:\\", DriveType::SdCard).with_unique_id("card-01"),
        false,
    );
    let (registry, _) = DeviceRegistry::builder(host)
        .with_executor(InlineExecutor)
        .with_config(RegistryConfig::fast())
        .build();
    (card, Resolver::new(registry))
}

#[test]
fn test_copy_converges() {
    let (card, resolver) = setup();
    let copy = Arc::new(GrowingCopy::new(card, 25, 100, 3));
    let tracker = CompletionTracker::new().with_sleeper(copy.clone());

    let size = tracker
        .wait_for_copy(&resolver, "{card-01}:\\DCIM\\a.jpg", 100)
        .unwrap();
    assert_eq!(size, 100);
    assert_eq!(copy.sleeps.load(Ordering::SeqCst), 6);
}

#[test]
fn test_copy_stalls_below_target() {
    let (card, resolver) = setup();
    let tracker =
        CompletionTracker::new().with_sleeper(GrowingCopy::new(card, 25, 60, 1));

    let err = tracker
        .wait_for_copy(&resolver, "E:\\DCIM\\a.jpg", 100)
        .unwrap_err();
    assert_eq!(
        err,
        CompletionError::Stalled {
            label: "E:\\DCIM\\a.jpg".into(),
            observed: 60,
            target: Some(100),
        }
    );
}

#[test]
fn test_copy_never_started() {
    let (_card, resolver) = setup();
    let sleeper = ManualSleeper::new();
    let tracker = CompletionTracker::new().with_sleeper(sleeper.clone());

    let err = tracker
        .wait_for_copy(&resolver, "E:\\DCIM\\a.jpg", 100)
        .unwrap_err();
    assert!(err.is_never_started());
    assert_eq!(
        sleeper.count(),
        tracker.file_config().start_attempts as usize
    );
}

#[test]
fn test_copy_to_unknown_drive_fails_fast() {
    let (_card, resolver) = setup();
    let sleeper = ManualSleeper::new();
    let tracker = CompletionTracker::new().with_sleeper(sleeper.clone());

    let err = tracker.wait_for_copy(&resolver, "Z:\\a.jpg", 10).unwrap_err();
    assert_eq!(
        err,
        CompletionError::Probe {
            label: "Z:\\a.jpg".into(),
            source: VfsError::DriveNotFound("Z:\\".into()),
        }
    );
    assert_eq!(sleeper.count(), 0);
}
