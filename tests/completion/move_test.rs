/*!
 * Move Completion Tests
 * `wait_for_move` from a drive folder into a local directory
 */

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use drivehub::core::{InlineExecutor, Sleeper};
use drivehub::devices::{DeviceRegistry, RegistryConfig};
use drivehub::{
    CompletionError, CompletionTracker, DriveType, FolderCompletionConfig, MemoryDrive,
    Resolver, SimulatedHost,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const CHUNK: usize = 100;

/// Simulated mover: writes one chunk per sleep, then deletes the source
struct Mover {
    destination: PathBuf,
    card: Arc<MemoryDrive>,
    chunks: usize,
    drains_source: bool,
    sleeps: AtomicUsize,
}

impl Sleeper for Mover {
    fn sleep(&self, _duration: Duration) {
        let n = self.sleeps.fetch_add(1, Ordering::SeqCst);
        if n < self.chunks {
            let part = self.destination.join(format!("part{}.bin", n));
            fs::write(part, vec![0u8; CHUNK]).unwrap();
        } else if self.drains_source {
            self.card.remove("DCIM").unwrap();
        }
    }
}

fn setup() -> (Arc<MemoryDrive>, Resolver) {
    let host = Arc::new(SimulatedHost::new());
    let card = host.add_volume(
        MemoryDrive::new("E:\\", DriveType::SdCard).with_label("CARD"),
        false,
    );
    card.add_file("DCIM\\Camera\\a.jpg", 300).unwrap();
    let (registry, _) = DeviceRegistry::builder(host)
        .with_executor(InlineExecutor)
        .with_config(RegistryConfig::fast())
        .build();
    (card, Resolver::new(registry))
}

#[test]
fn test_move_completes_once_source_is_gone() {
    let (card, resolver) = setup();
    let dest = TempDir::new().unwrap();
    let tracker = CompletionTracker::new().with_sleeper(Mover {
        destination: dest.path().to_path_buf(),
        card: card.clone(),
        chunks: 3,
        drains_source: true,
        sleeps: AtomicUsize::new(0),
    });

    let outcome = tracker
        .wait_for_move(&resolver, "E:\\DCIM", dest.path())
        .unwrap();
    assert_eq!(outcome.size, (3 * CHUNK) as u64);
    assert_eq!(outcome.round, 4);
    assert!(!resolver.exists("E:\\DCIM"));
    assert_eq!(fs::read_dir(dest.path()).unwrap().count(), 3);
}

#[test]
fn test_move_fails_while_source_lingers() {
    let (card, resolver) = setup();
    let dest = TempDir::new().unwrap();
    let config = FolderCompletionConfig::aggressive();
    let mover = Arc::new(Mover {
        destination: dest.path().to_path_buf(),
        card,
        chunks: 1,
        drains_source: false,
        sleeps: AtomicUsize::new(0),
    });
    let tracker = CompletionTracker::new()
        .with_folder_config(config)
        .with_sleeper(mover.clone());

    let err = tracker
        .wait_for_move(&resolver, "E:\\DCIM", dest.path())
        .unwrap_err();
    assert!(err.is_stalled());
    assert!(matches!(
        err,
        CompletionError::Stalled {
            observed: 100,
            target: None,
            ..
        }
    ));
    assert!(resolver.exists("E:\\DCIM"));
    // One sleep wrote the chunk, then every idle round used all its checks
    assert_eq!(
        mover.sleeps.load(Ordering::SeqCst),
        1 + (config.max_idle_rounds * config.stability_checks) as usize
    );
}

#[test]
fn test_move_into_missing_directory_counts_as_empty() {
    let (card, resolver) = setup();
    card.remove("DCIM").unwrap();
    let dest = TempDir::new().unwrap();
    let missing = dest.path().join("not-created");

    let tracker = CompletionTracker::new().with_sleeper(drivehub::ManualSleeper::new());
    let outcome = tracker
        .wait_for_move(&resolver, "E:\\DCIM", &missing)
        .unwrap();
    assert_eq!(outcome.size, 0);
    assert_eq!(outcome.round, 1);
}
