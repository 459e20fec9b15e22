/*!
 * Path Operation Tests
 * Resolver-level file and folder operations over local and in-memory drives
 */

use std::fs;
use std::sync::Arc;

use drivehub::core::{InlineExecutor, ManualSleeper};
use drivehub::devices::{
    BackendHandle, BackendResult, DeviceRegistry, DriveSource, RegistryConfig,
};
use drivehub::{DriveType, FileType, LocalDrive, MemoryDrive, Resolver, VfsError};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// Host exposing a fixed list of volumes and nothing portable
struct StaticHost {
    volumes: Vec<BackendHandle>,
}

impl DriveSource for StaticHost {
    fn fixed_drives(&self, _external_roots: &[String]) -> BackendResult<Vec<BackendHandle>> {
        Ok(self.volumes.clone())
    }

    fn classify_external(&self) -> BackendResult<Vec<String>> {
        Ok(Vec::new())
    }

    fn portable_drives(&self) -> BackendResult<Vec<BackendHandle>> {
        Ok(Vec::new())
    }
}

fn resolver(volumes: Vec<BackendHandle>) -> Resolver {
    let (registry, _) = DeviceRegistry::builder(Arc::new(StaticHost { volumes }))
        .with_executor(InlineExecutor)
        .with_sleeper(ManualSleeper::new())
        .with_config(RegistryConfig::fast())
        .build();
    Resolver::new(registry)
}

fn local_fixture() -> (TempDir, Resolver) {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("Music/Albums")).unwrap();
    fs::write(dir.path().join("Music/Albums/track.mp3"), vec![0u8; 300]).unwrap();
    fs::write(dir.path().join("Music/cover.jpg"), vec![0u8; 20]).unwrap();

    let drive = LocalDrive::new(dir.path(), "F:\\", DriveType::UsbStick)
        .with_label("STICK")
        .with_unique_id("stick-01");
    let handle: BackendHandle = Arc::new(drive);
    (dir, resolver(vec![handle]))
}

#[test]
fn test_local_file_and_folder_queries() {
    let (_dir, r) = local_fixture();

    let file = r.parse_file("F:\\Music\\Albums\\track.mp3").unwrap();
    assert_eq!(file.name, "track.mp3");
    assert_eq!(file.file_type, FileType::File);
    assert_eq!(file.size, 300);

    let folder = r.parse_folder("{stick-01}:\\Music").unwrap();
    assert!(folder.is_dir());
    assert_eq!(r.file_size("F:/Music/cover.jpg").unwrap(), 20);
    assert_eq!(r.folder_size("F:\\Music").unwrap(), 320);

    assert!(r.exists("F:\\Music\\cover.jpg"));
    assert!(r.exists("F:\\Music"));
    assert!(!r.exists("F:\\Video"));
    assert!(!r.exists("Q:\\Music"));
}

#[test]
fn test_local_kind_mismatches() {
    let (_dir, r) = local_fixture();
    assert!(matches!(
        r.parse_file("F:\\Music"),
        Err(VfsError::IsADirectory(_))
    ));
    assert!(matches!(
        r.parse_folder("F:\\Music\\cover.jpg"),
        Err(VfsError::NotADirectory(_))
    ));
    assert!(r.try_parse_file("F:\\Music\\missing.mp3").is_none());
    assert!(r.try_parse_folder("F:\\Music\\Albums").is_some());
    assert!(matches!(
        r.folder_size("F:\\Music\\cover.jpg"),
        Err(VfsError::NotADirectory(_))
    ));
}

#[test]
fn test_local_create_folder() {
    let (dir, r) = local_fixture();
    let drive = r.drive("F:\\").unwrap();
    assert_eq!(drive.children().unwrap().len(), 1);

    let created = r.create_folder("F:\\Backup\\2024").unwrap();
    assert!(created.is_dir());
    assert!(dir.path().join("Backup/2024").is_dir());

    // Idempotent
    r.create_folder("F:\\Backup\\2024").unwrap();
    // Nested creation does not touch the cached top-level listing
    assert!(drive.children_cached());

    r.create_folder("F:\\Podcasts").unwrap();
    assert!(!drive.children_cached());
    assert_eq!(drive.children().unwrap().len(), 3);
}

#[test]
fn test_readonly_local_drive() {
    let dir = TempDir::new().unwrap();
    let drive: BackendHandle =
        Arc::new(LocalDrive::new(dir.path(), "R:\\", DriveType::CdRom).readonly());
    let r = resolver(vec![drive]);

    assert!(matches!(
        r.create_folder("R:\\new"),
        Err(VfsError::PermissionDenied(_))
    ));
    assert!(!dir.path().join("new").exists());
}

#[test]
fn test_sub_path_is_forwarded_verbatim() {
    let card = MemoryDrive::new("E:\\", DriveType::SdCard).with_label("CARD");
    card.add_file("DCIM\\100ANDRO\\dsc_0001.jpg", 42).unwrap();
    let card: BackendHandle = Arc::new(card);
    let r = resolver(vec![card]);

    // The in-memory backend handles `..` and mixed separators itself
    let entry = r
        .parse_file("E:\\DCIM\\..\\DCIM/100ANDRO\\DSC_0001.JPG")
        .unwrap();
    assert_eq!(entry.size, 42);
    assert_eq!(entry.full_path, "E:\\DCIM\\100ANDRO\\dsc_0001.jpg");
    assert_eq!(r.parse_folder("E:\\").unwrap().name, "CARD");
}
