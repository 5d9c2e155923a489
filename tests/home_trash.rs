use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use trash_vfs::{RealFileSystem, Trash, TrashConfig, TrashId, TrashManager, TrashUri};

struct Fixture {
    _tmp: tempfile::TempDir,
    root: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join(".local/share/Trash");
        fs::create_dir_all(root.join("files")).unwrap();
        fs::create_dir_all(root.join("info")).unwrap();
        Self { _tmp: tmp, root }
    }

    fn trash_file(&self, name: &str, original: &str) {
        fs::write(self.root.join("files").join(name), b"content").unwrap();
        fs::write(
            self.root.join("info").join(format!("{name}.trashinfo")),
            format!("[Trash Info]\nPath={original}\nDeletionDate=2024-01-01T10:00:00\n"),
        )
        .unwrap();
    }

    fn trash(&self) -> Trash {
        Trash::with_filesystem(TrashId::HOME, &self.root, Arc::new(RealFileSystem), None).unwrap()
    }

    fn manager(&self) -> Arc<TrashManager> {
        let config = TrashConfig::default()
            .with_home_trash(&self.root)
            .with_poll_interval(None);
        TrashManager::with_config(config).unwrap()
    }
}

// directory timestamps are coarse, leave room for the next change to show
fn settle() {
    std::thread::sleep(Duration::from_millis(50));
}

#[test]
fn lists_and_addresses_trashed_files() {
    let fixture = Fixture::new();
    fixture.trash_file("doc.txt", "/home/u/doc.txt");

    let trash = fixture.trash();
    assert_eq!(&*trash.files(), &["doc.txt".to_string()][..]);
    assert_eq!(
        trash.path("doc.txt").unwrap(),
        fixture.root.join("files").join("doc.txt")
    );
    assert_eq!(trash.uri("doc.txt").unwrap().to_string(), "trash:///0-doc.txt");
}

#[test]
fn reads_restore_metadata_until_it_is_deleted() {
    let fixture = Fixture::new();
    fixture.trash_file("doc.txt", "/home/u/doc.txt");
    let trash = fixture.trash();

    let info = trash.info("doc.txt").unwrap();
    assert_eq!(info.original_path(), "/home/u/doc.txt");
    assert_eq!(info.deletion_date(), "2024-01-01T10:00:00");

    fs::remove_file(fixture.root.join("info").join("doc.txt.trashinfo")).unwrap();
    assert!(trash.info("doc.txt").is_none());

    trash.rescan();
    assert!(trash.contains("doc.txt"));
}

#[test]
fn rescan_follows_the_files_directory() {
    let fixture = Fixture::new();
    fixture.trash_file("a", "/home/u/a");
    let trash = fixture.trash();

    settle();
    fixture.trash_file("b", "/home/u/b");
    fs::remove_file(fixture.root.join("files").join("a")).unwrap();
    assert!(trash.rescan());

    let files: Vec<_> = trash.files().to_vec();
    assert_eq!(files, vec!["b".to_string()]);

    // nothing happened since the last scan
    assert!(!trash.rescan());

    settle();
    fs::remove_dir_all(fixture.root.join("files")).unwrap();
    assert!(trash.rescan());
    assert!(trash.is_empty());
}

#[test]
fn missing_trash_root_is_empty() {
    let tmp = tempfile::tempdir().unwrap();
    let trash = Trash::with_filesystem(
        TrashId::HOME,
        tmp.path().join("nowhere"),
        Arc::new(RealFileSystem),
        None,
    )
    .unwrap();

    assert!(trash.is_empty());
    assert!(trash.info("doc.txt").is_none());
}

#[test]
fn manager_creates_the_home_trash() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("share").join("Trash");
    let config = TrashConfig::default()
        .with_home_trash(&root)
        .with_poll_interval(None);

    let manager = TrashManager::with_config(config).unwrap();
    assert!(Path::new(&root).is_dir());
    assert!(manager.is_empty());
}

#[test]
fn uris_round_trip_through_the_manager() {
    let fixture = Fixture::new();
    fixture.trash_file("doc.txt", "/home/u/doc.txt");
    let manager = fixture.manager();
    assert!(!manager.is_empty());

    let home = manager.trash(TrashId::HOME).unwrap();
    let uri = home.uri("doc.txt").unwrap();

    let resolved = manager.resolve_identifier(&uri).unwrap();
    assert!(Arc::ptr_eq(&resolved.trash, &home));
    assert_eq!(resolved.name, "doc.txt");
    assert_eq!(resolved.relative_path, "");

    let reparsed: TrashUri = uri.to_string().parse().unwrap();
    assert_eq!(reparsed, uri);
}

#[test]
fn escaped_uris_resolve_to_raw_names() {
    let fixture = Fixture::new();
    fixture.trash_file("my doc#1.txt", "/home/u/my%20doc%231.txt");
    let manager = fixture.manager();

    let home = manager.trash(TrashId::HOME).unwrap();
    let uri = home.uri("my doc#1.txt").unwrap();
    assert_eq!(uri.to_string(), "trash:///0-my%20doc%231.txt");

    let parsed: TrashUri = "trash:///0-my%20doc%231.txt/sub%20dir".parse().unwrap();
    let resolved = manager.resolve_identifier(&parsed).unwrap();
    assert_eq!(resolved.name, "my doc#1.txt");
    assert_eq!(resolved.relative_path, "sub dir");
    assert!(home.contains(&resolved.name));
}
