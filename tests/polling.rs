use std::sync::{Arc, Mutex};
use std::time::Duration;
use trash_vfs::{MemoryFileSystem, Trash, TrashConfig, TrashId, TrashManager};

const FILES: &str = "/trash/files";

fn polled_trash(fs: &Arc<MemoryFileSystem>) -> Trash {
    Trash::with_filesystem(
        TrashId::HOME,
        "/trash",
        fs.clone(),
        Some(Duration::from_secs(5)),
    )
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn rescans_on_the_poll_interval() {
    let fs = Arc::new(MemoryFileSystem::new());
    let trash = polled_trash(&fs);
    assert!(trash.is_polling());

    fs.add_entry(FILES, "doc.txt");
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(!trash.contains("doc.txt"));

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(trash.contains("doc.txt"));

    fs.remove_entry(FILES, "doc.txt");
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(trash.is_empty());
}

#[tokio::test(start_paused = true)]
async fn dropping_a_trash_stops_its_poller() {
    let fs = Arc::new(MemoryFileSystem::new());
    let trash = polled_trash(&fs);
    assert_eq!(Arc::strong_count(&fs), 2);

    drop(trash);
    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(Arc::strong_count(&fs), 1);
}

#[tokio::test(start_paused = true)]
async fn manager_follows_polled_changes() {
    let fs = Arc::new(MemoryFileSystem::new());
    let config = TrashConfig::default()
        .with_home_trash("/trash")
        .with_poll_interval(Some(Duration::from_secs(5)));
    let manager = TrashManager::with_filesystem(config, fs.clone()).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    manager.subscribe_empty(move |empty: &bool| sink.lock().unwrap().push(*empty));

    fs.add_entry(FILES, "a");
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert!(!manager.is_empty());

    fs.remove_entry(FILES, "a");
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(manager.is_empty());

    assert_eq!(*seen.lock().unwrap(), vec![false, true]);
}

#[test]
fn without_a_runtime_no_poller_is_armed() {
    let fs = Arc::new(MemoryFileSystem::new());
    fs.add_entry(FILES, "doc.txt");
    let trash = polled_trash(&fs);

    assert!(!trash.is_polling());
    assert!(trash.contains("doc.txt"));
}
