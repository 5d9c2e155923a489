use crate::errors::CoreError;
use crate::models::ChangeMarker;
use std::fs;
use std::io;
use std::path::Path;

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

/// Filesystem abstraction boundary for the trash stores.
///
/// Keeping this trait narrow makes it easy to write deterministic tests
/// against an in-memory tree, where change markers are under test control.
pub trait FileSystem: Send + Sync {
    /// Returns the change marker of a directory, or `None` when it cannot be stat'ed.
    fn change_marker(&self, path: &Path) -> Option<ChangeMarker>;

    /// Lists the names of the direct children of a directory.
    fn list_names(&self, path: &Path) -> crate::Result<Vec<String>>;

    /// Reads UTF-8 text.
    fn read_to_string(&self, path: &Path) -> crate::Result<String>;

    /// Creates a directory and all missing parent directories.
    fn create_dir_all(&self, path: &Path) -> crate::Result<()>;
}

/// Default filesystem implementation backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn change_marker(&self, path: &Path) -> Option<ChangeMarker> {
        let metadata = fs::metadata(path).ok()?;
        marker_of(&metadata)
    }

    fn list_names(&self, path: &Path) -> crate::Result<Vec<String>> {
        fs::read_dir(path)
            .map_err(|err| CoreError::io(path, err))?
            .map(|entry| {
                entry.map(|v| {
                    v.file_name().into_string().unwrap_or_else(|raw| {
                        let lossy = raw.to_string_lossy().into_owned();
                        tracing::warn!("non UTF-8 entry in {:?} listed as {:?}", path, lossy);
                        lossy
                    })
                })
            })
            .collect::<Result<Vec<String>, io::Error>>()
            .map_err(|err| CoreError::io(path, err))
    }

    fn read_to_string(&self, path: &Path) -> crate::Result<String> {
        fs::read_to_string(path).map_err(|err| CoreError::io(path, err))
    }

    fn create_dir_all(&self, path: &Path) -> crate::Result<()> {
        fs::create_dir_all(path).map_err(|err| CoreError::io(path, err))
    }
}

// The inode change time moves on every rename into or out of the directory,
// which is exactly what trashing and restoring do.
#[cfg(unix)]
fn marker_of(metadata: &fs::Metadata) -> Option<ChangeMarker> {
    Some(ChangeMarker::new(metadata.ctime(), metadata.ctime_nsec()))
}

#[cfg(not(unix))]
fn marker_of(metadata: &fs::Metadata) -> Option<ChangeMarker> {
    let modified = metadata.modified().ok()?;
    let since_epoch = modified.duration_since(std::time::UNIX_EPOCH).ok()?;
    Some(ChangeMarker::new(
        since_epoch.as_secs() as i64,
        since_epoch.subsec_nanos() as i64,
    ))
}

#[cfg(any(test, feature = "test_utils"))]
pub use memory::MemoryFileSystem;

#[cfg(any(test, feature = "test_utils"))]
mod memory {
    use super::FileSystem;
    use crate::errors::CoreError;
    use crate::models::ChangeMarker;
    use std::collections::HashMap;
    use std::io;
    use std::path::{Path, PathBuf};
    use std::sync::{Mutex, MutexGuard, PoisonError};

    /// In-memory backend. Every mutation of a directory stamps it with a fresh
    /// change marker unless the `_keeping_marker` variant is used.
    #[derive(Debug, Default)]
    pub struct MemoryFileSystem {
        state: Mutex<MemoryState>,
    }

    #[derive(Debug, Default)]
    struct MemoryState {
        generation: i64,
        dirs: HashMap<PathBuf, MemoryDir>,
        files: HashMap<PathBuf, String>,
    }

    #[derive(Debug)]
    struct MemoryDir {
        entries: Vec<String>,
        marker: ChangeMarker,
    }

    impl MemoryState {
        fn next_marker(&mut self) -> ChangeMarker {
            self.generation += 1;
            ChangeMarker::new(self.generation, 0)
        }

        fn dir_mut(&mut self, path: &Path) -> &mut MemoryDir {
            let marker = self.next_marker();
            self.dirs.entry(path.to_path_buf()).or_insert_with(|| MemoryDir {
                entries: Vec::new(),
                marker,
            })
        }
    }

    impl MemoryFileSystem {
        pub fn new() -> Self {
            Self::default()
        }

        fn state(&self) -> MutexGuard<'_, MemoryState> {
            self.state.lock().unwrap_or_else(PoisonError::into_inner)
        }

        pub fn create_dir(&self, dir: impl AsRef<Path>) {
            self.state().dir_mut(dir.as_ref());
        }

        pub fn remove_dir(&self, dir: impl AsRef<Path>) {
            self.state().dirs.remove(dir.as_ref());
        }

        /// Adds `name` to `dir` (creating the directory) and stamps a new marker.
        pub fn add_entry(&self, dir: impl AsRef<Path>, name: &str) {
            let mut state = self.state();
            let marker = state.next_marker();
            let entry = state.dir_mut(dir.as_ref());
            entry.entries.push(name.to_string());
            entry.marker = marker;
        }

        /// Adds `name` to `dir` without touching its marker.
        pub fn add_entry_keeping_marker(&self, dir: impl AsRef<Path>, name: &str) {
            self.state().dir_mut(dir.as_ref()).entries.push(name.to_string());
        }

        pub fn remove_entry(&self, dir: impl AsRef<Path>, name: &str) -> bool {
            let mut state = self.state();
            let marker = state.next_marker();
            let Some(entry) = state.dirs.get_mut(dir.as_ref()) else {
                return false;
            };
            let before = entry.entries.len();
            entry.entries.retain(|other| other != name);
            entry.marker = marker;
            entry.entries.len() != before
        }

        /// Stamps a new marker on `dir` without changing its entries.
        pub fn touch(&self, dir: impl AsRef<Path>) {
            let mut state = self.state();
            let marker = state.next_marker();
            if let Some(entry) = state.dirs.get_mut(dir.as_ref()) {
                entry.marker = marker;
            }
        }

        pub fn write_file(&self, path: impl AsRef<Path>, contents: &str) {
            self.state()
                .files
                .insert(path.as_ref().to_path_buf(), contents.to_string());
        }

        pub fn remove_file(&self, path: impl AsRef<Path>) {
            self.state().files.remove(path.as_ref());
        }
    }

    impl FileSystem for MemoryFileSystem {
        fn change_marker(&self, path: &Path) -> Option<ChangeMarker> {
            self.state().dirs.get(path).map(|dir| dir.marker)
        }

        fn list_names(&self, path: &Path) -> crate::Result<Vec<String>> {
            self.state()
                .dirs
                .get(path)
                .map(|dir| dir.entries.clone())
                .ok_or_else(|| CoreError::io(path, io::Error::from(io::ErrorKind::NotFound)))
        }

        fn read_to_string(&self, path: &Path) -> crate::Result<String> {
            self.state()
                .files
                .get(path)
                .cloned()
                .ok_or_else(|| CoreError::io(path, io::Error::from(io::ErrorKind::NotFound)))
        }

        fn create_dir_all(&self, path: &Path) -> crate::Result<()> {
            self.create_dir(path);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directory_has_no_marker() {
        let tmp = tempfile::tempdir().unwrap();
        let fs = RealFileSystem;
        assert!(fs.change_marker(&tmp.path().join("absent")).is_none());
        assert!(fs.change_marker(tmp.path()).is_some());
    }

    #[test]
    fn list_names_returns_direct_children_only() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.txt"), b"a").unwrap();
        std::fs::create_dir(tmp.path().join("dir")).unwrap();
        std::fs::write(tmp.path().join("dir").join("nested"), b"n").unwrap();

        let mut names = RealFileSystem.list_names(tmp.path()).unwrap();
        names.sort();
        assert_eq!(names, vec!["a.txt".to_string(), "dir".to_string()]);
    }

    #[test]
    fn list_names_of_missing_directory_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = RealFileSystem.list_names(&tmp.path().join("absent")).unwrap_err();
        assert!(matches!(err, CoreError::Io(..)));
    }

    #[test]
    fn memory_markers_move_on_every_mutation() {
        let fs = MemoryFileSystem::new();
        let dir = Path::new("/trash/files");
        assert!(fs.change_marker(dir).is_none());

        fs.create_dir(dir);
        let created = fs.change_marker(dir).unwrap();
        fs.add_entry(dir, "a");
        let added = fs.change_marker(dir).unwrap();
        assert_ne!(created, added);

        fs.add_entry_keeping_marker(dir, "b");
        assert_eq!(fs.change_marker(dir), Some(added));
        assert_eq!(fs.list_names(dir).unwrap(), vec!["a".to_string(), "b".to_string()]);

        fs.touch(dir);
        assert_ne!(fs.change_marker(dir), Some(added));
    }
}
