//! A single trash root and its polled listing of `files/`.

use crate::errors::{CoreError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::helpers::{
    ensure_basename, DEFAULT_POLL_INTERVAL, FILES_SUBDIR, INFO_SUBDIR, TRASHINFO_EXTENSION,
    TRASHINFO_GROUP,
};
use crate::keyfile::KeyFile;
use crate::models::{ChangeMarker, TrashChange, TrashId, TrashInfo};
use crate::notify::{SubscriptionId, Subscribers};
use crate::uri::TrashUri;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// One trash root directory with a cached listing of its `files/` children.
///
/// The listing is refreshed by [`Trash::rescan`], which runs once on
/// construction and then periodically while a tokio runtime is available.
/// Dropping the trash cancels the periodic rescan.
pub struct Trash {
    shared: Arc<TrashShared>,
    poller: Option<Poller>,
}

struct Poller {
    cancellation: CancellationToken,
    task: JoinHandle<()>,
}

struct TrashShared {
    id: TrashId,
    root_directory: PathBuf,
    files_directory: PathBuf,
    info_directory: PathBuf,
    fs: Arc<dyn FileSystem>,
    // held for the whole rescan, notification delivery included
    last_marker: Mutex<Option<ChangeMarker>>,
    files: RwLock<Arc<[String]>>,
    subscribers: Subscribers<TrashChange>,
}

impl Trash {
    /// Opens the trash rooted at `root_directory` on the real filesystem,
    /// polling it every five seconds.
    pub fn new(id: TrashId, root_directory: impl Into<PathBuf>) -> Result<Self> {
        Self::with_filesystem(
            id,
            root_directory,
            Arc::new(RealFileSystem),
            Some(DEFAULT_POLL_INTERVAL),
        )
    }

    /// Opens a trash on `fs`. `None` or a zero interval disables polling.
    pub fn with_filesystem(
        id: TrashId,
        root_directory: impl Into<PathBuf>,
        fs: Arc<dyn FileSystem>,
        poll_interval: Option<Duration>,
    ) -> Result<Self> {
        let root_directory = root_directory.into();
        if !root_directory.is_absolute() {
            return Err(CoreError::invalid_argument(format!(
                "trash root {} is not an absolute path",
                root_directory.display()
            )));
        }

        let shared = Arc::new(TrashShared {
            id,
            files_directory: root_directory.join(FILES_SUBDIR),
            info_directory: root_directory.join(INFO_SUBDIR),
            root_directory,
            fs,
            last_marker: Mutex::new(None),
            files: RwLock::new(Arc::from(Vec::new())),
            subscribers: Subscribers::default(),
        });

        shared.rescan();

        let poller = match poll_interval.filter(|period| !period.is_zero()) {
            Some(period) => spawn_poller(&shared, period),
            None => None,
        };

        Ok(Self { shared, poller })
    }

    pub fn id(&self) -> TrashId {
        self.shared.id
    }

    pub fn root_directory(&self) -> &Path {
        &self.shared.root_directory
    }

    pub fn files_directory(&self) -> &Path {
        &self.shared.files_directory
    }

    pub fn info_directory(&self) -> &Path {
        &self.shared.info_directory
    }

    /// True while a periodic rescan is scheduled.
    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|poller| !poller.task.is_finished())
    }

    /// Snapshot of the trashed basenames as of the last rescan.
    ///
    /// Newly noticed entries come first in enumeration order, followed by the
    /// entries already known before that rescan in their previous order.
    pub fn files(&self) -> Arc<[String]> {
        self.shared.files()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.files().is_empty()
    }

    pub fn contains(&self, file: &str) -> bool {
        self.shared.files().iter().any(|name| name == file)
    }

    /// Re-reads `files/` unless its change marker is unchanged since the
    /// previous call. Returns true when the membership changed, in which
    /// case subscribers have been notified before this returns.
    pub fn rescan(&self) -> bool {
        self.shared.rescan()
    }

    /// Absolute path of the trashed entry `file`.
    pub fn path(&self, file: &str) -> Result<PathBuf> {
        ensure_basename(file)?;
        Ok(self.shared.files_directory.join(file))
    }

    /// `trash:///<id>-<file>` for the trashed entry `file`.
    pub fn uri(&self, file: &str) -> Result<TrashUri> {
        ensure_basename(file)?;
        Ok(TrashUri::for_entry(self.shared.id, file))
    }

    /// Location of the restore metadata record of `file`.
    pub fn info_path(&self, file: &str) -> Result<PathBuf> {
        ensure_basename(file)?;
        Ok(self
            .shared
            .info_directory
            .join(format!("{file}{TRASHINFO_EXTENSION}")))
    }

    /// Restore metadata of `file`.
    ///
    /// `None` when the record is missing, unreadable or lacks one of the
    /// `Path` and `DeletionDate` fields; a listed file without a record is
    /// an expected state.
    pub fn info(&self, file: &str) -> Option<TrashInfo> {
        let info_path = match self.info_path(file) {
            Ok(path) => path,
            Err(err) => {
                tracing::debug!("no trash info lookup for {:?}: {}", file, err);
                return None;
            }
        };

        let rc = match KeyFile::open(self.shared.fs.as_ref(), &info_path) {
            Ok(rc) => rc,
            Err(err) => {
                tracing::debug!("trash info for {:?} unavailable: {}", file, err);
                return None;
            }
        };

        let path = rc.get(TRASHINFO_GROUP, "Path")?;
        let date = rc.get(TRASHINFO_GROUP, "DeletionDate")?;
        TrashInfo::parse(path, date).ok()
    }

    /// Registers `callback` for membership changes of the listing.
    ///
    /// Callbacks run synchronously on the thread performing the rescan (a
    /// blocking worker for periodic rescans) and must not call
    /// [`Trash::rescan`] on the same trash.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&TrashChange) + Send + Sync + 'static,
    {
        self.shared.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.subscribers.unsubscribe(id)
    }
}

impl Drop for Trash {
    fn drop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.cancellation.cancel();
            poller.task.abort();
            tracing::debug!("stopped polling trash {}", self.shared.id);
        }
    }
}

impl fmt::Debug for Trash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trash")
            .field("id", &self.shared.id)
            .field("root_directory", &self.shared.root_directory)
            .field("files", &self.shared.files().len())
            .field("polling", &self.poller.is_some())
            .finish()
    }
}

impl TrashShared {
    fn files(&self) -> Arc<[String]> {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn rescan(&self) -> bool {
        let mut last_marker = self.last_marker.lock().unwrap_or_else(PoisonError::into_inner);

        let marker = self.fs.change_marker(&self.files_directory);
        if marker == *last_marker {
            tracing::trace!("trash {} unchanged since last scan", self.id);
            return false;
        }
        *last_marker = marker;

        let listing = match self.fs.list_names(&self.files_directory) {
            Ok(names) => names,
            Err(err) => {
                if marker.is_some() {
                    tracing::warn!("reading trash {} failed: {}", self.id, err);
                }
                Vec::new()
            }
        };

        let previous = self.files();
        let diff = diff_listing(&previous, listing);
        if diff.is_unchanged() {
            tracing::debug!("trash {} rescanned without membership change", self.id);
            return false;
        }

        let files: Arc<[String]> = Arc::from(diff.files);
        *self.files.write().unwrap_or_else(PoisonError::into_inner) = files.clone();

        tracing::debug!(
            "trash {} changed: {} added, {} removed, {} total",
            self.id,
            diff.added.len(),
            diff.removed.len(),
            files.len()
        );

        self.subscribers.emit(&TrashChange {
            trash: self.id,
            files,
            added: diff.added,
            removed: diff.removed,
        });

        true
    }
}

fn spawn_poller(shared: &Arc<TrashShared>, period: Duration) -> Option<Poller> {
    let handle = match tokio::runtime::Handle::try_current() {
        Ok(handle) => handle,
        Err(_) => {
            tracing::warn!(
                "no async runtime, trash {} is only refreshed on demand",
                shared.id
            );
            return None;
        }
    };

    let cancellation = CancellationToken::new();
    let token = cancellation.clone();
    let weak: Weak<TrashShared> = Arc::downgrade(shared);
    let id = shared.id;

    let task = handle.spawn(async move {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = interval.tick() => {
                    let Some(shared) = weak.upgrade() else {
                        break;
                    };
                    if let Err(err) = tokio::task::spawn_blocking(move || shared.rescan()).await {
                        tracing::warn!("rescan of trash {} failed: {}", id, err);
                    }
                }
            }
        }

        tracing::trace!("poller of trash {} finished", id);
    });

    tracing::debug!("polling trash {} every {:?}", id, period);
    Some(Poller { cancellation, task })
}

#[derive(Debug, Default, PartialEq, Eq)]
struct ListingDiff {
    files: Vec<String>,
    added: Vec<String>,
    removed: Vec<String>,
}

impl ListingDiff {
    fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Merges a fresh directory listing into the previously cached one.
fn diff_listing(previous: &[String], listing: Vec<String>) -> ListingDiff {
    let known: HashSet<&str> = previous.iter().map(String::as_str).collect();
    let mut present: HashSet<String> = HashSet::with_capacity(listing.len());
    let mut added = Vec::new();

    for name in listing {
        if name == "." || name == ".." || present.contains(&name) {
            continue;
        }
        if !known.contains(name.as_str()) {
            added.push(name.clone());
        }
        present.insert(name);
    }

    let mut files = added.clone();
    let mut removed = Vec::new();
    for name in previous {
        if present.contains(name) {
            files.push(name.clone());
        } else {
            removed.push(name.clone());
        }
    }

    ListingDiff {
        files,
        added,
        removed,
    }
}
