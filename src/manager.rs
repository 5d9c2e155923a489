//! Registry of the known trashes and resolution of trash uris.

use crate::config::TrashConfig;
use crate::errors::{CoreError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::models::{TrashChange, TrashId};
use crate::notify::{SubscriptionId, Subscribers};
use crate::trash::Trash;
use crate::uri::{parse_identifier, TrashUri};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

static DEFAULT_MANAGER: Mutex<Weak<TrashManager>> = Mutex::new(Weak::new());

/// Owns every known [`Trash`] and tracks whether all of them are empty.
///
/// The home trash is registered first and always gets [`TrashId::HOME`].
pub struct TrashManager {
    fs: Arc<dyn FileSystem>,
    poll_interval: Option<std::time::Duration>,
    trashes: RwLock<Vec<Arc<Trash>>>,
    next_id: Mutex<u32>,
    // last published value of the aggregate, not held while subscribers run
    empty: Mutex<bool>,
    subscribers: Subscribers<bool>,
}

/// A trash uri split into the trash it names and the location inside it.
#[derive(Debug, Clone)]
pub struct ResolvedUri {
    pub trash: Arc<Trash>,
    /// Basename of the trashed entry, a direct child of `files/`.
    pub name: String,
    /// Path below the trashed entry, empty when the uri names the entry itself.
    pub relative_path: String,
}

impl TrashManager {
    /// The manager shared by everything in the process.
    ///
    /// The first call builds it from [`TrashConfig::from_env`]; it is torn
    /// down, trashes included, once the last handle is dropped, and a later
    /// call starts over with fresh state.
    pub fn get_default() -> Result<Arc<Self>> {
        let mut slot = DEFAULT_MANAGER.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(manager) = slot.upgrade() {
            return Ok(manager);
        }

        let manager = Self::with_config(TrashConfig::from_env()?)?;
        *slot = Arc::downgrade(&manager);
        Ok(manager)
    }

    /// An independent manager on the real filesystem.
    pub fn with_config(config: TrashConfig) -> Result<Arc<Self>> {
        Self::with_filesystem(config, Arc::new(RealFileSystem))
    }

    pub fn with_filesystem(config: TrashConfig, fs: Arc<dyn FileSystem>) -> Result<Arc<Self>> {
        let home = config.home_trash_dir()?;
        if config.create_home_trash {
            if let Err(err) = fs.create_dir_all(&home) {
                tracing::warn!("creating home trash failed: {}", err);
            }
        }

        let manager = Arc::new(Self {
            fs,
            poll_interval: config.poll_interval,
            trashes: RwLock::new(Vec::new()),
            next_id: Mutex::new(TrashId::HOME.as_u32()),
            empty: Mutex::new(true),
            subscribers: Subscribers::default(),
        });

        manager.add_trash(home)?;
        tracing::info!("trash manager ready, home trash empty: {}", manager.is_empty());
        Ok(manager)
    }

    /// Registers another trash root under the next free id.
    pub fn add_trash(self: &Arc<Self>, root_directory: impl Into<PathBuf>) -> Result<Arc<Trash>> {
        let trash = {
            let mut next_id = self.next_id.lock().unwrap_or_else(PoisonError::into_inner);
            let trash = Arc::new(Trash::with_filesystem(
                TrashId(*next_id),
                root_directory,
                self.fs.clone(),
                self.poll_interval,
            )?);
            *next_id += 1;
            trash
        };

        let manager: Weak<TrashManager> = Arc::downgrade(self);
        trash.subscribe(move |_: &TrashChange| {
            if let Some(manager) = manager.upgrade() {
                manager.refresh_empty();
            }
        });

        self.trashes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(trash.clone());

        tracing::debug!(
            "registered trash {} at {}",
            trash.id(),
            trash.root_directory().display()
        );

        self.refresh_empty();
        Ok(trash)
    }

    /// True iff no registered trash holds any file.
    pub fn is_empty(&self) -> bool {
        self.trashes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .all(|trash| trash.is_empty())
    }

    /// Handles of all registered trashes, in registration order.
    pub fn trashes(&self) -> Vec<Arc<Trash>> {
        self.trashes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn trash(&self, id: TrashId) -> Option<Arc<Trash>> {
        self.trashes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|trash| trash.id() == id)
            .cloned()
    }

    /// Splits `trash:///<id>-<name>[/<relative>]` into the trash with that
    /// id, the entry name and the nested path.
    ///
    /// # Panics
    ///
    /// The root uri `trash:///` names no trash; passing it is a bug.
    pub fn resolve_identifier(&self, uri: &TrashUri) -> Result<ResolvedUri> {
        assert!(!uri.is_root(), "the trash root uri does not name a trash");

        let path = uri.path().strip_prefix('/').unwrap_or(uri.path());
        let ident = parse_identifier(path).ok_or_else(|| CoreError::MalformedUri(uri.to_string()))?;
        let trash = self
            .trash(ident.id)
            .ok_or(CoreError::UnknownTrashId(ident.id))?;

        Ok(ResolvedUri {
            trash,
            name: ident.name.to_string(),
            relative_path: ident.relative_path.to_string(),
        })
    }

    /// Registers `callback` for changes of [`TrashManager::is_empty`]; it
    /// receives the new value. Callbacks may register further trashes.
    pub fn subscribe_empty<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&bool) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    pub fn unsubscribe_empty(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    fn refresh_empty(&self) {
        let now = {
            let mut empty = self.empty.lock().unwrap_or_else(PoisonError::into_inner);
            let now = self.is_empty();
            if *empty == now {
                return;
            }
            *empty = now;
            now
        };

        tracing::debug!("trashes empty: {}", now);
        self.subscribers.emit(&now);
    }
}

impl Drop for TrashManager {
    fn drop(&mut self) {
        let trashes = self.trashes.get_mut().unwrap_or_else(PoisonError::into_inner);
        tracing::info!("releasing trash manager with {} trashes", trashes.len());
        trashes.clear();
    }
}

impl std::fmt::Debug for TrashManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrashManager")
            .field("trashes", &self.trashes())
            .finish()
    }
}
