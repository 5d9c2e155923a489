//! Trash directory tracking for a file manager's virtual filesystem.
//!
//! A [`Trash`] keeps a polled listing of one trash root's `files/`
//! directory and reads restore metadata from `info/`. The shared
//! [`TrashManager`] owns every known trash, tracks whether all of them are
//! empty and maps `trash:///<id>-<name>/...` uris back to a trash.

pub mod config;
pub mod errors;
pub mod fs;
pub mod helpers;
pub mod keyfile;
pub mod manager;
pub mod models;
pub mod notify;
pub mod trash;
pub mod uri;

pub use config::TrashConfig;
pub use errors::{CoreError, Result};
pub use fs::{FileSystem, RealFileSystem};
#[cfg(any(test, feature = "test_utils"))]
pub use fs::MemoryFileSystem;
pub use helpers::{
    ensure_basename,
    parse_trash_datetime,
    DEFAULT_POLL_INTERVAL,
    TRASHINFO_EXTENSION,
    TRASHINFO_TIME_FORMAT,
    TRASH_URI_SCHEME,
};
pub use keyfile::KeyFile;
pub use manager::{ResolvedUri, TrashManager};
pub use models::{ChangeMarker, TrashChange, TrashId, TrashInfo};
pub use notify::{SubscriptionId, Subscribers};
pub use trash::Trash;
pub use uri::TrashUri;

/// Re-export a small stable API surface for consumers.
pub mod prelude {
    pub use crate::{
        config::TrashConfig,
        errors::{CoreError, Result},
        manager::{ResolvedUri, TrashManager},
        models::*,
        trash::Trash,
        uri::TrashUri,
    };
}
