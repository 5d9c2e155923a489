//! Shared constants and small helpers used by the trash stores.

use crate::errors::{CoreError, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::time::Duration;

/// File extension used by trash info files.
pub const TRASHINFO_EXTENSION: &str = ".trashinfo";

/// Group holding the restore metadata inside a trash info file.
pub const TRASHINFO_GROUP: &str = "Trash Info";

/// Deletion date format commonly used by Trash info metadata.
pub const TRASHINFO_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Scheme of the uris handed out for trashed files.
pub const TRASH_URI_SCHEME: &str = "trash";

/// Subdirectory of a trash root holding the trashed entries.
pub const FILES_SUBDIR: &str = "files";

/// Subdirectory of a trash root holding the restore metadata.
pub const INFO_SUBDIR: &str = "info";

/// Interval in which trashes are checked for changes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5 * 1000);

/// Rejects anything that is not a bare name of a direct `files/` child.
pub fn ensure_basename(file: &str) -> Result<()> {
    if file.is_empty() || file == "." || file == ".." {
        return Err(CoreError::invalid_argument(format!(
            "`{file}' is not a trashed file name"
        )));
    }
    if file.contains('/') {
        return Err(CoreError::invalid_argument(format!(
            "`{file}' contains a path separator"
        )));
    }
    Ok(())
}

/// Parses an ISO-like deletion date string into a UTC datetime.
pub fn parse_trash_datetime(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, TRASHINFO_TIME_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.with_timezone(&Utc)))
}
