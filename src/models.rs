use crate::errors::{CoreError, Result};
use crate::helpers::parse_trash_datetime;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Identifier of a trash, stable for the lifetime of its manager.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TrashId(pub u32);

impl TrashId {
    /// Id reserved for the user's home trash.
    pub const HOME: TrashId = TrashId(0);

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TrashId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque stamp of a directory used to skip rescans when nothing changed.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct ChangeMarker {
    secs: i64,
    nanos: i64,
}

impl ChangeMarker {
    pub fn new(secs: i64, nanos: i64) -> Self {
        Self { secs, nanos }
    }
}

/// Restore metadata of a trashed file.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct TrashInfo {
    original_path: String,
    deletion_date: String,
}

impl TrashInfo {
    /// Builds the record from its two fields; both must be non-empty.
    pub fn parse(original_path: impl Into<String>, deletion_date: impl Into<String>) -> Result<Self> {
        let original_path = original_path.into();
        let deletion_date = deletion_date.into();

        if original_path.is_empty() {
            return Err(CoreError::invalid_argument("trash info without original path"));
        }
        if deletion_date.is_empty() {
            return Err(CoreError::invalid_argument("trash info without deletion date"));
        }

        Ok(Self {
            original_path,
            deletion_date,
        })
    }

    /// The `Path` value exactly as recorded.
    pub fn original_path(&self) -> &str {
        &self.original_path
    }

    /// The `DeletionDate` value exactly as recorded.
    pub fn deletion_date(&self) -> &str {
        &self.deletion_date
    }

    /// The original path with percent escapes decoded. Falls back to the raw
    /// value when the escapes do not decode to UTF-8.
    pub fn decoded_original_path(&self) -> PathBuf {
        match urlencoding::decode(&self.original_path) {
            Ok(decoded) => PathBuf::from(decoded.into_owned()),
            Err(_) => PathBuf::from(&self.original_path),
        }
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        parse_trash_datetime(&self.deletion_date)
    }
}

/// Delivered to trash subscribers whenever the listing changes membership.
#[derive(Debug, Clone)]
pub struct TrashChange {
    pub trash: TrashId,
    /// Snapshot of the listing after the change.
    pub files: Arc<[String]>,
    pub added: Vec<String>,
    pub removed: Vec<String>,
}
