use crate::models::TrashId;
use std::{io, path::PathBuf};

/// Error type shared by the trash store, the manager and the uri resolver.
#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    /// File system I/O failure.
    #[error("I/O error while accessing {0}")]
    Io(PathBuf, #[source] io::Error),

    /// A pre-condition on an argument failed (relative root, nested basename, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A trash uri whose path does not follow the `<id>-<name>` layout.
    #[error("unable to parse malformed trash URI `{0}'")]
    MalformedUri(String),

    /// A well formed trash uri referencing a trash that is not registered.
    #[error("invalid trash id {0}")]
    UnknownTrashId(TrashId),

    /// A uri that does not use the `trash` scheme.
    #[error("unsupported uri scheme in `{0}'")]
    UnsupportedScheme(String),

    /// A key/value record contains a line that is neither a group, an entry nor a comment.
    #[error("malformed record {path} at line {line}")]
    MalformedRecord { path: PathBuf, line: usize },

    /// A required input is missing.
    #[error("missing required value: {0}")]
    MissingValue(String),
}

impl CoreError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn missing(message: impl Into<String>) -> Self {
        Self::MissingValue(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, error: io::Error) -> Self {
        Self::Io(path.into(), error)
    }
}

/// Shared result alias for the crate.
pub type Result<T> = std::result::Result<T, CoreError>;
