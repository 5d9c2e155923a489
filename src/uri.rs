//! The `trash:///<id>-<basename>[/<relative-path>]` addressing scheme.

use crate::errors::{CoreError, Result};
use crate::helpers::TRASH_URI_SCHEME;
use crate::models::TrashId;
use std::fmt;
use std::str::FromStr;

/// A uri of the trash scheme.
///
/// The path is kept unescaped and always starts with `/`; `Display`
/// percent-encodes every path segment and `parse` decodes them again.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct TrashUri {
    path: String,
}

impl TrashUri {
    /// Parses `trash://<path>`. Other schemes are rejected with
    /// [`CoreError::UnsupportedScheme`]; a non-empty authority, an escape
    /// that does not decode to UTF-8 or an escaped `/` with
    /// [`CoreError::MalformedUri`]. Query and fragment are dropped.
    pub fn parse(uri: &str) -> Result<Self> {
        let (scheme, rest) = uri
            .split_once("://")
            .ok_or_else(|| CoreError::MalformedUri(uri.to_string()))?;

        if !scheme.eq_ignore_ascii_case(TRASH_URI_SCHEME) {
            return Err(CoreError::UnsupportedScheme(uri.to_string()));
        }

        let rest = rest.split(['?', '#']).next().unwrap_or_default();
        match rest {
            "" => Ok(Self::root()),
            _ if rest.starts_with('/') => {
                let path = decode_path(rest).ok_or_else(|| CoreError::MalformedUri(uri.to_string()))?;
                Ok(Self { path })
            }
            _ => Err(CoreError::MalformedUri(uri.to_string())),
        }
    }

    /// `trash:///`, the virtual folder listing every trash.
    pub fn root() -> Self {
        Self {
            path: "/".to_string(),
        }
    }

    pub(crate) fn for_entry(id: TrashId, file: &str) -> Self {
        Self {
            path: format!("/{id}-{file}"),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_root(&self) -> bool {
        self.path == "/"
    }
}

impl fmt::Display for TrashUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", TRASH_URI_SCHEME)?;
        for (idx, segment) in self.path.split('/').enumerate() {
            if idx > 0 {
                f.write_str("/")?;
            }
            f.write_str(&urlencoding::encode(segment))?;
        }
        Ok(())
    }
}

fn decode_path(raw: &str) -> Option<String> {
    let mut path = String::with_capacity(raw.len());
    for (idx, segment) in raw.split('/').enumerate() {
        let decoded = urlencoding::decode(segment).ok()?;
        if decoded.contains('/') {
            return None;
        }
        if idx > 0 {
            path.push('/');
        }
        path.push_str(&decoded);
    }
    Some(path)
}

impl FromStr for TrashUri {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Components of a uri path below the trash root.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) struct Identifier<'a> {
    pub id: TrashId,
    pub name: &'a str,
    pub relative_path: &'a str,
}

/// Splits `<id>-<name>[/<relative>]`; `path` has its leading `/` stripped.
pub(crate) fn parse_identifier(path: &str) -> Option<Identifier<'_>> {
    let digits = path.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }

    let id = path[..digits].parse::<u32>().ok()?;
    let rest = path[digits..].strip_prefix('-')?;
    if rest.is_empty() || rest.starts_with('/') {
        return None;
    }

    let (name, relative_path) = rest.split_once('/').unwrap_or((rest, ""));
    Some(Identifier {
        id: TrashId(id),
        name,
        relative_path,
    })
}
