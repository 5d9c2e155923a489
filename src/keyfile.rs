//! Minimal reader for the `[Group]` / `key=value` records stored next to
//! trashed files.

use crate::errors::{CoreError, Result};
use crate::fs::FileSystem;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Group {
    name: String,
    entries: Vec<(String, String)>,
}

/// Parsed key/value record. Groups and entries keep their file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyFile {
    groups: Vec<Group>,
}

impl KeyFile {
    /// Reads and parses the record at `path`.
    pub fn open(fs: &dyn FileSystem, path: &Path) -> Result<Self> {
        let contents = fs.read_to_string(path)?;
        Self::parse(&contents).map_err(|line| CoreError::MalformedRecord {
            path: path.to_path_buf(),
            line,
        })
    }

    /// Parses record text; on failure returns the 1-based offending line.
    pub fn parse(contents: &str) -> std::result::Result<Self, usize> {
        // entries ahead of the first header land in an unnamed group
        let mut groups = vec![Group::default()];

        for (idx, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(header) = line.strip_prefix('[') {
                let name = header.strip_suffix(']').ok_or(idx + 1)?;
                groups.push(Group {
                    name: name.trim().to_string(),
                    entries: Vec::new(),
                });
                continue;
            }

            let (key, value) = line.split_once('=').ok_or(idx + 1)?;
            let key = key.trim();
            if key.is_empty() {
                return Err(idx + 1);
            }

            if let Some(group) = groups.last_mut() {
                group.entries.push((key.to_string(), value.trim().to_string()));
            }
        }

        Ok(Self { groups })
    }

    /// Entries of `group` in file order. Empty when the group is absent.
    pub fn entries<'a>(&'a self, group: &str) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        let group = group.to_string();
        self.groups
            .iter()
            .filter(move |g| g.name == group)
            .flat_map(|g| g.entries.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    /// Looks up `key` in `group`; a later duplicate overrides an earlier one.
    pub fn get(&self, group: &str, key: &str) -> Option<&str> {
        self.entries(group)
            .filter(|(k, _)| *k == key)
            .last()
            .map(|(_, v)| v)
    }
}
