use crate::errors::{CoreError, Result};
use crate::helpers::DEFAULT_POLL_INTERVAL;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Overrides the location of the home trash.
pub const HOME_TRASH_ENV: &str = "TRASH_VFS_HOME_TRASH";

/// Poll interval in milliseconds, `0` disables polling.
pub const POLL_INTERVAL_ENV: &str = "TRASH_VFS_POLL_INTERVAL_MS";

/// Settings of a trash manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrashConfig {
    /// Root of the home trash; `None` selects `$XDG_DATA_HOME/Trash`.
    pub home_trash: Option<PathBuf>,
    /// Interval of the periodic rescans; `None` disables them.
    pub poll_interval: Option<Duration>,
    /// Create the home trash directory when it does not exist yet.
    pub create_home_trash: bool,
}

impl Default for TrashConfig {
    fn default() -> Self {
        Self {
            home_trash: None,
            poll_interval: Some(DEFAULT_POLL_INTERVAL),
            create_home_trash: true,
        }
    }
}

impl TrashConfig {
    /// Defaults overlaid with the `TRASH_VFS_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup(HOME_TRASH_ENV).filter(|v| !v.is_empty()) {
            let path = PathBuf::from(value);
            if !path.is_absolute() {
                return Err(CoreError::invalid_argument(format!(
                    "{HOME_TRASH_ENV} must be an absolute path, got {}",
                    path.display()
                )));
            }
            config.home_trash = Some(path);
        }

        if let Some(value) = lookup(POLL_INTERVAL_ENV) {
            let millis: u64 = value.trim().parse().map_err(|_| {
                CoreError::invalid_argument(format!(
                    "{POLL_INTERVAL_ENV} must be a number of milliseconds, got `{value}'"
                ))
            })?;
            config.poll_interval = (millis > 0).then(|| Duration::from_millis(millis));
        }

        Ok(config)
    }

    pub fn with_home_trash(mut self, path: impl Into<PathBuf>) -> Self {
        self.home_trash = Some(path.into());
        self
    }

    pub fn with_poll_interval(mut self, interval: Option<Duration>) -> Self {
        self.poll_interval = interval;
        self
    }

    /// The effective home trash root.
    pub fn home_trash_dir(&self) -> Result<PathBuf> {
        match &self.home_trash {
            Some(path) => Ok(path.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join("Trash"))
                .ok_or_else(|| CoreError::missing("user data directory for the home trash")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_poll_every_five_seconds() {
        let config = TrashConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, TrashConfig::default());
        assert_eq!(config.poll_interval, Some(Duration::from_millis(5000)));
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = TrashConfig::from_lookup(lookup(&[
            (HOME_TRASH_ENV, "/srv/trash"),
            (POLL_INTERVAL_ENV, "250"),
        ]))
        .unwrap();
        assert_eq!(config.home_trash_dir().unwrap(), PathBuf::from("/srv/trash"));
        assert_eq!(config.poll_interval, Some(Duration::from_millis(250)));

        let config = TrashConfig::from_lookup(lookup(&[(POLL_INTERVAL_ENV, "0")])).unwrap();
        assert_eq!(config.poll_interval, None);
    }

    #[test]
    fn invalid_environment_is_rejected() {
        assert!(TrashConfig::from_lookup(lookup(&[(HOME_TRASH_ENV, "rel/trash")])).is_err());
        assert!(TrashConfig::from_lookup(lookup(&[(POLL_INTERVAL_ENV, "soon")])).is_err());
    }
}
