use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info, warn};

use crate::transform::TransformOptions;

/// Default global hotkey
pub const DEFAULT_HOTKEY: &str = "ctrl+shift+u";

/// Flat key/value application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Master switch; when off, the hotkey only reports that uwuifier is disabled
    pub enabled: bool,
    /// Global hotkey binding, e.g. `ctrl+shift+u`
    pub hotkey: String,
    /// Insert emoticons after sentences
    pub smiley: bool,
    /// Replace "you" with "yu"
    pub yu: bool,
    /// Stutter the first letter of some words
    pub stutter: bool,
    /// Skip the r/l → w letter substitution
    pub nouwu: bool,
    /// Forward notifications to the desktop notification daemon
    pub desktop_notifications: bool,
    /// How long desktop notifications stay visible
    pub notification_duration_ms: u64,
    /// Log to `log_path` instead of stdout
    pub telemetry_enabled: bool,
    /// Log file location (`~` is expanded)
    pub log_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            hotkey: DEFAULT_HOTKEY.to_owned(),
            smiley: false,
            yu: false,
            stutter: false,
            nouwu: false,
            desktop_notifications: true,
            notification_duration_ms: 2500,
            telemetry_enabled: false,
            log_path: "~/.uwuifier/uwuifier.log".to_owned(),
        }
    }
}

impl Config {
    /// Parse config TOML, tolerating partially broken files
    ///
    /// A document that deserializes as a whole is used as-is (missing keys take
    /// their defaults). Otherwise every readable, well-typed key is merged over
    /// the defaults and the rest is dropped. Text that is not TOML at all yields
    /// the defaults.
    #[must_use]
    pub fn from_toml_str(contents: &str) -> Self {
        match toml::from_str::<Self>(contents) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "config did not parse cleanly, merging readable keys");
                let Ok(table) = contents.parse::<toml::Table>() else {
                    warn!("config is not valid TOML, using defaults");
                    return Self::default();
                };
                Self::merged_from_table(&table)
            }
        }
    }

    fn merged_from_table(table: &toml::Table) -> Self {
        let mut config = Self::default();
        merge_key(table, "enabled", &mut config.enabled);
        merge_key(table, "hotkey", &mut config.hotkey);
        merge_key(table, "smiley", &mut config.smiley);
        merge_key(table, "yu", &mut config.yu);
        merge_key(table, "stutter", &mut config.stutter);
        merge_key(table, "nouwu", &mut config.nouwu);
        merge_key(table, "desktop_notifications", &mut config.desktop_notifications);
        merge_key(
            table,
            "notification_duration_ms",
            &mut config.notification_duration_ms,
        );
        merge_key(table, "telemetry_enabled", &mut config.telemetry_enabled);
        merge_key(table, "log_path", &mut config.log_path);
        config
    }

    /// Current transform toggles
    #[must_use]
    pub const fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            smiley: self.smiley,
            yu: self.yu,
            stutter: self.stutter,
            nouwu: self.nouwu,
        }
    }

    /// Default config location: `~/.uwuifier.toml`
    ///
    /// # Errors
    /// Returns error if `HOME` is not set
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").context("HOME environment variable not set")?;
        Ok(PathBuf::from(home).join(".uwuifier.toml"))
    }

    /// Expand ~ in paths to home directory
    ///
    /// # Errors
    /// Returns error if the path starts with `~/` and `HOME` is not set
    pub fn expand_path(path: &str) -> Result<PathBuf> {
        if let Some(stripped) = path.strip_prefix("~/") {
            let home = std::env::var("HOME").context("HOME environment variable not set")?;
            Ok(PathBuf::from(home).join(stripped))
        } else {
            Ok(PathBuf::from(path))
        }
    }
}

fn merge_key<T: DeserializeOwned>(table: &toml::Table, key: &str, field: &mut T) {
    let Some(value) = table.get(key) else {
        return;
    };
    match value.clone().try_into::<T>() {
        Ok(parsed) => *field = parsed,
        Err(e) => warn!(key, error = %e, "ignoring unreadable config key"),
    }
}

/// Shared, persisted configuration
///
/// Readers take a fresh snapshot each time, so changes apply to the next
/// hotkey press without restarting anything. Every update is written back to
/// disk immediately.
#[derive(Debug)]
pub struct ConfigStore {
    path: Option<PathBuf>,
    config: RwLock<Config>,
}

impl ConfigStore {
    /// Load from `~/.uwuifier.toml`, creating it with defaults if missing
    ///
    /// # Errors
    /// Returns error if `HOME` is not set
    pub fn load_default() -> Result<Self> {
        Ok(Self::load(Config::config_path()?))
    }

    /// Load from `path`, falling back to defaults when the file is missing or unreadable
    #[must_use]
    pub fn load(path: PathBuf) -> Self {
        let config = if path.exists() {
            match fs::read_to_string(&path) {
                Ok(contents) => Config::from_toml_str(&contents),
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to read config, using defaults"
                    );
                    Config::default()
                }
            }
        } else {
            let config = Config::default();
            match write_config(&path, &config) {
                Ok(()) => info!(path = %path.display(), "created default config"),
                Err(e) => warn!(error = %e, "failed to create default config"),
            }
            config
        };

        Self {
            path: Some(path),
            config: RwLock::new(config),
        }
    }

    /// Store without a backing file
    #[must_use]
    pub fn in_memory(config: Config) -> Self {
        Self {
            path: None,
            config: RwLock::new(config),
        }
    }

    /// Backing file, if any
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Copy of the current configuration
    #[must_use]
    pub fn snapshot(&self) -> Config {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current transform toggles
    #[must_use]
    pub fn transform_options(&self) -> TransformOptions {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .transform_options()
    }

    /// Whether the uwuifier is switched on
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .enabled
    }

    /// Apply `change` and persist the result
    ///
    /// The in-memory change is kept even if writing the file fails.
    ///
    /// # Errors
    /// Returns error if the config file cannot be written
    pub fn update<F>(&self, change: F) -> Result<Config>
    where
        F: FnOnce(&mut Config),
    {
        let updated = {
            let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
            change(&mut config);
            config.clone()
        };

        if let Some(path) = &self.path {
            write_config(path, &updated)?;
            debug!(path = %path.display(), "config saved");
        }

        Ok(updated)
    }
}

fn write_config(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    fs::write(path, contents).context("failed to write config file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.enabled);
        assert_eq!(config.hotkey, "ctrl+shift+u");
        assert_eq!(config.transform_options(), TransformOptions::default());
    }

    #[test]
    fn test_parse_full_document() {
        let config = Config::from_toml_str(
            r#"
enabled = false
hotkey = "f12"
smiley = true
yu = true
stutter = false
nouwu = true
desktop_notifications = false
notification_duration_ms = 1000
telemetry_enabled = true
log_path = "/tmp/uwu.log"
"#,
        );
        assert!(!config.enabled);
        assert_eq!(config.hotkey, "f12");
        assert!(config.smiley);
        assert!(config.yu);
        assert!(!config.stutter);
        assert!(config.nouwu);
        assert!(!config.desktop_notifications);
        assert_eq!(config.notification_duration_ms, 1000);
        assert!(config.telemetry_enabled);
        assert_eq!(config.log_path, "/tmp/uwu.log");
    }

    #[test]
    fn test_missing_keys_take_defaults() {
        let config = Config::from_toml_str("smiley = true\n");
        assert!(config.smiley);
        assert!(config.enabled);
        assert_eq!(config.hotkey, DEFAULT_HOTKEY);
    }

    #[test]
    fn test_wrong_typed_key_is_dropped_others_merged() {
        let config = Config::from_toml_str(
            r#"
enabled = "yes please"
hotkey = "alt+u"
stutter = true
"#,
        );
        assert!(config.enabled, "bad key falls back to default");
        assert_eq!(config.hotkey, "alt+u");
        assert!(config.stutter);
    }

    #[test]
    fn test_garbage_yields_defaults() {
        let config = Config::from_toml_str("{{{ this is not toml");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let config = Config::from_toml_str("overlay_position = \"top-right\"\nyu = true\n");
        assert!(config.yu);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uwuifier.toml");

        let store = ConfigStore::load(path.clone());

        assert!(path.exists());
        assert_eq!(store.snapshot(), Config::default());
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(Config::from_toml_str(&written), Config::default());
    }

    #[test]
    fn test_update_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uwuifier.toml");
        let store = ConfigStore::load(path.clone());

        store
            .update(|config| {
                config.hotkey = "ctrl+alt+u".to_owned();
                config.smiley = true;
            })
            .unwrap();

        let reloaded = ConfigStore::load(path);
        assert_eq!(reloaded.snapshot().hotkey, "ctrl+alt+u");
        assert!(reloaded.transform_options().smiley);
    }

    #[test]
    fn test_update_visible_to_next_reader() {
        let store = ConfigStore::in_memory(Config::default());
        assert!(!store.transform_options().stutter);

        store.update(|config| config.stutter = true).unwrap();

        assert!(store.transform_options().stutter);
        assert!(store.path().is_none());
    }

    #[test]
    fn test_update_keeps_change_when_save_fails() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes the write fail
        let path = dir.path().join("occupied");
        fs::create_dir(&path).unwrap();
        let store = ConfigStore {
            path: Some(path),
            config: RwLock::new(Config::default()),
        };

        let result = store.update(|config| config.enabled = false);

        assert!(result.is_err());
        assert!(!store.is_enabled());
    }

    #[test]
    fn test_load_corrupt_file_merges_readable_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uwuifier.toml");
        fs::write(&path, "hotkey = \"f9\"\nsmiley = 3\n").unwrap();

        let store = ConfigStore::load(path);

        let config = store.snapshot();
        assert_eq!(config.hotkey, "f9");
        assert!(!config.smiley);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let home = std::env::var("HOME").expect("HOME not set");
        let result = Config::expand_path("~/.uwuifier/uwuifier.log").unwrap();
        assert_eq!(result, PathBuf::from(home).join(".uwuifier/uwuifier.log"));
    }

    #[test]
    fn test_expand_path_absolute() {
        let result = Config::expand_path("/var/log/uwu.log").unwrap();
        assert_eq!(result, PathBuf::from("/var/log/uwu.log"));
    }
}
