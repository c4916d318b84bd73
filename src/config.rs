// EdgeTabs engine configuration
// Loaded from `config.json` in the data directory; every field has a default so
// a partial or missing file is fine.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::host::QueryScope;
use crate::types::errors::ConfigError;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "EDGETABS_DATA_DIR";

/// Tunables for the reconciliation engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Quiet period before a burst of update events triggers one resync.
    pub debounce_delay_ms: u64,
    /// Location opened by `TAB_NEW`.
    pub new_tab_url: String,
    pub query_scope: QueryScope,
    /// Storage key of the persisted tab snapshot.
    pub cached_tabs_key: String,
    /// Storage key of the persisted user settings.
    pub settings_key: String,
    pub prune_on_init: bool,
    /// Interval of the optional periodic full resync.
    pub resync_interval_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_delay_ms: 100,
            new_tab_url: "edge://newtab".to_string(),
            query_scope: QueryScope::AllWindows,
            cached_tabs_key: "cachedTabs".to_string(),
            settings_key: "userSettings".to_string(),
            prune_on_init: true,
            resync_interval_ms: None,
        }
    }
}

impl EngineConfig {
    /// Loads the config file. A missing file yields defaults; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse {}: {}", path.display(), e)))
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_delay_ms)
    }

    pub fn resync_interval(&self) -> Option<Duration> {
        self.resync_interval_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}

/// Data directory: `$EDGETABS_DATA_DIR`, else `$XDG_DATA_HOME/edgetabs`,
/// else `~/.local/share/edgetabs`.
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg).join("edgetabs");
    }
    let home = env::var("HOME").unwrap_or_else(|_| String::from("/tmp"));
    PathBuf::from(home).join(".local").join("share").join("edgetabs")
}

pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

pub fn database_path() -> PathBuf {
    data_dir().join("edgetabs.db")
}
