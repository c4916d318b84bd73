use thiserror::Error;

use super::tab::TabId;

// === HostError ===

/// Errors reported by the tab-management host.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HostError {
    /// No tab with the given ID exists in the host.
    #[error("Tab not found: {0}")]
    TabNotFound(TabId),
    /// The tab exists but nothing in it listens for messages.
    #[error("No message receiver in tab: {0}")]
    NoReceiver(TabId),
    /// The host API could not be reached.
    #[error("Host unavailable: {0}")]
    Unavailable(String),
    /// The host refused the request.
    #[error("Host rejected request: {0}")]
    Rejected(String),
}

// === StorageError ===

/// Errors related to durable key/value storage.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StorageError {
    /// Database operation failed.
    #[error("Storage database error: {0}")]
    Database(String),
    /// Failed to serialize or deserialize a stored value.
    #[error("Storage serialization error: {0}")]
    Serialization(String),
    /// The storage backend is not reachable.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

// === EngineError ===

/// Errors surfaced by the reconciliation engine's entry points.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Host(#[from] HostError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    /// The engine has not completed initialization yet.
    #[error("Engine not initialized")]
    NotInitialized,
}

// === SettingsError ===

/// Errors related to user settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings storage error: {0}")]
    Storage(#[from] StorageError),
    /// The provided settings value is invalid.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}

// === ConfigError ===

/// Errors related to loading engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the config file.
    #[error("Config I/O error: {0}")]
    Io(String),
    /// Failed to parse the config file.
    #[error("Config parse error: {0}")]
    Parse(String),
}
