//! Durable key/value storage used for the tab snapshot and user settings.
//!
//! Values are JSON documents. `set` overwrites (last writer wins); there is no
//! partial-write protocol because the engine is the only writer.
//!
//! # Usage
//!
//! ```no_run
//! use edgetabs::storage::{sqlite::SqliteStorage, MemoryStorage};
//!
//! // Persistent storage
//! let storage = SqliteStorage::open("edgetabs.db").expect("failed to open storage");
//!
//! // Or in memory for tests
//! let storage = MemoryStorage::new();
//! ```

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::types::errors::StorageError;

pub mod migrations;
pub mod sqlite;

/// Trait defining the durable storage interface.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;
}

/// Reads and decodes a typed value. A missing key yields `None`.
pub async fn load_json<T: DeserializeOwned>(
    storage: &dyn KeyValueStorage,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match storage.get(key).await? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| StorageError::Serialization(format!("{}: {}", key, e))),
        None => Ok(None),
    }
}

/// Encodes and writes a typed value.
pub async fn store_json<T: Serialize + ?Sized>(
    storage: &dyn KeyValueStorage,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let value = serde_json::to_value(value)
        .map_err(|e| StorageError::Serialization(format!("{}: {}", key, e)))?;
    storage.set(key, value).await
}

#[derive(Debug, Default)]
struct MemoryState {
    entries: HashMap<String, Value>,
    fail_reads: bool,
    fail_writes: bool,
    writes: usize,
}

/// In-memory storage with switchable failures, for tests and the bridge's scratch mode.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: Mutex<MemoryState>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MemoryState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.with_state(|s| s.fail_reads = fail);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.with_state(|s| s.fail_writes = fail);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.with_state(|s| s.writes)
    }

    /// Raw stored value, bypassing failure injection.
    pub fn peek(&self, key: &str) -> Option<Value> {
        self.with_state(|s| s.entries.get(key).cloned())
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        self.with_state(|s| {
            if s.fail_reads {
                return Err(StorageError::Unavailable("read refused".to_string()));
            }
            Ok(s.entries.get(key).cloned())
        })
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.with_state(|s| {
            if s.fail_writes {
                return Err(StorageError::Unavailable("write refused".to_string()));
            }
            s.entries.insert(key.to_string(), value);
            s.writes += 1;
            Ok(())
        })
    }
}
