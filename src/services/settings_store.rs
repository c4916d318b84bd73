// EdgeTabs Settings Store
// Keeps the user's preferences in memory and in durable storage under a single key.
// Loading merges the persisted object over the defaults field by field, so an older
// or partly invalid document still yields a complete settings value.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{error, warn};

use crate::storage::{store_json, KeyValueStorage};
use crate::types::errors::SettingsError;
use crate::types::settings::{SettingsPatch, UserSettings};

pub struct SettingsStore {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
    current: Mutex<UserSettings>,
}

impl SettingsStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>, key: &str) -> Self {
        Self {
            storage,
            key: key.to_string(),
            current: Mutex::new(UserSettings::default()),
        }
    }

    /// Current in-memory settings.
    pub fn get(&self) -> UserSettings {
        self.current.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn replace(&self, settings: UserSettings) {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = settings;
    }

    /// Loads persisted settings over the defaults. Never fails: a missing key or a storage
    /// error yields defaults.
    pub async fn load(&self) -> UserSettings {
        let loaded = match self.storage.get(&self.key).await {
            Ok(Some(saved)) => merge_with_defaults(saved),
            Ok(None) => UserSettings::default(),
            Err(e) => {
                error!(error = %e, "failed to load settings, using defaults");
                UserSettings::default()
            }
        };
        self.replace(loaded.clone());
        loaded
    }

    /// Applies a partial update and persists the result.
    ///
    /// The in-memory value is updated even if persisting fails; the error is returned so
    /// the caller can log it.
    pub async fn update(&self, patch: &SettingsPatch) -> Result<UserSettings, SettingsError> {
        if patch.fixed_tab_width == Some(0) {
            return Err(SettingsError::InvalidValue(
                "fixedTabWidth must be greater than zero".to_string(),
            ));
        }
        let next = self.get().merged(patch);
        self.replace(next.clone());
        store_json(self.storage.as_ref(), &self.key, &next).await?;
        Ok(next)
    }

    /// Restores and persists the defaults.
    pub async fn reset(&self) -> Result<UserSettings, SettingsError> {
        let defaults = UserSettings::default();
        self.replace(defaults.clone());
        store_json(self.storage.as_ref(), &self.key, &defaults).await?;
        Ok(defaults)
    }
}

/// Overlays each persisted field onto the defaults, skipping fields whose value does not
/// fit the current shape.
fn merge_with_defaults(saved: Value) -> UserSettings {
    let Value::Object(saved) = saved else {
        warn!("persisted settings are not an object, using defaults");
        return UserSettings::default();
    };
    let Ok(Value::Object(mut merged)) = serde_json::to_value(UserSettings::default()) else {
        return UserSettings::default();
    };

    for (key, value) in saved {
        if !merged.contains_key(&key) {
            continue;
        }
        let mut trial = merged.clone();
        trial.insert(key.clone(), value.clone());
        if serde_json::from_value::<UserSettings>(Value::Object(trial)).is_ok() {
            merged.insert(key, value);
        } else {
            warn!(key = %key, "ignoring invalid persisted setting");
        }
    }

    serde_json::from_value(Value::Object(merged)).unwrap_or_default()
}
