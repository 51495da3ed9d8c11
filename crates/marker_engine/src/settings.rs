use std::collections::BTreeMap;
use std::sync::Arc;

use marker_core::{SettingKey, Settings};
use marker_logging::marker_warn;
use serde_json::{Map, Value};

use crate::ports::KeyValueStore;
use crate::StorageError;

/// User settings stored one key per setting, `setting-` prefixed.
#[derive(Clone)]
pub struct SettingsManager {
    store: Arc<dyn KeyValueStore>,
}

impl SettingsManager {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn defaults() -> Settings {
        Settings::default()
    }

    /// Every setting, stored values over defaults. A stored value of the
    /// wrong shape is ignored in favour of its default.
    pub async fn get_all(&self) -> Result<Settings, StorageError> {
        let keys: Vec<String> = SettingKey::ALL.iter().map(|key| key.storage_key()).collect();
        let stored = self.store.get(&keys).await?;

        let defaults = serde_json::to_value(Settings::default())
            .map_err(|source| malformed("settings", source))?;
        let mut fields = match defaults {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };
        for key in SettingKey::ALL {
            if let Some(value) = stored.get(&key.storage_key()) {
                fields.insert(key.field_name().to_string(), value.clone());
            }
        }

        match serde_json::from_value(Value::Object(fields)) {
            Ok(settings) => Ok(settings),
            Err(err) => {
                marker_warn!("stored settings malformed ({err}), checking keys one by one");
                Ok(Self::salvage(&stored))
            }
        }
    }

    pub async fn get(&self, key: SettingKey) -> Result<Value, StorageError> {
        let settings = self.get_all().await?;
        let fields =
            serde_json::to_value(settings).map_err(|source| malformed("settings", source))?;
        Ok(fields.get(key.field_name()).cloned().unwrap_or(Value::Null))
    }

    /// Store one setting. The value must have the shape of that setting.
    pub async fn set(&self, key: SettingKey, value: Value) -> Result<(), StorageError> {
        let mut fields = Map::new();
        fields.insert(key.field_name().to_string(), value.clone());
        serde_json::from_value::<Settings>(Value::Object(fields))
            .map_err(|source| malformed(&key.storage_key(), source))?;
        self.store
            .set(BTreeMap::from([(key.storage_key(), value)]))
            .await
    }

    /// Store every setting at once.
    pub async fn set_all(&self, settings: &Settings) -> Result<(), StorageError> {
        let fields =
            serde_json::to_value(settings).map_err(|source| malformed("settings", source))?;
        let entries = SettingKey::ALL
            .iter()
            .filter_map(|key| {
                fields
                    .get(key.field_name())
                    .map(|value| (key.storage_key(), value.clone()))
            })
            .collect();
        self.store.set(entries).await
    }

    /// Forget a setting so it falls back to its default.
    pub async fn remove(&self, key: SettingKey) -> Result<(), StorageError> {
        self.store.remove(&[key.storage_key()]).await
    }

    fn salvage(stored: &BTreeMap<String, Value>) -> Settings {
        let mut fields = Map::new();
        for key in SettingKey::ALL {
            let Some(value) = stored.get(&key.storage_key()) else {
                continue;
            };
            let mut single = Map::new();
            single.insert(key.field_name().to_string(), value.clone());
            if serde_json::from_value::<Settings>(Value::Object(single)).is_ok() {
                fields.insert(key.field_name().to_string(), value.clone());
            }
        }
        serde_json::from_value(Value::Object(fields)).unwrap_or_default()
    }
}

fn malformed(key: &str, source: serde_json::Error) -> StorageError {
    StorageError::Malformed {
        key: key.to_string(),
        source,
    }
}
