use std::collections::BTreeMap;
use std::sync::Arc;

use marker_core::SourceHost;
use serde_json::Value;

use crate::ports::KeyValueStore;
use crate::{StorageError, TabId};

/// Open tabs per source site, kept in session storage.
#[derive(Clone)]
pub struct TabRegistry {
    store: Arc<dyn KeyValueStore>,
}

impl TabRegistry {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn storage_key(source_host: SourceHost) -> String {
        format!("{source_host}-tabs")
    }

    pub async fn tabs(&self, source_host: SourceHost) -> Result<Vec<TabId>, StorageError> {
        let key = Self::storage_key(source_host);
        let mut stored = self.store.get(std::slice::from_ref(&key)).await?;
        match stored.remove(&key) {
            Some(value) => {
                serde_json::from_value(value).map_err(|source| StorageError::Malformed { key, source })
            }
            None => Ok(Vec::new()),
        }
    }

    /// Returns `false` when the tab was already registered.
    pub async fn add(&self, source_host: SourceHost, tab: TabId) -> Result<bool, StorageError> {
        let mut tabs = self.tabs(source_host).await?;
        if tabs.contains(&tab) {
            return Ok(false);
        }
        tabs.push(tab);
        self.write(source_host, &tabs).await?;
        Ok(true)
    }

    /// The source site whose registry holds `tab`.
    pub async fn find(&self, tab: TabId) -> Result<Option<SourceHost>, StorageError> {
        for source_host in SourceHost::ALL {
            if self.tabs(source_host).await?.contains(&tab) {
                return Ok(Some(source_host));
            }
        }
        Ok(None)
    }

    /// Drop `tab` from whichever registry holds it.
    pub async fn remove(&self, tab: TabId) -> Result<Option<SourceHost>, StorageError> {
        let Some(source_host) = self.find(tab).await? else {
            return Ok(None);
        };
        self.prune(source_host, &[tab]).await?;
        Ok(Some(source_host))
    }

    /// Remove several tabs in one rewrite. Tabs registered since the caller
    /// last read the list are kept.
    pub async fn prune(&self, source_host: SourceHost, gone: &[TabId]) -> Result<(), StorageError> {
        let tabs = self.tabs(source_host).await?;
        let kept: Vec<TabId> = tabs.iter().copied().filter(|tab| !gone.contains(tab)).collect();
        if kept.len() != tabs.len() {
            self.write(source_host, &kept).await?;
        }
        Ok(())
    }

    async fn write(&self, source_host: SourceHost, tabs: &[TabId]) -> Result<(), StorageError> {
        let value = Value::from(tabs.to_vec());
        self.store
            .set(BTreeMap::from([(Self::storage_key(source_host), value)]))
            .await
    }
}
