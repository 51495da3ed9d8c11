//! Background side of status synchronization: answers status queries from
//! persisted storage, fans status updates out to every open tab of a site
//! and merges them into storage.
use std::collections::BTreeMap;
use std::sync::Arc;

use futures_util::future::{join, join_all};
use marker_core::{
    merge_post_ids, source_id_from_url, ArtistPostsSummary, CompanionRequest,
    FindPostsByArtistArgs, GetPostStatusArgs, Message, PostHost, PostId, Settings,
    SettingsChangedArgs, SourceHost, SourceId, StatusMap, StatusUpdate, UploadStatus,
};
use marker_logging::{marker_debug, marker_error, marker_info, marker_warn};
use serde_json::Value;

use crate::companion::CompanionClient;
use crate::ports::{CompanionPort, KeyValueStore, TabMessenger};
use crate::settings::SettingsManager;
use crate::tab_registry::TabRegistry;
use crate::{BackgroundError, StorageError, TabId};

/// Persisted layout: one object of source id -> post ids per site and board.
type StoredIds = BTreeMap<SourceId, Vec<PostId>>;

/// Collaborators of the background service.
pub struct SyncPorts {
    /// Persistent area for status data.
    pub local: Arc<dyn KeyValueStore>,
    /// Area cleared on browser restart, holds the tab registries.
    pub session: Arc<dyn KeyValueStore>,
    /// Area holding user settings.
    pub sync: Arc<dyn KeyValueStore>,
    pub tabs: Arc<dyn TabMessenger>,
    pub companion: Arc<dyn CompanionPort>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOutReport {
    pub delivered: Vec<TabId>,
    pub pruned: Vec<TabId>,
}

/// Both halves of publishing an update. Either may fail without the other.
#[derive(Debug)]
pub struct PublishReport {
    pub fan_out: Result<FanOutReport, StorageError>,
    /// Number of storage keys rewritten.
    pub persisted: Result<usize, StorageError>,
}

/// What a tab navigation did to the tab registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabChange {
    /// Not a source site, nothing to do.
    Ignored,
    Registered(SourceHost),
    /// Already registered; the content script was told to rescan.
    Notified(SourceHost),
}

pub struct StatusSync {
    local: Arc<dyn KeyValueStore>,
    tabs: TabRegistry,
    messenger: Arc<dyn TabMessenger>,
    companion: CompanionClient,
    settings: SettingsManager,
    companion_id: String,
}

impl StatusSync {
    pub fn new(ports: SyncPorts, companion_id: impl Into<String>) -> Self {
        Self {
            local: ports.local,
            tabs: TabRegistry::new(ports.session),
            messenger: ports.tabs,
            companion: CompanionClient::new(ports.companion),
            settings: SettingsManager::new(ports.sync),
            companion_id: companion_id.into(),
        }
    }

    pub fn status_key(source_host: SourceHost, host: PostHost) -> String {
        format!("{source_host}-{host}")
    }

    pub fn tab_registry(&self) -> &TabRegistry {
        &self.tabs
    }

    pub fn settings(&self) -> &SettingsManager {
        &self.settings
    }

    /// Dispatch a message from one of our own content scripts or pages.
    /// `Ok(None)` means the message has no answer.
    pub async fn handle_message(
        &self,
        message: Message,
        sender_tab: Option<TabId>,
    ) -> Result<Option<Value>, BackgroundError> {
        marker_debug!("{} from tab {sender_tab:?}", message.type_name());
        match message {
            Message::GetPostStatus(args) => {
                let status = self.get_post_status(&args).await?;
                to_answer(&status)
            }
            Message::StatusUpdate(update) => {
                self.publish_status_update(update).await;
                Ok(None)
            }
            Message::FindPostsByArtist(args) => {
                let summary = self.find_posts_by_artist(&args).await?;
                to_answer(&summary)
            }
            Message::SettingsChanged(_) => {
                self.broadcast_settings().await?;
                Ok(None)
            }
            Message::GetSettings => {
                let settings = self.settings.get_all().await?;
                to_answer(&settings)
            }
            Message::PrepareUpload(args) => {
                let answer = self
                    .companion
                    .forward(&CompanionRequest::PrepareUpload(args))
                    .await?;
                Ok(Some(answer))
            }
            Message::FocusTab(args) => {
                let answer = self
                    .companion
                    .forward(&CompanionRequest::FocusTab(args))
                    .await?;
                Ok(Some(answer))
            }
            Message::UrlChanged => Err(BackgroundError::BadRequest(
                "url-changed is sent to tabs, not to the background".into(),
            )),
        }
    }

    /// Messages from other extensions. Only the companion may push status updates.
    pub async fn handle_external(
        &self,
        extension_id: &str,
        message: Message,
    ) -> Result<Option<PublishReport>, BackgroundError> {
        if extension_id != self.companion_id {
            marker_warn!("ignoring {} from extension {extension_id}", message.type_name());
            return Err(BackgroundError::UnknownSender(extension_id.to_string()));
        }
        match message {
            Message::StatusUpdate(update) => Ok(Some(self.publish_status_update(update).await)),
            other => {
                marker_debug!("ignoring external {}", other.type_name());
                Ok(None)
            }
        }
    }

    /// Stored status for the requested ids. Ids never checked on a board
    /// have no entry for it.
    pub async fn get_post_status(&self, args: &GetPostStatusArgs) -> Result<StatusMap, StorageError> {
        let keys: Vec<String> = args
            .post_hosts
            .iter()
            .map(|host| Self::status_key(args.source_host, *host))
            .collect();
        let stored = self.local.get(&keys).await?;

        let mut status = StatusMap::new();
        for (host, key) in args.post_hosts.iter().zip(&keys) {
            let Some(ids) = read_stored(&stored, key)? else {
                continue;
            };
            for source_id in &args.source_ids {
                if let Some(post_ids) = ids.get(source_id) {
                    status
                        .entry(source_id.clone())
                        .or_default()
                        .insert(*host, post_ids.clone());
                }
            }
        }
        Ok(status)
    }

    /// Fan the update out to the site's tabs and merge it into storage,
    /// concurrently and independently.
    pub async fn publish_status_update(&self, update: StatusUpdate) -> PublishReport {
        let source_host = update.source_host;
        let message = Message::StatusUpdate(update.clone());
        let (fan_out, persisted) = join(
            self.fan_out(source_host, &message),
            self.persist_status(&update),
        )
        .await;

        if let Err(err) = &fan_out {
            marker_error!("fan-out to {source_host} tabs failed: {err}");
        }
        if let Err(err) = &persisted {
            marker_error!("persisting {source_host} status failed: {err}");
        }
        PublishReport { fan_out, persisted }
    }

    /// Send to every registered tab of the site; unreachable tabs are pruned
    /// in one rewrite once every send has settled.
    pub async fn fan_out(
        &self,
        source_host: SourceHost,
        message: &Message,
    ) -> Result<FanOutReport, StorageError> {
        let tabs = self.tabs.tabs(source_host).await?;
        let sends = tabs.iter().map(|&tab| async move {
            (tab, self.messenger.send(tab, message).await)
        });

        let mut report = FanOutReport::default();
        for (tab, result) in join_all(sends).await {
            match result {
                Ok(()) => report.delivered.push(tab),
                Err(err) => {
                    marker_debug!("tab {tab} unreachable: {err}");
                    report.pruned.push(tab);
                }
            }
        }
        if !report.pruned.is_empty() {
            self.tabs.prune(source_host, &report.pruned).await?;
        }
        Ok(report)
    }

    /// Union the update into storage, touching only the keys of boards it
    /// mentions and writing only keys whose content changed.
    pub async fn persist_status(&self, update: &StatusUpdate) -> Result<usize, StorageError> {
        let mut by_host: BTreeMap<PostHost, Vec<(&SourceId, &Vec<PostId>)>> = BTreeMap::new();
        for (source_id, status) in &update.source_id_to_post_ids {
            for (host, post_ids) in status {
                by_host.entry(*host).or_default().push((source_id, post_ids));
            }
        }
        if by_host.is_empty() {
            return Ok(0);
        }

        let keys: Vec<String> = by_host
            .keys()
            .map(|host| Self::status_key(update.source_host, *host))
            .collect();
        let stored = self.local.get(&keys).await?;

        let mut writes = BTreeMap::new();
        for ((_, entries), key) in by_host.into_iter().zip(keys) {
            let mut ids = read_stored(&stored, &key)?.unwrap_or_default();
            let mut changed = false;
            for (source_id, post_ids) in entries {
                match ids.get_mut(source_id) {
                    Some(existing) => changed |= merge_post_ids(existing, post_ids) > 0,
                    None => {
                        let mut fresh = Vec::with_capacity(post_ids.len());
                        merge_post_ids(&mut fresh, post_ids);
                        ids.insert(source_id.clone(), fresh);
                        changed = true;
                    }
                }
            }
            if changed {
                let value = serde_json::to_value(&ids)
                    .map_err(|source| StorageError::Malformed { key: key.clone(), source })?;
                writes.insert(key, value);
            }
        }

        let written = writes.len();
        if written > 0 {
            self.local.set(writes).await?;
        }
        Ok(written)
    }

    /// Look up every post of the artist behind `args.url` on the requested
    /// boards, publish what was found and summarize it.
    pub async fn find_posts_by_artist(
        &self,
        args: &FindPostsByArtistArgs,
    ) -> Result<ArtistPostsSummary, BackgroundError> {
        let artists = self.companion.query_artist_database(&args.url).await?;
        let names: Vec<String> = artists
            .into_iter()
            .filter(|artist| !artist.is_banned)
            .map(|artist| artist.name)
            .collect();

        let mut status = StatusMap::new();
        let mut num_posts: BTreeMap<PostHost, usize> =
            args.hosts.iter().map(|host| (*host, 0)).collect();

        for host in &args.hosts {
            for name in &names {
                let posts = self.companion.query_host(vec![name.clone()], *host).await?;
                for post in posts {
                    let Some(source_id) = source_id_from_url(args.source_host, &post.source) else {
                        continue;
                    };
                    let post_ids = status
                        .entry(source_id)
                        .or_insert_with(UploadStatus::new)
                        .entry(*host)
                        .or_default();
                    let added = merge_post_ids(post_ids, &[post.id.into_post_id()]);
                    *num_posts.entry(*host).or_default() += added;
                }
            }
        }

        let summary = ArtistPostsSummary {
            source_ids: status.keys().cloned().collect(),
            num_posts,
        };
        marker_info!(
            "found {} posts for {} artworks by {}",
            summary.total_posts(),
            summary.source_ids.len(),
            args.url
        );
        if !status.is_empty() {
            self.publish_status_update(StatusUpdate::new(args.source_host, status))
                .await;
        }
        Ok(summary)
    }

    /// Send the stored settings to every registered tab of every site.
    /// Delivery errors are ignored.
    pub async fn broadcast_settings(&self) -> Result<Settings, StorageError> {
        let settings = self.settings.get_all().await?;
        let message = Message::SettingsChanged(Some(SettingsChangedArgs {
            settings: settings.clone(),
        }));
        for source_host in SourceHost::ALL {
            let tabs = self.tabs.tabs(source_host).await?;
            let sends = tabs.iter().map(|&tab| self.messenger.send(tab, &message));
            for result in join_all(sends).await {
                if let Err(err) = result {
                    marker_debug!("settings not delivered: {err}");
                }
            }
        }
        Ok(settings)
    }

    /// A tab navigated. Tabs on a source site join that site's registry;
    /// already registered tabs are told to rescan their page.
    pub async fn on_tab_url_changed(&self, tab: TabId, url: &str) -> Result<TabChange, StorageError> {
        let Some(source_host) = SourceHost::from_url(url) else {
            return Ok(TabChange::Ignored);
        };
        if let Some(previous) = self.tabs.find(tab).await? {
            if previous == source_host {
                if let Err(err) = self.messenger.send(tab, &Message::UrlChanged).await {
                    marker_debug!("url-changed not delivered to tab {tab}: {err}");
                }
                return Ok(TabChange::Notified(source_host));
            }
            self.tabs.prune(previous, &[tab]).await?;
        }
        self.tabs.add(source_host, tab).await?;
        marker_debug!("registered tab {tab} for {source_host}");
        Ok(TabChange::Registered(source_host))
    }

    pub async fn on_tab_removed(&self, tab: TabId) -> Result<Option<SourceHost>, StorageError> {
        self.tabs.remove(tab).await
    }
}

fn read_stored(stored: &BTreeMap<String, Value>, key: &str) -> Result<Option<StoredIds>, StorageError> {
    stored
        .get(key)
        .map(|value| {
            serde_json::from_value(value.clone()).map_err(|source| StorageError::Malformed {
                key: key.to_string(),
                source,
            })
        })
        .transpose()
}

fn to_answer<T: serde::Serialize>(value: &T) -> Result<Option<Value>, BackgroundError> {
    Ok(Some(serde_json::to_value(value)?))
}
