use std::sync::Arc;

use marker_core::{
    ArtistPostsSummary, FindPostsByArtistArgs, GetPostStatusArgs, Message, Settings, StatusMap,
    StatusUpdate,
};
use serde_json::Value;

use crate::ports::MessagePort;
use crate::TransportError;

/// Typed view of the messages a content script sends to the background.
#[derive(Clone)]
pub struct BackgroundClient {
    port: Arc<dyn MessagePort>,
}

impl BackgroundClient {
    pub fn new(port: Arc<dyn MessagePort>) -> Self {
        Self { port }
    }

    pub async fn get_post_status(&self, args: GetPostStatusArgs) -> Result<StatusMap, TransportError> {
        let value = self.port.request(Message::GetPostStatus(args)).await?;
        decode(value)
    }

    /// Fire-and-forget; the background fans the update out and persists it.
    pub async fn send_status_update(&self, update: StatusUpdate) -> Result<(), TransportError> {
        self.port.publish(Message::StatusUpdate(update)).await
    }

    pub async fn find_posts_by_artist(
        &self,
        args: FindPostsByArtistArgs,
    ) -> Result<ArtistPostsSummary, TransportError> {
        let value = self.port.request(Message::FindPostsByArtist(args)).await?;
        decode(value)
    }

    pub async fn get_settings(&self) -> Result<Settings, TransportError> {
        let value = self.port.request(Message::GetSettings).await?;
        decode(value)
    }

    /// Ask the background to rebroadcast the stored settings to every tab.
    pub async fn notify_settings_changed(&self) -> Result<(), TransportError> {
        self.port.publish(Message::SettingsChanged(None)).await
    }

    pub async fn prepare_upload(&self, args: Value) -> Result<Value, TransportError> {
        self.port.request(Message::PrepareUpload(args)).await
    }

    pub async fn focus_tab(&self, args: Value) -> Result<Value, TransportError> {
        self.port.request(Message::FocusTab(args)).await
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, TransportError> {
    serde_json::from_value(value).map_err(|err| TransportError::BadResponse(err.to_string()))
}
