//! Message contract between content scripts, the background and the
//! companion "upload" extension. Every message carries a `type`
//! discriminator and an `args` payload.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{PostHost, Settings, SourceHost, SourceId, StatusUpdate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "args", rename_all = "kebab-case")]
pub enum Message {
    GetPostStatus(GetPostStatusArgs),
    StatusUpdate(StatusUpdate),
    FindPostsByArtist(FindPostsByArtistArgs),
    /// Without args when sent by the settings page, with the current
    /// settings when broadcast to tabs.
    SettingsChanged(Option<SettingsChangedArgs>),
    GetSettings,
    UrlChanged,
    /// Forwarded verbatim to the companion extension.
    PrepareUpload(Value),
    /// Forwarded verbatim to the companion extension.
    FocusTab(Value),
}

impl Message {
    pub fn type_name(&self) -> &'static str {
        match self {
            Message::GetPostStatus(_) => "get-post-status",
            Message::StatusUpdate(_) => "status-update",
            Message::FindPostsByArtist(_) => "find-posts-by-artist",
            Message::SettingsChanged(_) => "settings-changed",
            Message::GetSettings => "get-settings",
            Message::UrlChanged => "url-changed",
            Message::PrepareUpload(_) => "prepare-upload",
            Message::FocusTab(_) => "focus-tab",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPostStatusArgs {
    pub source_host: SourceHost,
    pub source_ids: Vec<SourceId>,
    pub post_hosts: Vec<PostHost>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindPostsByArtistArgs {
    pub source_host: SourceHost,
    pub url: String,
    pub hosts: Vec<PostHost>,
}

/// Answer to `find-posts-by-artist`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistPostsSummary {
    pub source_ids: Vec<SourceId>,
    pub num_posts: BTreeMap<PostHost, usize>,
}

impl ArtistPostsSummary {
    pub fn total_posts(&self) -> usize {
        self.num_posts.values().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsChangedArgs {
    pub settings: Settings,
}

/// Failure classes a requester can tell apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    /// The companion extension is not installed or disabled.
    CompanionUnreachable,
    /// The companion extension answered with an error.
    CompanionFailed,
    Storage,
    BadRequest,
    Internal,
}

/// Error answer to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub code: ErrorCode,
    pub message: String,
}
