//! Requests understood by the companion "upload" extension.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::PostHost;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "args", rename_all = "kebab-case")]
pub enum CompanionRequest {
    QueryHost { tags: Vec<String>, host: PostHost },
    QueryArtistDatabase { url: String },
    /// Forwarded verbatim.
    PrepareUpload(Value),
    /// Forwarded verbatim.
    FocusTab(Value),
}

impl CompanionRequest {
    pub fn type_name(&self) -> &'static str {
        match self {
            CompanionRequest::QueryHost { .. } => "query-host",
            CompanionRequest::QueryArtistDatabase { .. } => "query-artist-database",
            CompanionRequest::PrepareUpload(_) => "prepare-upload",
            CompanionRequest::FocusTab(_) => "focus-tab",
        }
    }
}

/// Post id as sent by the image boards, either a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawPostId {
    Number(u64),
    Text(String),
}

impl RawPostId {
    pub fn into_post_id(self) -> String {
        match self {
            RawPostId::Number(n) => n.to_string(),
            RawPostId::Text(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostPost {
    pub id: RawPostId,
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryHostResponse {
    #[serde(default)]
    pub posts: Vec<HostPost>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistEntry {
    pub name: String,
    #[serde(default)]
    pub is_banned: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArtistDatabaseResponse {
    #[serde(default)]
    pub artists: Vec<ArtistEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
