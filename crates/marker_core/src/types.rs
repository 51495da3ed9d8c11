use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of one artwork on a source site.
pub type SourceId = String;

/// Identifier of one post on an image board.
pub type PostId = String;

/// Known post ids per host. A missing host key means "not checked yet",
/// an empty list means "checked, nothing found".
pub type UploadStatus = BTreeMap<PostHost, Vec<PostId>>;

/// Upload status keyed by source id (or by downloaded filename).
pub type StatusMap = BTreeMap<String, UploadStatus>;

/// Posts keyed by host and post id, as delivered by the companion extension.
pub type PostsMap = BTreeMap<PostHost, BTreeMap<String, BooruPost>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostHost {
    Gelbooru,
    Danbooru,
}

impl PostHost {
    pub const ALL: [PostHost; 2] = [PostHost::Gelbooru, PostHost::Danbooru];

    pub fn as_str(self) -> &'static str {
        match self {
            PostHost::Gelbooru => "gelbooru",
            PostHost::Danbooru => "danbooru",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            PostHost::Gelbooru => "Gelbooru",
            PostHost::Danbooru => "Danbooru",
        }
    }

    /// Canonical link to a post on this host.
    pub fn post_url(self, post_id: &str) -> String {
        match self {
            PostHost::Gelbooru => {
                format!("https://gelbooru.com/index.php?page=post&s=view&id={post_id}")
            }
            PostHost::Danbooru => format!("https://danbooru.donmai.us/posts/{post_id}"),
        }
    }
}

impl fmt::Display for PostHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown host {0:?}")]
pub struct UnknownHost(pub String);

impl FromStr for PostHost {
    type Err = UnknownHost;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PostHost::ALL
            .into_iter()
            .find(|host| host.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownHost(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceHost {
    Pixiv,
    Nijie,
}

impl SourceHost {
    pub const ALL: [SourceHost; 2] = [SourceHost::Pixiv, SourceHost::Nijie];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceHost::Pixiv => "pixiv",
            SourceHost::Nijie => "nijie",
        }
    }

    pub fn from_hostname(hostname: &str) -> Option<SourceHost> {
        match hostname.to_ascii_lowercase().as_str() {
            "www.pixiv.net" | "pixiv.net" => Some(SourceHost::Pixiv),
            "nijie.info" | "www.nijie.info" => Some(SourceHost::Nijie),
            _ => None,
        }
    }

    /// Source site a page URL belongs to, if any.
    pub fn from_url(url: &str) -> Option<SourceHost> {
        let parsed = url::Url::parse(url).ok()?;
        SourceHost::from_hostname(parsed.host_str()?)
    }
}

impl fmt::Display for SourceHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceHost {
    type Err = UnknownHost;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceHost::ALL
            .into_iter()
            .find(|host| host.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownHost(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailSize {
    Small,
    #[default]
    Medium,
    Large,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BooruPost {
    pub id: u64,
    pub md5: String,
    pub source: String,
    pub thumbnail_url: String,
    pub score: i64,
    pub creation_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fav_count: Option<u64>,
}

/// Status information published by a tab, the background or the companion extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub source_host: SourceHost,
    pub source_id_to_post_ids: StatusMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename_to_post_ids: Option<StatusMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posts: Option<PostsMap>,
}

impl StatusUpdate {
    pub fn new(source_host: SourceHost, source_id_to_post_ids: StatusMap) -> Self {
        Self {
            source_host,
            source_id_to_post_ids,
            filename_to_post_ids: None,
            posts: None,
        }
    }

    /// Update carrying a single post for a single artwork.
    pub fn single(
        source_host: SourceHost,
        source_id: impl Into<SourceId>,
        host: PostHost,
        post_id: impl Into<PostId>,
    ) -> Self {
        let mut status = UploadStatus::new();
        status.insert(host, vec![post_id.into()]);
        let mut map = StatusMap::new();
        map.insert(source_id.into(), status);
        Self::new(source_host, map)
    }
}
