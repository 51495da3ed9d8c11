use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::PostHost;

/// Host preselected by the artwork overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DefaultHost {
    Gelbooru,
    Danbooru,
    #[default]
    AllHosts,
}

/// User settings shared by all tabs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub show_thumbnail_status: bool,
    pub hide_related_pics: bool,
    pub hide_other_pics_by_artist: bool,
    pub hide_header: bool,
    pub show_post_score: bool,
    pub enabled_hosts: Vec<PostHost>,
    pub default_host: DefaultHost,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_thumbnail_status: true,
            hide_related_pics: false,
            hide_other_pics_by_artist: false,
            hide_header: false,
            show_post_score: false,
            enabled_hosts: PostHost::ALL.to_vec(),
            default_host: DefaultHost::AllHosts,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SettingKey {
    ShowThumbnailStatus,
    HideRelatedPics,
    HideOtherPicsByArtist,
    HideHeader,
    ShowPostScore,
    EnabledHosts,
    DefaultHost,
}

impl SettingKey {
    pub const ALL: [SettingKey; 7] = [
        SettingKey::ShowThumbnailStatus,
        SettingKey::HideRelatedPics,
        SettingKey::HideOtherPicsByArtist,
        SettingKey::HideHeader,
        SettingKey::ShowPostScore,
        SettingKey::EnabledHosts,
        SettingKey::DefaultHost,
    ];

    /// Field name on the wire.
    pub fn field_name(self) -> &'static str {
        match self {
            SettingKey::ShowThumbnailStatus => "showThumbnailStatus",
            SettingKey::HideRelatedPics => "hideRelatedPics",
            SettingKey::HideOtherPicsByArtist => "hideOtherPicsByArtist",
            SettingKey::HideHeader => "hideHeader",
            SettingKey::ShowPostScore => "showPostScore",
            SettingKey::EnabledHosts => "enabledHosts",
            SettingKey::DefaultHost => "defaultHost",
        }
    }

    /// Key under which the setting is persisted.
    pub fn storage_key(self) -> String {
        format!("setting-{}", self.field_name())
    }
}

impl Settings {
    /// Keys whose value differs between `self` and `other`.
    pub fn diff(&self, other: &Settings) -> BTreeSet<SettingKey> {
        let mut changed = BTreeSet::new();
        let mut check = |key, differs: bool| {
            if differs {
                changed.insert(key);
            }
        };
        check(
            SettingKey::ShowThumbnailStatus,
            self.show_thumbnail_status != other.show_thumbnail_status,
        );
        check(SettingKey::HideRelatedPics, self.hide_related_pics != other.hide_related_pics);
        check(
            SettingKey::HideOtherPicsByArtist,
            self.hide_other_pics_by_artist != other.hide_other_pics_by_artist,
        );
        check(SettingKey::HideHeader, self.hide_header != other.hide_header);
        check(SettingKey::ShowPostScore, self.show_post_score != other.show_post_score);
        check(SettingKey::EnabledHosts, self.enabled_hosts != other.enabled_hosts);
        check(SettingKey::DefaultHost, self.default_host != other.default_host);
        changed
    }

    /// Enabled hosts, falling back to all hosts when the list is empty.
    pub fn active_hosts(&self) -> Vec<PostHost> {
        if self.enabled_hosts.is_empty() {
            PostHost::ALL.to_vec()
        } else {
            self.enabled_hosts.clone()
        }
    }
}
