use std::collections::{BTreeMap, HashMap};

use crate::{PostHost, PostId, SourceId, UploadStatus};

/// Append the ids of `incoming` that `target` does not hold yet, keeping
/// first-seen order. Returns the number of ids added.
pub fn merge_post_ids(target: &mut Vec<PostId>, incoming: &[PostId]) -> usize {
    let mut added = 0;
    for post_id in incoming {
        if !target.contains(post_id) {
            target.push(post_id.clone());
            added += 1;
        }
    }
    added
}

/// In-memory status store: per host, source id -> post ids.
///
/// Merging is append-only. For any entry the post id list has no duplicates
/// and preserves the order in which ids were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostMaps {
    hosts: BTreeMap<PostHost, HashMap<SourceId, Vec<PostId>>>,
}

impl HostMaps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one upload status into the store. Returns `true` when anything
    /// changed, including a host becoming "checked" with an empty list.
    pub fn merge(&mut self, source_id: &str, status: &UploadStatus) -> bool {
        let mut changed = false;
        for (host, post_ids) in status {
            let by_source = self.hosts.entry(*host).or_default();
            match by_source.get_mut(source_id) {
                Some(known) => {
                    changed |= merge_post_ids(known, post_ids) > 0;
                }
                None => {
                    let mut fresh = Vec::with_capacity(post_ids.len());
                    merge_post_ids(&mut fresh, post_ids);
                    by_source.insert(source_id.to_string(), fresh);
                    changed = true;
                }
            }
        }
        changed
    }

    pub fn post_ids(&self, host: PostHost, source_id: &str) -> Option<&[PostId]> {
        self.hosts
            .get(&host)
            .and_then(|by_source| by_source.get(source_id))
            .map(Vec::as_slice)
    }

    /// Status of one artwork restricted to `hosts`; hosts without data are absent.
    pub fn status_of(&self, source_id: &str, hosts: &[PostHost]) -> UploadStatus {
        hosts
            .iter()
            .filter_map(|host| {
                self.post_ids(*host, source_id)
                    .map(|ids| (*host, ids.to_vec()))
            })
            .collect()
    }

    pub fn has_any(&self, source_id: &str) -> bool {
        self.hosts
            .values()
            .any(|by_source| by_source.contains_key(source_id))
    }

    /// `true` when every host in `hosts` has data for the artwork.
    pub fn is_complete(&self, source_id: &str, hosts: &[PostHost]) -> bool {
        hosts
            .iter()
            .all(|host| self.post_ids(*host, source_id).is_some())
    }

    /// All known posts of an artwork as (host, post id) pairs, host by host.
    pub fn links(&self, source_id: &str) -> Vec<(PostHost, PostId)> {
        let mut links = Vec::new();
        for (host, by_source) in &self.hosts {
            if let Some(post_ids) = by_source.get(source_id) {
                links.extend(post_ids.iter().map(|id| (*host, id.clone())));
            }
        }
        links
    }

    pub fn clear(&mut self) {
        self.hosts.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.values().all(HashMap::is_empty)
    }
}
