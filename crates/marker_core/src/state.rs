use std::collections::BTreeSet;

use crate::view_model::TrackerView;
use crate::{ContainerId, HostMaps, LinkRegistry, PostHost, PostId, SourceHost};

/// Thumbnail tracking state of one content-script instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerState {
    source_host: SourceHost,
    pub(crate) registry: LinkRegistry,
    pub(crate) host_maps: HostMaps,
    pub(crate) hosts: Vec<PostHost>,
    pub(crate) show_markers: bool,
    pub(crate) containers: BTreeSet<ContainerId>,
}

impl Default for TrackerState {
    fn default() -> Self {
        Self::new(SourceHost::Pixiv)
    }
}

impl TrackerState {
    pub fn new(source_host: SourceHost) -> Self {
        Self {
            source_host,
            registry: LinkRegistry::new(),
            host_maps: HostMaps::new(),
            hosts: PostHost::ALL.to_vec(),
            show_markers: true,
            containers: BTreeSet::new(),
        }
    }

    pub fn source_host(&self) -> SourceHost {
        self.source_host
    }

    pub fn registry(&self) -> &LinkRegistry {
        &self.registry
    }

    pub fn host_maps(&self) -> &HostMaps {
        &self.host_maps
    }

    pub fn hosts(&self) -> &[PostHost] {
        &self.hosts
    }

    pub fn show_markers(&self) -> bool {
        self.show_markers
    }

    pub fn is_observing(&self, container: ContainerId) -> bool {
        self.containers.contains(&container)
    }

    /// Known posts of an artwork on the active hosts.
    pub fn links(&self, source_id: &str) -> Vec<(PostHost, PostId)> {
        self.host_maps
            .links(source_id)
            .into_iter()
            .filter(|(host, _)| self.hosts.contains(host))
            .collect()
    }

    pub fn view(&self) -> TrackerView {
        TrackerView {
            source_host: self.source_host,
            tracked_ids: self.registry.len(),
            tracked_elements: self.registry.element_count(),
            observed_containers: self.containers.iter().copied().collect(),
            hosts: self.hosts.clone(),
            show_markers: self.show_markers,
        }
    }
}
