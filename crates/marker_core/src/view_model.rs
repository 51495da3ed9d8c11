use crate::{ContainerId, PostHost, SourceHost};

/// Snapshot of the tracker for diagnostics and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerView {
    pub source_host: SourceHost,
    pub tracked_ids: usize,
    pub tracked_elements: usize,
    pub observed_containers: Vec<ContainerId>,
    pub hosts: Vec<PostHost>,
    pub show_markers: bool,
}
