use crate::{ContainerId, ElementId, PostHost, SourceId, StatusMap};

/// A thumbnail element whose source id has been extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub element: ElementId,
    pub source_id: SourceId,
    /// The thumbnail is rendered larger than usual.
    pub large: bool,
}

impl ResolvedLink {
    pub fn new(element: ElementId, source_id: impl Into<SourceId>) -> Self {
        Self {
            element,
            source_id: source_id.into(),
            large: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Start tracking a new set of containers, forgetting all previous links.
    Manage { containers: Vec<ContainerId> },
    /// Links that appeared in one mutation batch.
    LinksAdded { links: Vec<ResolvedLink> },
    /// Elements that left the document.
    LinksRemoved { elements: Vec<ElementId> },
    /// The page overwrote the class list of a registered element.
    LinkClassReset { element: ElementId },
    /// A container was found detached from the document.
    ContainerDetached { container: ContainerId },
    /// Status arrived from a query or a push update.
    StatusReceived(StatusMap),
    /// Replace the set of hosts used for aggregate status.
    SetHosts(Vec<PostHost>),
    /// Turn the markers on or off without touching the data.
    ToggleMarkers(bool),
    /// Tear everything down on page-type change.
    Clear,
}
