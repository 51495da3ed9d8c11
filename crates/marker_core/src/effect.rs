use crate::{ContainerId, ElementId, GetPostStatusArgs, MarkerFlags};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Stop watching every container.
    DisconnectContainers,
    ObserveContainer { container: ContainerId },
    UnobserveContainer { container: ContainerId },
    /// Mark the element as handled and watch its class attribute.
    WatchLink { element: ElementId },
    ApplyMarkers { element: ElementId, markers: MarkerFlags },
    ClearMarkers { element: ElementId },
    /// Ask the background for the status of a batch of ids.
    RequestStatus(GetPostStatusArgs),
}
