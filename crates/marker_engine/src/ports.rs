//! Boundaries to the browser. Everything the engine touches outside its own
//! memory goes through one of these traits, so tests can swap in fakes.
use std::collections::BTreeMap;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use marker_core::{CompanionRequest, ContainerId, ElementId, Message};
use serde_json::Value;

use crate::{StorageError, TabId, TransportError};

/// What the page currently shows for a thumbnail's identifying anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorProbe {
    /// The framework has not rendered the anchor yet.
    Missing,
    /// Anchor present, with its id attribute if it has one.
    Present(Option<String>),
}

/// Child-list and attribute changes reported by the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    ChildrenChanged {
        container: ContainerId,
        added: Vec<ElementId>,
        removed: Vec<ElementId>,
    },
    /// The class attribute of a watched link was rewritten.
    ClassChanged { element: ElementId },
    ContainerDetached { container: ContainerId },
}

/// The document of one tab.
pub trait Page: Send + Sync {
    fn children(&self, container: ContainerId) -> Vec<ElementId>;
    fn observe_container(&self, container: ContainerId);
    fn unobserve_container(&self, container: ContainerId);
    /// Stop every container observer. Subtree streams handed out earlier end.
    fn disconnect_containers(&self);
    fn probe_anchor(&self, element: ElementId) -> AnchorProbe;
    /// Yields once per subtree mutation below `element`. Dropping the stream
    /// disconnects the observer.
    fn subtree_changes(&self, element: ElementId) -> BoxStream<'static, ()>;
    fn is_attached(&self, element: ElementId) -> bool;
    /// Whether the thumbnail is rendered larger than the listing default.
    fn is_large(&self, element: ElementId) -> bool;
    fn has_class(&self, element: ElementId, class: &str) -> bool;
    fn toggle_class(&self, element: ElementId, class: &str, on: bool);
    /// Report class attribute rewrites of `element` as [`PageEvent::ClassChanged`].
    fn watch_class_attribute(&self, element: ElementId);
}

/// Request/response and fire-and-forget messaging towards the background.
#[async_trait]
pub trait MessagePort: Send + Sync {
    async fn request(&self, message: Message) -> Result<Value, TransportError>;
    async fn publish(&self, message: Message) -> Result<(), TransportError>;
}

/// Delivery of background pushes to content scripts.
#[async_trait]
pub trait TabMessenger: Send + Sync {
    async fn send(&self, tab: TabId, message: &Message) -> Result<(), TransportError>;
}

/// Messaging with the companion "upload" extension.
#[async_trait]
pub trait CompanionPort: Send + Sync {
    async fn send(&self, request: &CompanionRequest) -> Result<Value, TransportError>;
}

/// A browser storage area. Missing keys are absent from `get` results.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, keys: &[String]) -> Result<BTreeMap<String, Value>, StorageError>;
    async fn set(&self, entries: BTreeMap<String, Value>) -> Result<(), StorageError>;
    async fn remove(&self, keys: &[String]) -> Result<(), StorageError>;
}
