#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use marker_core::{CompanionRequest, ContainerId, ElementId, Message, StatusMap};
use marker_engine::{
    AnchorProbe, CompanionPort, KeyValueStore, MessagePort, Page, StorageError, TabId,
    TabMessenger, TransportError,
};
use serde_json::Value;
use tokio::sync::{mpsc, Notify};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(marker_logging::initialize_for_tests);
}

/// Let spawned tasks on the current-thread runtime run to their next
/// suspension point.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

#[derive(Default)]
struct PageState {
    children: HashMap<ContainerId, Vec<ElementId>>,
    anchors: HashMap<ElementId, AnchorProbe>,
    classes: HashMap<ElementId, BTreeSet<String>>,
    detached: HashSet<ElementId>,
    large: HashSet<ElementId>,
    observed: BTreeSet<ContainerId>,
    watched: BTreeSet<ElementId>,
    subtree: HashMap<ElementId, Vec<mpsc::UnboundedSender<()>>>,
    disconnects: usize,
}

/// In-memory document.
#[derive(Default)]
pub struct FakePage {
    state: Mutex<PageState>,
}

impl FakePage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Insert a thumbnail; `None` leaves the anchor unrendered.
    pub fn add_thumbnail(&self, container: ContainerId, element: ElementId, id: Option<&str>) {
        let mut state = self.state.lock().unwrap();
        state.children.entry(container).or_default().push(element);
        let probe = match id {
            Some(id) => AnchorProbe::Present(Some(id.to_string())),
            None => AnchorProbe::Missing,
        };
        state.anchors.insert(element, probe);
    }

    /// Render the anchor of a thumbnail and notify its subtree observers.
    pub fn render_anchor(&self, element: ElementId, id: Option<&str>) {
        let mut state = self.state.lock().unwrap();
        state
            .anchors
            .insert(element, AnchorProbe::Present(id.map(str::to_string)));
        if let Some(senders) = state.subtree.get_mut(&element) {
            senders.retain(|tx| tx.send(()).is_ok());
        }
    }

    pub fn set_large(&self, element: ElementId) {
        self.state.lock().unwrap().large.insert(element);
    }

    pub fn detach(&self, element: ElementId) {
        self.state.lock().unwrap().detached.insert(element);
    }

    /// What the host page's framework does when it rewrites a class list.
    pub fn strip_classes(&self, element: ElementId) {
        self.state.lock().unwrap().classes.remove(&element);
    }

    pub fn classes(&self, element: ElementId) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .classes
            .get(&element)
            .map(|classes| classes.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn observed(&self) -> Vec<ContainerId> {
        self.state.lock().unwrap().observed.iter().copied().collect()
    }

    pub fn is_watched(&self, element: ElementId) -> bool {
        self.state.lock().unwrap().watched.contains(&element)
    }

    pub fn subtree_observers(&self, element: ElementId) -> usize {
        self.state
            .lock()
            .unwrap()
            .subtree
            .get(&element)
            .map(|senders| senders.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }

    pub fn disconnects(&self) -> usize {
        self.state.lock().unwrap().disconnects
    }
}

impl Page for FakePage {
    fn children(&self, container: ContainerId) -> Vec<ElementId> {
        self.state
            .lock()
            .unwrap()
            .children
            .get(&container)
            .cloned()
            .unwrap_or_default()
    }

    fn observe_container(&self, container: ContainerId) {
        self.state.lock().unwrap().observed.insert(container);
    }

    fn unobserve_container(&self, container: ContainerId) {
        self.state.lock().unwrap().observed.remove(&container);
    }

    fn disconnect_containers(&self) {
        let mut state = self.state.lock().unwrap();
        state.observed.clear();
        state.subtree.clear();
        state.disconnects += 1;
    }

    fn probe_anchor(&self, element: ElementId) -> AnchorProbe {
        self.state
            .lock()
            .unwrap()
            .anchors
            .get(&element)
            .cloned()
            .unwrap_or(AnchorProbe::Missing)
    }

    fn subtree_changes(&self, element: ElementId) -> BoxStream<'static, ()> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state
            .lock()
            .unwrap()
            .subtree
            .entry(element)
            .or_default()
            .push(tx);
        stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|change| (change, rx)) })
            .boxed()
    }

    fn is_attached(&self, element: ElementId) -> bool {
        !self.state.lock().unwrap().detached.contains(&element)
    }

    fn is_large(&self, element: ElementId) -> bool {
        self.state.lock().unwrap().large.contains(&element)
    }

    fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .classes
            .get(&element)
            .is_some_and(|classes| classes.contains(class))
    }

    fn toggle_class(&self, element: ElementId, class: &str, on: bool) {
        let mut state = self.state.lock().unwrap();
        let classes = state.classes.entry(element).or_default();
        if on {
            classes.insert(class.to_string());
        } else {
            classes.remove(class);
        }
    }

    fn watch_class_attribute(&self, element: ElementId) {
        self.state.lock().unwrap().watched.insert(element);
    }
}

/// Background stand-in answering `get-post-status` from a fixed status map.
#[derive(Default)]
pub struct RecordingPort {
    pub requests: Mutex<Vec<Message>>,
    pub published: Mutex<Vec<Message>>,
    known: Mutex<StatusMap>,
    failing: Mutex<bool>,
    /// When set, `publish` waits for a notification before returning.
    pub gate: Option<Arc<Notify>>,
}

impl RecordingPort {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn gated(gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            gate: Some(gate),
            ..Self::default()
        })
    }

    pub fn know(&self, status: StatusMap) {
        self.known.lock().unwrap().extend(status);
    }

    pub fn fail(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn requests(&self) -> Vec<Message> {
        self.requests.lock().unwrap().clone()
    }

    /// Source ids of every `get-post-status` request, one list per request.
    pub fn status_requests(&self) -> Vec<Vec<String>> {
        self.requests()
            .into_iter()
            .filter_map(|message| match message {
                Message::GetPostStatus(args) => Some(args.source_ids),
                _ => None,
            })
            .collect()
    }

    pub fn published(&self) -> Vec<Message> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagePort for RecordingPort {
    async fn request(&self, message: Message) -> Result<Value, TransportError> {
        self.requests.lock().unwrap().push(message.clone());
        if *self.failing.lock().unwrap() {
            return Err(TransportError::Unreachable("background asleep".into()));
        }
        match message {
            Message::GetPostStatus(args) => {
                let known = self.known.lock().unwrap();
                let answer: StatusMap = args
                    .source_ids
                    .iter()
                    .filter_map(|id| known.get(id).map(|status| (id.clone(), status.clone())))
                    .collect();
                Ok(serde_json::to_value(answer).unwrap())
            }
            _ => Ok(Value::Null),
        }
    }

    async fn publish(&self, message: Message) -> Result<(), TransportError> {
        self.published.lock().unwrap().push(message);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Ok(())
    }
}

/// Tab messenger recording deliveries; listed tabs refuse them.
#[derive(Default)]
pub struct FakeTabs {
    pub delivered: Mutex<Vec<(TabId, Message)>>,
    closed: Mutex<HashSet<TabId>>,
}

impl FakeTabs {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn close(&self, tab: TabId) {
        self.closed.lock().unwrap().insert(tab);
    }

    pub fn delivered(&self) -> Vec<(TabId, Message)> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl TabMessenger for FakeTabs {
    async fn send(&self, tab: TabId, message: &Message) -> Result<(), TransportError> {
        if self.closed.lock().unwrap().contains(&tab) {
            return Err(TransportError::Unreachable(format!("tab {tab} closed")));
        }
        self.delivered.lock().unwrap().push((tab, message.clone()));
        Ok(())
    }
}

/// Companion extension answering from canned responses keyed by request type
/// and, for `query-host`, by tag and host.
#[derive(Default)]
pub struct FakeCompanion {
    pub requests: Mutex<Vec<CompanionRequest>>,
    answers: Mutex<HashMap<String, Value>>,
    pub unreachable: bool,
}

impl FakeCompanion {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            unreachable: true,
            ..Self::default()
        })
    }

    pub fn answer(&self, key: impl Into<String>, value: Value) {
        self.answers.lock().unwrap().insert(key.into(), value);
    }

    pub fn requests(&self) -> Vec<CompanionRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn key(request: &CompanionRequest) -> String {
        match request {
            CompanionRequest::QueryHost { tags, host } => format!("query-host {host} {}", tags.join(" ")),
            other => other.type_name().to_string(),
        }
    }
}

#[async_trait]
impl CompanionPort for FakeCompanion {
    async fn send(&self, request: &CompanionRequest) -> Result<Value, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.unreachable {
            return Err(TransportError::Unreachable("no such extension".into()));
        }
        Ok(self
            .answers
            .lock()
            .unwrap()
            .get(&Self::key(request))
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default())))
    }
}

/// Storage area whose every call fails.
pub struct BrokenStore;

#[async_trait]
impl KeyValueStore for BrokenStore {
    async fn get(&self, _keys: &[String]) -> Result<BTreeMap<String, Value>, StorageError> {
        Err(StorageError::Backend("quota exceeded".into()))
    }

    async fn set(&self, _entries: BTreeMap<String, Value>) -> Result<(), StorageError> {
        Err(StorageError::Backend("quota exceeded".into()))
    }

    async fn remove(&self, _keys: &[String]) -> Result<(), StorageError> {
        Err(StorageError::Backend("quota exceeded".into()))
    }
}
