use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::{FutureExt, Stream, StreamExt};
use marker_core::{
    update, ContainerId, Effect, ElementId, Message, Msg, PostHost, PostId, ResolvedLink,
    SettingKey, Settings, SourceHost, SourceId, StatusMap, ThumbnailSize, TrackerState, TrackerView,
    CLASS_HANDLED, CLASS_LARGE, STATUS_CLASSES,
};
use marker_logging::{marker_debug, marker_trace, marker_warn};

use crate::client::BackgroundClient;
use crate::extract::{ExtractError, IdentifierExtractor};
use crate::ports::{Page, PageEvent};
use crate::thumbnail_panel::ThumbnailPanel;

/// A thumbnail container to track, with the size of its thumbnails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagedContainer {
    pub container: ContainerId,
    pub size: ThumbnailSize,
}

/// Upload status markers for the thumbnails of one tab.
///
/// Owns the tracker state for the tab and runs the effects the pure
/// `update` function returns against the page and the background.
#[derive(Clone)]
pub struct ThumbnailStatus {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<TrackerState>,
    settings: Mutex<Option<Settings>>,
    page: Arc<dyn Page>,
    background: BackgroundClient,
    extractor: IdentifierExtractor,
    /// Bumped by `manage` and `clear`; late extractions from an older
    /// generation are dropped.
    generation: AtomicU64,
}

impl ThumbnailStatus {
    pub fn new(source_host: SourceHost, page: Arc<dyn Page>, background: BackgroundClient) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(TrackerState::new(source_host)),
                settings: Mutex::new(None),
                extractor: IdentifierExtractor::new(page.clone()),
                page,
                background,
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn source_host(&self) -> SourceHost {
        self.lock_state().source_host()
    }

    pub fn view(&self) -> TrackerView {
        self.lock_state().view()
    }

    /// Links known for a source id on the active hosts.
    pub fn links(&self, source_id: &str) -> Vec<(PostHost, PostId)> {
        self.lock_state().links(source_id)
    }

    pub fn source_id_of(&self, element: ElementId) -> Option<SourceId> {
        self.lock_state()
            .registry()
            .source_id_of(element)
            .map(str::to_string)
    }

    pub fn extractor(&self) -> &IdentifierExtractor {
        &self.inner.extractor
    }

    pub fn background(&self) -> &BackgroundClient {
        &self.inner.background
    }

    pub(crate) fn page(&self) -> &Arc<dyn Page> {
        &self.inner.page
    }

    /// Start tracking a new set of containers, forgetting the links of the
    /// previous page. Returns one panel per container.
    pub async fn manage(&self, containers: &[ManagedContainer]) -> Vec<ThumbnailPanel> {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.dispatch(Msg::Manage {
            containers: containers.iter().map(|managed| managed.container).collect(),
        })
        .await;

        let mut seen = BTreeSet::new();
        let mut children = Vec::new();
        for managed in containers {
            if seen.insert(managed.container) {
                children.extend(self.inner.page.children(managed.container));
            }
        }
        self.handle_added(children).await;

        containers
            .iter()
            .map(|managed| ThumbnailPanel::new(self.clone(), managed.container, managed.size))
            .collect()
    }

    /// React to one page event. Returns once the status round trip for any
    /// links it added has completed.
    pub async fn handle_event(&self, event: PageEvent) {
        match event {
            PageEvent::ChildrenChanged {
                container,
                added,
                removed,
            } => {
                marker_trace!(
                    "{container}: {} added, {} removed",
                    added.len(),
                    removed.len()
                );
                if !removed.is_empty() {
                    self.dispatch(Msg::LinksRemoved { elements: removed }).await;
                }
                if !added.is_empty() {
                    self.handle_added(added).await;
                }
            }
            PageEvent::ClassChanged { element } => {
                let page = &self.inner.page;
                if !page.has_class(element, CLASS_HANDLED) {
                    page.toggle_class(element, CLASS_HANDLED, true);
                    self.dispatch(Msg::LinkClassReset { element }).await;
                }
            }
            PageEvent::ContainerDetached { container } => {
                self.dispatch(Msg::ContainerDetached { container }).await;
            }
        }
    }

    /// Handle page events until the stream ends. Each event runs as its own
    /// task so a slow status request does not hold up later mutations.
    pub async fn run<S>(&self, mut events: S)
    where
        S: Stream<Item = PageEvent> + Unpin,
    {
        while let Some(event) = events.next().await {
            let this = self.clone();
            tokio::spawn(async move { this.handle_event(event).await });
        }
        marker_debug!("page event stream ended");
    }

    /// Merge a status map received from the background.
    pub async fn update(&self, status_map: StatusMap) {
        self.dispatch(Msg::StatusReceived(status_map)).await;
    }

    pub async fn set_hosts(&self, hosts: Vec<PostHost>) {
        self.dispatch(Msg::SetHosts(hosts)).await;
    }

    pub async fn toggle(&self, enabled: bool) {
        self.dispatch(Msg::ToggleMarkers(enabled)).await;
    }

    /// Forget all status and links, e.g. when the page type changes.
    /// Extractions still waiting on the page are abandoned.
    pub async fn clear(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.dispatch(Msg::Clear).await;
    }

    /// Apply settings, acting only on the ones that changed since the last call.
    pub async fn apply_settings(&self, settings: Settings) -> BTreeSet<SettingKey> {
        let previous = self
            .inner
            .settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(settings.clone())
            .unwrap_or_default();
        let changed = previous.diff(&settings);

        // Toggle first so a host change re-requests with markers already on.
        if changed.contains(&SettingKey::ShowThumbnailStatus) {
            self.toggle(settings.show_thumbnail_status).await;
        }
        if changed.contains(&SettingKey::EnabledHosts) {
            self.set_hosts(settings.active_hosts()).await;
        }
        changed
    }

    /// Handle a push from the background. Returns `true` when the page
    /// should be rescanned because the tab navigated.
    pub async fn handle_message(&self, message: Message) -> bool {
        match message {
            Message::StatusUpdate(update) => {
                if update.source_host == self.source_host() {
                    self.update(update.source_id_to_post_ids).await;
                }
                false
            }
            Message::SettingsChanged(Some(args)) => {
                self.apply_settings(args.settings).await;
                false
            }
            Message::UrlChanged => true,
            other => {
                marker_debug!("ignoring {} pushed to tab", other.type_name());
                false
            }
        }
    }

    /// Resolve the ids of freshly inserted thumbnails. Everything resolvable
    /// right now goes out as one batch; the rest registers on its own once
    /// the page renders the anchor.
    async fn handle_added(&self, elements: Vec<ElementId>) {
        let mut ready = Vec::with_capacity(elements.len());
        for element in elements {
            let mut pending = self.inner.extractor.extract(element);
            match (&mut pending).now_or_never() {
                Some(Ok(source_id)) => ready.push(self.resolved(element, source_id)),
                Some(Err(err)) => marker_warn!("skipping thumbnail: {err}"),
                None => {
                    let this = self.clone();
                    let generation = self.inner.generation.load(Ordering::SeqCst);
                    tokio::spawn(async move {
                        match pending.await {
                            Ok(source_id) => {
                                if this.inner.generation.load(Ordering::SeqCst) != generation {
                                    marker_trace!("dropping stale extraction for {element}");
                                    return;
                                }
                                // Its removal was already reported while the anchor was missing.
                                if !this.inner.page.is_attached(element) {
                                    marker_trace!("{element} left the page before resolving");
                                    return;
                                }
                                let link = this.resolved(element, source_id);
                                this.dispatch(Msg::LinksAdded { links: vec![link] }).await;
                            }
                            Err(ExtractError::ObserverClosed(_)) => {
                                marker_trace!("extraction for {element} abandoned");
                            }
                            Err(err) => marker_warn!("skipping thumbnail: {err}"),
                        }
                    });
                }
            }
        }
        if !ready.is_empty() {
            self.dispatch(Msg::LinksAdded { links: ready }).await;
        }
    }

    fn resolved(&self, element: ElementId, source_id: SourceId) -> ResolvedLink {
        ResolvedLink {
            element,
            source_id,
            large: self.inner.page.is_large(element),
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, TrackerState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, msg: Msg) -> Vec<Effect> {
        let mut guard = self.lock_state();
        let state = std::mem::take(&mut *guard);
        let (state, effects) = update(state, msg);
        *guard = state;
        effects
    }

    pub(crate) async fn dispatch(&self, msg: Msg) {
        let effects = self.apply(msg);
        self.execute(effects).await;
    }

    async fn execute(&self, effects: Vec<Effect>) {
        let page = &self.inner.page;
        let mut queue = VecDeque::from(effects);
        let mut detached = Vec::new();

        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::DisconnectContainers => page.disconnect_containers(),
                Effect::ObserveContainer { container } => page.observe_container(container),
                Effect::UnobserveContainer { container } => page.unobserve_container(container),
                Effect::WatchLink { element } => {
                    page.toggle_class(element, CLASS_HANDLED, true);
                    page.watch_class_attribute(element);
                }
                Effect::ApplyMarkers { element, markers } => {
                    if !page.is_attached(element) {
                        detached.push(element);
                        continue;
                    }
                    for (class, on) in markers.toggles() {
                        page.toggle_class(element, class, on);
                    }
                    if markers.large {
                        page.toggle_class(element, CLASS_LARGE, true);
                    }
                }
                Effect::ClearMarkers { element } => {
                    for class in STATUS_CLASSES {
                        page.toggle_class(element, class, false);
                    }
                }
                Effect::RequestStatus(args) => {
                    let count = args.source_ids.len();
                    match self.inner.background.get_post_status(args).await {
                        Ok(status_map) => queue.extend(self.apply(Msg::StatusReceived(status_map))),
                        Err(err) => {
                            // Ids stay unchecked and are asked for again on the next batch.
                            marker_warn!("status request for {count} ids failed: {err}");
                        }
                    }
                }
            }
        }

        if !detached.is_empty() {
            marker_debug!("pruning {} detached thumbnails", detached.len());
            self.apply(Msg::LinksRemoved { elements: detached });
        }
    }
}
