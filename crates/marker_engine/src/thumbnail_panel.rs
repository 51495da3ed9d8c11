use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use marker_core::{
    parse_post_url, ContainerId, ElementId, PostHost, PostId, SourceId, StatusUpdate,
    ThumbnailSize,
};
use marker_logging::{marker_debug, marker_warn};

use crate::thumbnail_status::ThumbnailStatus;
use crate::PanelError;

/// Class on the thumbnail the panel is currently shown above.
pub const CLASS_SHOWING_PANEL: &str = "showing-thumbnail-panel";

/// Modifier keys held during a click.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub alt: bool,
}

impl Modifiers {
    /// Ctrl (Cmd on macOS) together with Alt.
    pub fn opens_panel(self) -> bool {
        (self.ctrl || self.meta) && self.alt
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelLink {
    pub host: PostHost,
    pub post_id: PostId,
    pub url: String,
}

impl PanelLink {
    pub fn new(host: PostHost, post_id: PostId) -> Self {
        let url = host.post_url(&post_id);
        Self { host, post_id, url }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    pub size: ThumbnailSize,
    pub placeholder: &'static str,
    pub thumbnail: Option<ElementId>,
    pub source_id: Option<SourceId>,
    pub links: Vec<PanelLink>,
}

#[derive(Debug)]
struct Shown {
    thumbnail: ElementId,
    source_id: SourceId,
    links: Vec<PanelLink>,
}

/// Popup above a thumbnail listing its known posts, with an input for
/// linking a post by hand.
#[derive(Clone)]
pub struct ThumbnailPanel {
    status: ThumbnailStatus,
    container: ContainerId,
    size: ThumbnailSize,
    shown: Arc<Mutex<Option<Shown>>>,
}

impl ThumbnailPanel {
    pub(crate) fn new(status: ThumbnailStatus, container: ContainerId, size: ThumbnailSize) -> Self {
        Self {
            status,
            container,
            size,
            shown: Arc::new(Mutex::new(None)),
        }
    }

    pub fn container(&self) -> ContainerId {
        self.container
    }

    pub fn placeholder(&self) -> &'static str {
        match self.size {
            ThumbnailSize::Small => "Post URL",
            ThumbnailSize::Medium | ThumbnailSize::Large => "Enter post URL",
        }
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    pub fn view(&self) -> PanelView {
        let shown = self.lock();
        PanelView {
            size: self.size,
            placeholder: self.placeholder(),
            thumbnail: shown.as_ref().map(|shown| shown.thumbnail),
            source_id: shown.as_ref().map(|shown| shown.source_id.clone()),
            links: shown
                .as_ref()
                .map(|shown| shown.links.clone())
                .unwrap_or_default(),
        }
    }

    /// A click on `thumbnail` inside the container. Returns `true` when the
    /// panel opened; the click must then not reach the page.
    pub fn on_thumbnail_click(&self, thumbnail: ElementId, modifiers: Modifiers) -> bool {
        if !modifiers.opens_panel() {
            return false;
        }
        let source_id = match self.status.source_id_of(thumbnail) {
            Some(source_id) => source_id,
            None => match self.status.extractor().try_extract(thumbnail) {
                Some(Ok(source_id)) => source_id,
                _ => return false,
            },
        };

        let links = self
            .status
            .links(&source_id)
            .into_iter()
            .map(|(host, post_id)| PanelLink::new(host, post_id))
            .collect();
        let page = self.status.page();
        let mut shown = self.lock();
        if let Some(previous) = shown.take() {
            page.toggle_class(previous.thumbnail, CLASS_SHOWING_PANEL, false);
        }
        page.toggle_class(thumbnail, CLASS_SHOWING_PANEL, true);
        marker_debug!("panel opened for {source_id}");
        *shown = Some(Shown {
            thumbnail,
            source_id,
            links,
        });
        true
    }

    /// Any click in the window. Clicks outside the panel hide it; returns
    /// `true` when that happened.
    pub fn on_window_click(&self, inside_panel: bool) -> bool {
        if inside_panel {
            return false;
        }
        let mut shown = self.lock();
        match shown.take() {
            Some(previous) => {
                self.status
                    .page()
                    .toggle_class(previous.thumbnail, CLASS_SHOWING_PANEL, false);
                true
            }
            None => false,
        }
    }

    /// Link the shown thumbnail to the post at `input`. The link is listed
    /// right away; the update then goes to the background like any other,
    /// which stores it and sends it to every tab.
    pub async fn submit(&self, input: &str) -> Result<Option<StatusUpdate>, PanelError> {
        let input = input.trim();
        let update = {
            let mut shown = self.lock();
            let shown = shown.as_mut().ok_or(PanelError::NotOpen)?;
            if input.is_empty() {
                return Ok(None);
            }
            let (host, post_id) = parse_post_url(input)?;
            let link = PanelLink::new(host, post_id.clone());
            if !shown.links.contains(&link) {
                shown.links.push(link);
            }
            StatusUpdate::single(
                self.status.source_host(),
                shown.source_id.clone(),
                host,
                post_id,
            )
        };

        if let Err(err) = self.status.background().send_status_update(update.clone()).await {
            marker_warn!("manual link not sent: {err}");
        }
        Ok(Some(update))
    }

    fn lock(&self) -> MutexGuard<'_, Option<Shown>> {
        self.shown.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
