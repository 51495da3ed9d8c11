mod common;

use std::sync::Arc;

use common::{init_logging, settle, FakePage, RecordingPort};
use futures_util::stream;
use marker_core::{
    ContainerId, ElementId, Message, PostHost, Settings, SettingKey, SourceHost, StatusMap,
    StatusUpdate, ThumbnailSize, UploadStatus,
};
use marker_engine::{BackgroundClient, ManagedContainer, PageEvent, ThumbnailStatus};
use pretty_assertions::assert_eq;

const GRID: ContainerId = ContainerId(1);

fn status(entries: &[(&str, PostHost, &[&str])]) -> StatusMap {
    let mut map = StatusMap::new();
    for (source_id, host, ids) in entries {
        map.entry(source_id.to_string())
            .or_insert_with(UploadStatus::new)
            .insert(*host, ids.iter().map(|id| id.to_string()).collect());
    }
    map
}

fn tracker(page: &Arc<FakePage>, port: &Arc<RecordingPort>) -> ThumbnailStatus {
    ThumbnailStatus::new(
        SourceHost::Pixiv,
        page.clone(),
        BackgroundClient::new(port.clone()),
    )
}

fn grid() -> [ManagedContainer; 1] {
    [ManagedContainer {
        container: GRID,
        size: ThumbnailSize::Medium,
    }]
}

fn classes(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

#[tokio::test]
async fn initial_scan_sends_one_request_for_all_thumbnails() {
    init_logging();
    let page = FakePage::new();
    let port = RecordingPort::new();
    for n in 1..=24 {
        page.add_thumbnail(GRID, ElementId(n), Some(&format!("{}", 500 + n)));
    }
    let tracker = tracker(&page, &port);

    let panels = tracker.manage(&grid()).await;

    assert_eq!(panels.len(), 1);
    let requests = port.status_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].len(), 24);
    assert_eq!(page.observed(), vec![GRID]);
    assert!(page.is_watched(ElementId(1)));
    assert_eq!(page.classes(ElementId(1)), classes(&["handled"]));
}

#[tokio::test]
async fn mutation_batch_is_requested_once() {
    init_logging();
    let page = FakePage::new();
    let port = RecordingPort::new();
    let tracker = tracker(&page, &port);
    tracker.manage(&grid()).await;
    assert!(port.status_requests().is_empty());

    let added: Vec<ElementId> = (1..=10).map(ElementId).collect();
    for element in &added {
        page.add_thumbnail(GRID, *element, Some(&format!("{}", element.0 % 4)));
    }
    tracker
        .handle_event(PageEvent::ChildrenChanged {
            container: GRID,
            added,
            removed: Vec::new(),
        })
        .await;

    let requests = port.status_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0], vec!["1", "2", "3", "0"]);
    assert_eq!(tracker.view().tracked_elements, 10);
}

#[tokio::test]
async fn status_answer_sets_marker_classes() {
    init_logging();
    let page = FakePage::new();
    let port = RecordingPort::new();
    port.know(status(&[
        ("100", PostHost::Gelbooru, &[]),
        ("200", PostHost::Gelbooru, &["55"]),
        ("200", PostHost::Danbooru, &["77", "78"]),
    ]));
    page.add_thumbnail(GRID, ElementId(1), Some("100"));
    page.add_thumbnail(GRID, ElementId(2), Some("200"));
    page.set_large(ElementId(2));

    tracker(&page, &port).manage(&grid()).await;

    assert_eq!(
        page.classes(ElementId(1)),
        classes(&["checked-not-uploaded", "handled", "partially-checked"])
    );
    assert_eq!(
        page.classes(ElementId(2)),
        classes(&["checked-uploaded", "handled", "large"])
    );
}

#[tokio::test]
async fn late_anchor_registers_on_its_own() {
    init_logging();
    let page = FakePage::new();
    let port = RecordingPort::new();
    page.add_thumbnail(GRID, ElementId(1), None);
    let tracker = tracker(&page, &port);

    tracker.manage(&grid()).await;
    assert!(port.status_requests().is_empty());
    assert_eq!(page.subtree_observers(ElementId(1)), 1);

    page.render_anchor(ElementId(1), Some("321"));
    settle().await;

    assert_eq!(port.status_requests(), vec![vec!["321".to_string()]]);
    assert_eq!(tracker.source_id_of(ElementId(1)), Some("321".to_string()));
    assert_eq!(page.subtree_observers(ElementId(1)), 0);
}

#[tokio::test]
async fn thumbnail_removed_before_its_anchor_is_never_registered() {
    init_logging();
    let page = FakePage::new();
    let port = RecordingPort::new();
    page.add_thumbnail(GRID, ElementId(1), None);
    let tracker = tracker(&page, &port);
    tracker.manage(&grid()).await;

    page.detach(ElementId(1));
    tracker
        .handle_event(PageEvent::ChildrenChanged {
            container: GRID,
            added: Vec::new(),
            removed: vec![ElementId(1)],
        })
        .await;
    port.fail(true);
    page.render_anchor(ElementId(1), Some("900"));
    settle().await;

    assert!(port.status_requests().is_empty());
    assert_eq!(tracker.source_id_of(ElementId(1)), None);
    assert_eq!(tracker.view().tracked_elements, 0);
    assert_eq!(tracker.view().tracked_ids, 0);
}

#[tokio::test]
async fn anchor_without_id_is_skipped() {
    init_logging();
    let page = FakePage::new();
    let port = RecordingPort::new();
    page.add_thumbnail(GRID, ElementId(1), None);
    page.add_thumbnail(GRID, ElementId(2), Some("7"));
    let tracker = tracker(&page, &port);

    tracker.manage(&grid()).await;
    page.render_anchor(ElementId(1), None);
    settle().await;

    assert_eq!(port.status_requests(), vec![vec!["7".to_string()]]);
    assert_eq!(tracker.source_id_of(ElementId(1)), None);
}

#[tokio::test]
async fn clear_abandons_pending_extractions() {
    init_logging();
    let page = FakePage::new();
    let port = RecordingPort::new();
    page.add_thumbnail(GRID, ElementId(1), None);
    let tracker = tracker(&page, &port);
    tracker.manage(&grid()).await;

    tracker.clear().await;
    page.render_anchor(ElementId(1), Some("321"));
    settle().await;

    assert_eq!(page.disconnects(), 2);
    assert!(port.status_requests().is_empty());
    assert_eq!(tracker.view().tracked_elements, 0);
}

#[tokio::test]
async fn failed_request_leaves_ids_unchecked_until_next_batch() {
    init_logging();
    let page = FakePage::new();
    let port = RecordingPort::new();
    port.fail(true);
    page.add_thumbnail(GRID, ElementId(1), Some("100"));
    let tracker = tracker(&page, &port);

    tracker.manage(&grid()).await;
    assert_eq!(page.classes(ElementId(1)), classes(&["handled"]));
    assert_eq!(tracker.view().tracked_ids, 1);

    port.fail(false);
    port.know(status(&[
        ("100", PostHost::Gelbooru, &["1"]),
        ("100", PostHost::Danbooru, &["2"]),
    ]));
    page.add_thumbnail(GRID, ElementId(2), Some("100"));
    tracker
        .handle_event(PageEvent::ChildrenChanged {
            container: GRID,
            added: vec![ElementId(2)],
            removed: Vec::new(),
        })
        .await;

    assert_eq!(port.status_requests().len(), 2);
    assert_eq!(
        page.classes(ElementId(1)),
        classes(&["checked-uploaded", "handled"])
    );
    assert_eq!(
        page.classes(ElementId(2)),
        classes(&["checked-uploaded", "handled"])
    );
}

#[tokio::test]
async fn redraw_prunes_detached_thumbnails() {
    init_logging();
    let page = FakePage::new();
    let port = RecordingPort::new();
    page.add_thumbnail(GRID, ElementId(1), Some("100"));
    page.add_thumbnail(GRID, ElementId(2), Some("100"));
    let tracker = tracker(&page, &port);
    tracker.manage(&grid()).await;

    page.detach(ElementId(2));
    tracker
        .update(status(&[("100", PostHost::Gelbooru, &["9"])]))
        .await;

    assert_eq!(tracker.view().tracked_elements, 1);
    assert_eq!(page.classes(ElementId(2)), classes(&["handled"]));
    assert!(page
        .classes(ElementId(1))
        .contains(&"checked-uploaded".to_string()));
}

#[tokio::test]
async fn removed_thumbnails_stop_receiving_markers() {
    init_logging();
    let page = FakePage::new();
    let port = RecordingPort::new();
    page.add_thumbnail(GRID, ElementId(1), Some("100"));
    let tracker = tracker(&page, &port);
    tracker.manage(&grid()).await;

    tracker
        .handle_event(PageEvent::ChildrenChanged {
            container: GRID,
            added: Vec::new(),
            removed: vec![ElementId(1)],
        })
        .await;
    tracker
        .update(status(&[("100", PostHost::Gelbooru, &["9"])]))
        .await;

    assert_eq!(tracker.view().tracked_ids, 0);
    assert_eq!(page.classes(ElementId(1)), classes(&["handled"]));
}

#[tokio::test]
async fn stripped_classes_are_restored() {
    init_logging();
    let page = FakePage::new();
    let port = RecordingPort::new();
    port.know(status(&[
        ("100", PostHost::Gelbooru, &["1"]),
        ("100", PostHost::Danbooru, &["2"]),
    ]));
    page.add_thumbnail(GRID, ElementId(1), Some("100"));
    let tracker = tracker(&page, &port);
    tracker.manage(&grid()).await;

    page.strip_classes(ElementId(1));
    tracker
        .handle_event(PageEvent::ClassChanged {
            element: ElementId(1),
        })
        .await;

    assert_eq!(
        page.classes(ElementId(1)),
        classes(&["checked-uploaded", "handled"])
    );
    assert_eq!(port.status_requests().len(), 1);
}

#[tokio::test]
async fn detached_container_is_no_longer_observed() {
    init_logging();
    let page = FakePage::new();
    let port = RecordingPort::new();
    let tracker = tracker(&page, &port);
    let side = ContainerId(2);
    tracker
        .manage(&[
            grid()[0],
            ManagedContainer {
                container: side,
                size: ThumbnailSize::Small,
            },
        ])
        .await;
    assert_eq!(page.observed(), vec![GRID, side]);

    tracker
        .handle_event(PageEvent::ContainerDetached { container: side })
        .await;

    assert_eq!(page.observed(), vec![GRID]);
    assert_eq!(tracker.view().observed_containers, vec![GRID]);
}

#[tokio::test]
async fn settings_toggle_markers_and_switch_hosts() {
    init_logging();
    let page = FakePage::new();
    let port = RecordingPort::new();
    port.know(status(&[
        ("100", PostHost::Gelbooru, &[]),
        ("100", PostHost::Danbooru, &["2"]),
    ]));
    page.add_thumbnail(GRID, ElementId(1), Some("100"));
    let tracker = tracker(&page, &port);
    tracker.manage(&grid()).await;
    assert!(page
        .classes(ElementId(1))
        .contains(&"checked-mixed".to_string()));

    let hidden = Settings {
        show_thumbnail_status: false,
        ..Settings::default()
    };
    let changed = tracker.apply_settings(hidden.clone()).await;
    assert_eq!(
        changed.into_iter().collect::<Vec<_>>(),
        vec![SettingKey::ShowThumbnailStatus]
    );
    assert_eq!(page.classes(ElementId(1)), classes(&["handled"]));

    // Same settings again change nothing.
    assert!(tracker.apply_settings(hidden).await.is_empty());

    let danbooru_only = Settings {
        enabled_hosts: vec![PostHost::Danbooru],
        ..Settings::default()
    };
    tracker.apply_settings(danbooru_only).await;

    let last = port.requests().pop();
    match last {
        Some(Message::GetPostStatus(args)) => {
            assert_eq!(args.post_hosts, vec![PostHost::Danbooru]);
            assert_eq!(args.source_ids, vec!["100".to_string()]);
        }
        other => panic!("expected a status request, got {other:?}"),
    }
    assert_eq!(
        page.classes(ElementId(1)),
        classes(&["checked-uploaded", "handled"])
    );
}

#[tokio::test]
async fn pushed_updates_apply_only_to_own_site() {
    init_logging();
    let page = FakePage::new();
    let port = RecordingPort::new();
    page.add_thumbnail(GRID, ElementId(1), Some("100"));
    let tracker = tracker(&page, &port);
    tracker.manage(&grid()).await;

    let nijie = StatusUpdate::single(SourceHost::Nijie, "100", PostHost::Gelbooru, "1");
    assert!(!tracker.handle_message(Message::StatusUpdate(nijie)).await);
    assert_eq!(page.classes(ElementId(1)), classes(&["handled"]));

    let pixiv = StatusUpdate::single(SourceHost::Pixiv, "100", PostHost::Gelbooru, "1");
    assert!(!tracker.handle_message(Message::StatusUpdate(pixiv)).await);
    assert_eq!(
        page.classes(ElementId(1)),
        classes(&["checked-uploaded", "handled", "partially-checked"])
    );

    assert!(tracker.handle_message(Message::UrlChanged).await);
}

#[tokio::test]
async fn run_handles_streamed_events() {
    init_logging();
    let page = FakePage::new();
    let port = RecordingPort::new();
    let tracker = tracker(&page, &port);
    tracker.manage(&grid()).await;

    page.add_thumbnail(GRID, ElementId(1), Some("1"));
    page.add_thumbnail(GRID, ElementId(2), Some("2"));
    let events = stream::iter(vec![
        PageEvent::ChildrenChanged {
            container: GRID,
            added: vec![ElementId(1)],
            removed: Vec::new(),
        },
        PageEvent::ChildrenChanged {
            container: GRID,
            added: vec![ElementId(2)],
            removed: Vec::new(),
        },
    ]);
    tracker.run(events).await;
    settle().await;

    assert_eq!(
        port.status_requests(),
        vec![vec!["1".to_string()], vec!["2".to_string()]]
    );
}
