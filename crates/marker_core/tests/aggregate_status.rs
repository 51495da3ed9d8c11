use marker_core::{AggregateStatus, HostMaps, MarkerFlags, PostHost, UploadStatus};
use pretty_assertions::assert_eq;

const BOTH: [PostHost; 2] = [PostHost::Gelbooru, PostHost::Danbooru];

fn maps_with(source_id: &str, entries: &[(PostHost, &[&str])]) -> HostMaps {
    let status: UploadStatus = entries
        .iter()
        .map(|(host, ids)| (*host, ids.iter().map(|id| id.to_string()).collect()))
        .collect();
    let mut maps = HostMaps::new();
    maps.merge(source_id, &status);
    maps
}

#[test]
fn checked_empty_on_one_host_and_unknown_on_the_other() {
    let maps = maps_with("100", &[(PostHost::Gelbooru, &[])]);
    let status = AggregateStatus::compute(&maps, "100", &BOTH);

    assert_eq!(
        status,
        AggregateStatus {
            num_posts: 0,
            is_checked: true,
            is_some_host_missing: true,
            is_partially_checked: true,
        }
    );
    let markers = status.markers(false).unwrap();
    assert_eq!(
        markers.class_names(),
        vec!["partially-checked", "checked-not-uploaded"]
    );
    assert!(!markers.checked_uploaded);
}

#[test]
fn fully_uploaded_on_every_host() {
    let maps = maps_with(
        "200",
        &[(PostHost::Gelbooru, &["55"]), (PostHost::Danbooru, &["77", "78"])],
    );
    let status = AggregateStatus::compute(&maps, "200", &BOTH);

    assert_eq!(status.num_posts, 3);
    assert!(!status.is_some_host_missing);
    assert!(!status.is_partially_checked);
    assert_eq!(
        status.markers(false).unwrap().class_names(),
        vec!["checked-uploaded"]
    );
}

#[test]
fn uploaded_on_one_host_missing_on_the_other_is_mixed() {
    let maps = maps_with(
        "300",
        &[(PostHost::Gelbooru, &["1"]), (PostHost::Danbooru, &[])],
    );
    let markers = AggregateStatus::compute(&maps, "300", &BOTH)
        .markers(true)
        .unwrap();

    assert_eq!(
        markers,
        MarkerFlags {
            large: true,
            partially_checked: false,
            checked_uploaded: false,
            checked_mixed: true,
            checked_not_uploaded: false,
        }
    );
    assert_eq!(markers.class_names(), vec!["checked-mixed", "large"]);
}

#[test]
fn nothing_to_render_before_any_host_reports() {
    let maps = maps_with("400", &[(PostHost::Danbooru, &["9"])]);
    let status = AggregateStatus::compute(&maps, "400", &[PostHost::Gelbooru]);

    assert!(!status.is_checked);
    assert_eq!(status.markers(false), None);
}

#[test]
fn inactive_hosts_are_ignored() {
    let maps = maps_with(
        "500",
        &[(PostHost::Gelbooru, &[]), (PostHost::Danbooru, &["9"])],
    );
    let status = AggregateStatus::compute(&maps, "500", &[PostHost::Danbooru]);

    assert_eq!(status.num_posts, 1);
    assert!(!status.is_some_host_missing);
    assert!(!status.is_partially_checked);
}
