//! Anchor-based pagination and backfill tests

use std::sync::Arc;

use pretty_assertions::assert_eq;
use room_mirror::application::services::TimelineError;

use crate::common::*;

#[tokio::test]
async fn test_small_room_pages() {
    let gateway = Arc::new(FakeGateway::new(20));
    gateway.publish(LOBBY, small_room());
    let registry = registry(&gateway);
    let room = registry.get_room(LOBBY);

    let newest = room.get_event_page("", 0, 20).await.unwrap();
    assert_eq!(
        ids(&newest.events),
        vec!["$create", "$join-alice", "$msg1", "$msg2", "$msg3"]
    );
    assert!(newest.reached_room_create());
    assert_eq!(newest.anchor.as_deref(), Some("$msg3"));

    let around = room.get_event_page("$msg1", 0, 2).await.unwrap();
    assert_eq!(ids(&around.events), vec!["$join-alice", "$msg1"]);
    assert!(!around.reached_room_create());

    let older = room.get_event_page("$msg1", 1, 2).await.unwrap();
    assert_eq!(ids(&older.events), vec!["$create", "$join-alice"]);
    assert!(older.reached_room_create());

    assert_eq!(gateway.calls.timeline_page(), 0);
}

#[tokio::test]
async fn test_newest_page_of_two() {
    let gateway = Arc::new(FakeGateway::new(20));
    gateway.publish(LOBBY, small_room());
    let registry = registry(&gateway);
    let room = registry.get_room(LOBBY);

    let page = room.get_event_page("", 0, 2).await.unwrap();
    assert_eq!(ids(&page.events), vec!["$msg2", "$msg3"]);
    assert_eq!(page.anchor.as_deref(), Some("$msg3"));

    // Next page keeps the resolved anchor and moves the offset
    let next = room.get_event_page("$msg3", 2, 2).await.unwrap();
    assert_eq!(ids(&next.events), vec!["$join-alice", "$msg1"]);
}

#[tokio::test]
async fn test_backfill_extends_window_contiguously() {
    let gateway = Arc::new(FakeGateway::new(20));
    gateway.publish(LOBBY, long_room(100));
    let registry = registry(&gateway);
    let room = registry.get_room(LOBBY);

    let page = room.get_event_page("", 40, 20).await.unwrap();

    let expected: Vec<String> = (40..60).map(|i| format!("$m{i}")).collect();
    assert_eq!(ids(&page.events), expected.iter().map(String::as_str).collect::<Vec<_>>());
    assert_eq!(gateway.calls.timeline_page(), 1);

    // Cached window is contiguous and duplicate-free, oldest first
    let cached = room.cached_timeline();
    let cached_ids = ids(&cached);
    let expected_tail: Vec<String> = (30..100).map(|i| format!("$m{i}")).collect();
    assert_eq!(cached_ids, expected_tail.iter().map(String::as_str).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_repeated_request_is_idempotent_and_cached() {
    let gateway = Arc::new(FakeGateway::new(20));
    gateway.publish(LOBBY, long_room(100));
    let registry = registry(&gateway);
    let room = registry.get_room(LOBBY);

    let first = room.get_event_page("$m70", 10, 20).await.unwrap();
    let calls = gateway.calls.timeline_page();
    let second = room.get_event_page("$m70", 10, 20).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(gateway.calls.timeline_page(), calls);
}

#[tokio::test]
async fn test_anchor_found_in_older_history() {
    let gateway = Arc::new(FakeGateway::new(20));
    gateway.publish(LOBBY, long_room(200));
    let registry = registry(&gateway);
    let room = registry.get_room(LOBBY);

    let page = room.get_event_page("$m100", 0, 5).await.unwrap();

    assert_eq!(ids(&page.events), vec!["$m96", "$m97", "$m98", "$m99", "$m100"]);
    assert_eq!(page.anchor.as_deref(), Some("$m100"));
    assert_eq!(gateway.calls.timeline_page(), 2);
}

#[tokio::test]
async fn test_missing_anchor_gives_up_after_three_fetches() {
    let gateway = Arc::new(FakeGateway::new(20));
    gateway.publish(LOBBY, long_room(500));
    let registry = registry(&gateway);
    let room = registry.get_room(LOBBY);
    room.lazy_initial_sync().await.unwrap();
    let before = room.cached_timeline();

    let err = room.get_event_page("$never-sent", 0, 20).await.unwrap_err();

    assert_eq!(
        err,
        TimelineError::CouldNotFindEvent {
            anchor: "$never-sent".into()
        }
    );
    assert_eq!(gateway.calls.timeline_page(), 3);
    assert_eq!(room.cached_timeline(), before);
}

#[tokio::test]
async fn test_missing_anchor_in_short_history_still_spends_three_fetches() {
    let gateway = Arc::new(FakeGateway::new(20));
    gateway.publish(LOBBY, long_room(30));
    let registry = registry(&gateway);
    let room = registry.get_room(LOBBY);

    let err = room.get_event_page("$never-sent", 0, 20).await.unwrap_err();

    assert!(matches!(err, TimelineError::CouldNotFindEvent { .. }));
    assert_eq!(gateway.calls.timeline_page(), 3);
}

#[tokio::test]
async fn test_offset_past_history_returns_empty_page() {
    let gateway = Arc::new(FakeGateway::new(20));
    gateway.publish(LOBBY, long_room(30));
    let registry = registry(&gateway);
    let room = registry.get_room(LOBBY);

    let page = room.get_event_page("", 500, 20).await.unwrap();

    assert!(page.events.is_empty());
    assert!(!page.reached_room_create());
    assert_eq!(room.cached_timeline().len(), 32);
    assert_eq!(room.cached_timeline()[0].event_id, "$create");
}

#[tokio::test]
async fn test_offset_is_clamped() {
    let gateway = Arc::new(FakeGateway::new(20));
    gateway.publish(LOBBY, small_room());
    let registry = registry(&gateway);
    let room = registry.get_room(LOBBY);

    let page = room.get_event_page("", 50_000, 20).await.unwrap();

    assert_eq!(page.offset, 10_000);
    assert!(page.events.is_empty());
}

#[tokio::test]
async fn test_page_errors_map_to_unknown_when_remote_fails() {
    let gateway = Arc::new(FakeGateway::new(20));
    gateway.publish(LOBBY, long_room(100));
    let registry = registry(&gateway);
    let room = registry.get_room(LOBBY);
    room.lazy_initial_sync().await.unwrap();

    gateway.set_room_failing(LOBBY, true);
    let err = room.get_event_page("", 40, 20).await.unwrap_err();

    assert!(matches!(err, TimelineError::Unknown(_)));
    // Cached pages keep working
    assert_eq!(room.get_event_page("", 0, 20).await.unwrap().events.len(), 20);
}

#[tokio::test]
async fn test_empty_initial_window_backfills_once_an_event_is_cached() {
    let gateway = Arc::new(FakeGateway::new(0));
    gateway.publish(LOBBY, small_room());
    let registry = registry(&gateway);
    let room = registry.get_room(LOBBY);

    // Nothing cached to page back from: fail rather than claim an empty history
    let err = room.get_event_page("", 0, 20).await.unwrap_err();
    assert_eq!(err, TimelineError::NoCachedEvents);
    let err = room.get_event_page("$msg1", 0, 2).await.unwrap_err();
    assert_eq!(err, TimelineError::NoCachedEvents);

    gateway.publish(LOBBY, [message("$msg4", ALICE, "four")]);
    assert_eq!(room.lazy_update_room().await.unwrap(), 1);

    let page = room.get_event_page("", 0, 20).await.unwrap();
    assert_eq!(
        ids(&page.events),
        vec!["$create", "$join-alice", "$msg1", "$msg2", "$msg3", "$msg4"]
    );
    assert!(page.reached_room_create());
    assert_eq!(gateway.calls.timeline_page(), 1);

    let around = room.get_event_page("$msg1", 0, 2).await.unwrap();
    assert_eq!(ids(&around.events), vec!["$join-alice", "$msg1"]);
}
