//! Lazy initial sync tests

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use room_mirror::application::services::RoomError;

use crate::common::*;

#[tokio::test]
async fn test_concurrent_first_access_syncs_once() {
    let gateway = Arc::new(FakeGateway::new(20));
    gateway.publish(LOBBY, small_room());
    gateway.set_state_delay(Duration::from_millis(50));
    let registry = Arc::new(registry(&gateway));

    let waiters: Vec<_> = (0..10)
        .map(|_| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.get_room(LOBBY).lazy_initial_sync().await })
        })
        .collect();

    for waiter in waiters {
        assert!(waiter.await.unwrap().is_ok());
    }
    assert_eq!(gateway.calls.room_state(), 1);
    assert_eq!(gateway.calls.members(), 1);
    assert_eq!(registry.room_count(), 1);
}

#[tokio::test]
async fn test_concurrent_waiters_share_failure_and_retry_succeeds() {
    let gateway = Arc::new(FakeGateway::new(20));
    gateway.publish(LOBBY, small_room());
    gateway.set_room_failing(LOBBY, true);
    gateway.set_state_delay(Duration::from_millis(50));
    let registry = Arc::new(registry(&gateway));
    let room = registry.get_room(LOBBY);

    let (first, second) = tokio::join!(room.lazy_initial_sync(), room.lazy_initial_sync());
    assert!(first.is_err());
    assert_eq!(first, second);
    assert_eq!(gateway.calls.room_state(), 1);
    assert!(!room.is_initialized());

    gateway.set_room_failing(LOBBY, false);
    room.lazy_initial_sync().await.unwrap();
    assert!(room.is_initialized());
    assert_eq!(gateway.calls.room_state(), 2);
}

#[tokio::test]
async fn test_initialized_room_makes_no_further_state_calls() {
    let gateway = Arc::new(FakeGateway::new(20));
    gateway.publish(LOBBY, small_room());
    let registry = registry(&gateway);
    let room = registry.get_room(LOBBY);

    room.lazy_initial_sync().await.unwrap();
    room.lazy_initial_sync().await.unwrap();
    room.get_event_page("", 0, 5).await.unwrap();

    assert_eq!(gateway.calls.room_state(), 1);
    assert_eq!(gateway.calls.timeline_page(), 0);
}

#[tokio::test]
async fn test_reads_before_sync_report_not_loaded() {
    let gateway = Arc::new(FakeGateway::new(20));
    gateway.publish(LOBBY, small_room());
    let registry = registry(&gateway);
    let room = registry.get_room(LOBBY);

    assert_eq!(room.get_members(), Err(RoomError::NotLoaded));
    assert_eq!(room.power_levels(), Err(RoomError::NotLoaded));
    assert_eq!(room.servers(), Err(RoomError::NotLoaded));
    assert_eq!(gateway.calls.room_state(), 0);
}

#[tokio::test]
async fn test_initial_sync_populates_members_and_summary() {
    let gateway = Arc::new(FakeGateway::new(20));
    gateway.publish(LOBBY, small_room());
    gateway.publish(
        LOBBY,
        [
            state_event("$name", "m.room.name", "", ALICE, serde_json::json!({ "name": "Lobby" })),
            power_levels_event("$pl", ALICE, serde_json::json!({ (ALICE): 100 })),
        ],
    );
    let registry = registry(&gateway);
    let room = registry.get_room(LOBBY);
    room.lazy_initial_sync().await.unwrap();

    let members = room.get_members().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].user_id, ALICE);
    assert_eq!(members[0].power_level, 100);
    assert_eq!(room.summary().unwrap().display_name(LOBBY), "Lobby");
    assert_eq!(room.servers().unwrap(), vec!["example.org".to_owned()]);
    assert_eq!(room.get_member("@nobody:example.org"), Ok(None));
}

#[tokio::test]
async fn test_registry_returns_same_mirror_in_insertion_order() {
    let gateway = Arc::new(FakeGateway::new(20));
    let registry = registry(&gateway);

    let first = registry.get_room("!b:example.org");
    registry.get_room("!a:example.org");
    let again = registry.get_room("!b:example.org");

    assert!(Arc::ptr_eq(&first, &again));
    let listed: Vec<String> = registry
        .get_room_list(0, -1)
        .iter()
        .map(|room| room.id().to_owned())
        .collect();
    assert_eq!(listed, vec!["!b:example.org", "!a:example.org"]);
    assert_eq!(registry.get_room_list(1, 5).len(), 1);
    assert!(registry.get_room_list(3, -1).is_empty());
}
