//! Common Test Utilities
//!
//! An in-memory homeserver standing in for the Matrix gateway, plus event
//! fixtures and a test application wrapper.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{body::Body, http::Request, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tower::ServiceExt;

use room_mirror::application::services::{MirrorOptions, RoomRegistry};
use room_mirror::config::Settings;
use room_mirror::domain::{
    Event, GatewayError, MemberInfo, NewEvents, PublicRoomEntry, RoomGateway, RoomStateSnapshot,
};
use room_mirror::startup::{build_router, AppState};

pub const LOBBY: &str = "!lobby:example.org";
pub const ALICE: &str = "@alice:example.org";

/// Per-operation call counts.
#[derive(Debug, Default)]
pub struct CallCounts {
    pub room_state: AtomicUsize,
    pub timeline_page: AtomicUsize,
    pub members: AtomicUsize,
    pub directory: AtomicUsize,
    pub new_events: AtomicUsize,
}

impl CallCounts {
    pub fn room_state(&self) -> usize {
        self.room_state.load(Ordering::SeqCst)
    }

    pub fn timeline_page(&self) -> usize {
        self.timeline_page.load(Ordering::SeqCst)
    }

    pub fn members(&self) -> usize {
        self.members.load(Ordering::SeqCst)
    }

    pub fn directory(&self) -> usize {
        self.directory.load(Ordering::SeqCst)
    }

    pub fn new_events(&self) -> usize {
        self.new_events.load(Ordering::SeqCst)
    }
}

/// One room's full history, oldest first. Sync cursors are indices into it.
#[derive(Debug, Default)]
struct FakeRoom {
    history: Vec<Event>,
}

impl FakeRoom {
    fn state(&self) -> Vec<Event> {
        let mut latest: HashMap<(String, String), Event> = HashMap::new();
        for event in self.history.iter().filter(|event| event.is_state()) {
            let key = (
                event.event_type.clone(),
                event.state_key.clone().unwrap_or_default(),
            );
            latest.insert(key, event.clone());
        }
        latest.into_values().collect()
    }

    fn members(&self) -> Vec<MemberInfo> {
        self.state().iter().filter_map(MemberInfo::from_event).collect()
    }
}

/// In-memory homeserver.
pub struct FakeGateway {
    rooms: Mutex<HashMap<String, FakeRoom>>,
    directory: Mutex<Vec<PublicRoomEntry>>,
    failing_rooms: Mutex<HashSet<String>>,
    fail_directory: AtomicBool,
    initial_window: usize,
    state_delay: Mutex<Duration>,
    directory_delay: Mutex<Duration>,
    pub calls: CallCounts,
}

impl FakeGateway {
    pub fn new(initial_window: usize) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            directory: Mutex::new(Vec::new()),
            failing_rooms: Mutex::new(HashSet::new()),
            fail_directory: AtomicBool::new(false),
            initial_window,
            state_delay: Mutex::new(Duration::ZERO),
            directory_delay: Mutex::new(Duration::ZERO),
            calls: CallCounts::default(),
        }
    }

    /// Append events to a room's history, creating the room if needed.
    pub fn publish(&self, room_id: &str, events: impl IntoIterator<Item = Event>) {
        self.rooms
            .lock()
            .entry(room_id.to_owned())
            .or_default()
            .history
            .extend(events);
    }

    pub fn set_directory(&self, entries: Vec<PublicRoomEntry>) {
        *self.directory.lock() = entries;
    }

    pub fn set_room_failing(&self, room_id: &str, failing: bool) {
        let mut rooms = self.failing_rooms.lock();
        if failing {
            rooms.insert(room_id.to_owned());
        } else {
            rooms.remove(room_id);
        }
    }

    pub fn set_directory_failing(&self, failing: bool) {
        self.fail_directory.store(failing, Ordering::SeqCst);
    }

    pub fn set_state_delay(&self, delay: Duration) {
        *self.state_delay.lock() = delay;
    }

    pub fn set_directory_delay(&self, delay: Duration) {
        *self.directory_delay.lock() = delay;
    }

    fn check_room(&self, room_id: &str) -> Result<(), GatewayError> {
        if self.failing_rooms.lock().contains(room_id) {
            return Err(GatewayError::Network("connection reset".into()));
        }
        Ok(())
    }

    fn not_found() -> GatewayError {
        GatewayError::Status {
            status: 404,
            errcode: "M_NOT_FOUND".into(),
            message: "Unknown room".into(),
        }
    }
}

#[async_trait]
impl RoomGateway for FakeGateway {
    async fn fetch_room_state(&self, room_id: &str) -> Result<RoomStateSnapshot, GatewayError> {
        self.calls.room_state.fetch_add(1, Ordering::SeqCst);
        let delay = *self.state_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.check_room(room_id)?;

        let rooms = self.rooms.lock();
        let room = rooms.get(room_id).ok_or_else(Self::not_found)?;
        let start = room.history.len().saturating_sub(self.initial_window);
        Ok(RoomStateSnapshot {
            state: room.state(),
            timeline: room.history[start..].to_vec(),
            cursor: room.history.len().to_string(),
        })
    }

    async fn fetch_timeline_page(
        &self,
        room_id: &str,
        before_event_id: &str,
        count: usize,
    ) -> Result<Vec<Event>, GatewayError> {
        self.calls.timeline_page.fetch_add(1, Ordering::SeqCst);
        self.check_room(room_id)?;

        let rooms = self.rooms.lock();
        let room = rooms.get(room_id).ok_or_else(Self::not_found)?;
        let end = room
            .history
            .iter()
            .position(|event| event.event_id == before_event_id)
            .ok_or_else(Self::not_found)?;
        let start = end.saturating_sub(count);
        Ok(room.history[start..end].iter().rev().cloned().collect())
    }

    async fn fetch_members(&self, room_id: &str) -> Result<Vec<MemberInfo>, GatewayError> {
        self.calls.members.fetch_add(1, Ordering::SeqCst);
        self.check_room(room_id)?;

        let rooms = self.rooms.lock();
        let room = rooms.get(room_id).ok_or_else(Self::not_found)?;
        Ok(room.members())
    }

    async fn fetch_public_directory(&self) -> Result<Vec<PublicRoomEntry>, GatewayError> {
        self.calls.directory.fetch_add(1, Ordering::SeqCst);
        let delay = *self.directory_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_directory.load(Ordering::SeqCst) {
            return Err(GatewayError::Network("directory unavailable".into()));
        }
        Ok(self.directory.lock().clone())
    }

    async fn fetch_new_events_since(
        &self,
        room_id: &str,
        cursor: &str,
    ) -> Result<NewEvents, GatewayError> {
        self.calls.new_events.fetch_add(1, Ordering::SeqCst);
        self.check_room(room_id)?;

        let rooms = self.rooms.lock();
        let room = rooms.get(room_id).ok_or_else(Self::not_found)?;
        let from = cursor
            .parse::<usize>()
            .map_err(|_| GatewayError::Decode(format!("bad cursor {cursor}")))?
            .min(room.history.len());
        Ok(NewEvents {
            events: room.history[from..].to_vec(),
            cursor: room.history.len().to_string(),
        })
    }
}

// Fixtures

static TS: AtomicUsize = AtomicUsize::new(1_700_000_000_000);

fn next_ts() -> i64 {
    TS.fetch_add(1000, Ordering::SeqCst) as i64
}

pub fn state_event(id: &str, event_type: &str, state_key: &str, sender: &str, content: Value) -> Event {
    Event {
        event_id: id.into(),
        event_type: event_type.into(),
        state_key: Some(state_key.into()),
        sender: sender.into(),
        origin_server_ts: next_ts(),
        content,
    }
}

pub fn create_event(id: &str, creator: &str) -> Event {
    state_event(id, "m.room.create", "", creator, json!({ "creator": creator }))
}

pub fn join_event(id: &str, user_id: &str) -> Event {
    state_event(id, "m.room.member", user_id, user_id, json!({ "membership": "join" }))
}

pub fn power_levels_event(id: &str, sender: &str, users: Value) -> Event {
    state_event(id, "m.room.power_levels", "", sender, json!({ "users": users }))
}

pub fn message(id: &str, sender: &str, body: &str) -> Event {
    Event {
        event_id: id.into(),
        event_type: "m.room.message".into(),
        state_key: None,
        sender: sender.into(),
        origin_server_ts: next_ts(),
        content: json!({ "msgtype": "m.text", "body": body }),
    }
}

/// `[create, join alice, msg1, msg2, msg3]`
pub fn small_room() -> Vec<Event> {
    vec![
        create_event("$create", ALICE),
        join_event("$join-alice", ALICE),
        message("$msg1", ALICE, "one"),
        message("$msg2", ALICE, "two"),
        message("$msg3", ALICE, "three"),
    ]
}

/// `[create, join alice, m0 .. m{count-1}]`
pub fn long_room(count: usize) -> Vec<Event> {
    let mut events = vec![create_event("$create", ALICE), join_event("$join-alice", ALICE)];
    events.extend((0..count).map(|i| message(&format!("$m{i}"), ALICE, &format!("message {i}"))));
    events
}

pub fn directory_entry(room_id: &str, name: &str) -> PublicRoomEntry {
    PublicRoomEntry {
        room_id: room_id.into(),
        name: Some(name.into()),
        topic: None,
        canonical_alias: None,
        num_joined_members: 1,
        avatar_url: None,
        world_readable: true,
        guest_can_join: false,
    }
}

pub fn ids(events: &[Event]) -> Vec<&str> {
    events.iter().map(|event| event.event_id.as_str()).collect()
}

pub fn registry(gateway: &Arc<FakeGateway>) -> RoomRegistry {
    RoomRegistry::new(
        Arc::clone(gateway) as Arc<dyn RoomGateway>,
        MirrorOptions::default(),
        Duration::from_secs(3600),
    )
}

/// Test application over a fake homeserver
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub gateway: Arc<FakeGateway>,
}

impl TestApp {
    pub fn new(gateway: Arc<FakeGateway>) -> Self {
        Self::with_settings(gateway, |_| {})
    }

    pub fn with_settings(gateway: Arc<FakeGateway>, configure: impl FnOnce(&mut Settings)) -> Self {
        let mut settings = Settings::defaults().expect("default settings");
        configure(&mut settings);

        let state = AppState::new(Arc::clone(&gateway) as Arc<dyn RoomGateway>, settings);
        Self {
            router: build_router(state.clone()),
            state,
            gateway,
        }
    }

    /// Make a GET request to the application
    pub async fn get(&self, uri: &str) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    /// GET and decode the JSON body
    pub async fn get_json(&self, uri: &str) -> (axum::http::StatusCode, Value) {
        let response = self.get(uri).await;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }
}
