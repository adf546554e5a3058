//! Room Mirror
//!
//! Per-room cached state (timeline, membership, power levels, summary) kept
//! in sync with the remote homeserver.
//!
//! ## Write paths
//!
//! - **Initial sync**: run lazily on first access, at most one in flight per
//!   room. Concurrent callers share the in-flight future and all observe its
//!   outcome. Failures are not cached.
//! - **Backfill**: extends the timeline towards the start of history while
//!   serving a page request. Serialized per room.
//! - **Forward sync**: advances the timeline past the sync cursor. Driven only
//!   by the background scheduler and serialized per room.
//!
//! Every write is staged off-lock and installed under a single write-lock
//! acquisition, so readers never observe a partially applied batch.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use super::timeline::{EventPage, Lookup, Timeline};
use crate::domain::{
    event_types, Event, GatewayError, MemberInfo, Membership, PowerLevels, RoomGateway,
    RoomStateSnapshot, RoomSummary,
};

/// Tuning knobs for a mirror.
#[derive(Debug, Clone, Copy)]
pub struct MirrorOptions {
    /// Events requested per backfill fetch
    pub backfill_batch: usize,

    /// Backfill fetches spent looking for an unknown anchor
    pub anchor_search_attempts: usize,

    /// Largest accepted pagination offset
    pub max_offset: usize,
}

impl Default for MirrorOptions {
    fn default() -> Self {
        Self {
            backfill_batch: 50,
            anchor_search_attempts: 3,
            max_offset: 10_000,
        }
    }
}

/// Room access errors for callers that cannot trigger a load themselves.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    #[error("Room has not been loaded")]
    NotLoaded,
}

/// Page resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimelineError {
    #[error("Could not find event {anchor}")]
    CouldNotFindEvent { anchor: String },

    /// No event is cached yet, so there is nothing to page back from.
    #[error("No cached event to page back from")]
    NoCachedEvents,

    #[error("Unknown error: {0}")]
    Unknown(#[from] GatewayError),
}

type SharedSync = Shared<BoxFuture<'static, Result<(), GatewayError>>>;

/// Everything mirrored for one room. Installed whole by the initial sync.
#[derive(Debug)]
struct MirrorState {
    timeline: Timeline,
    /// Ordered by user ID
    members: BTreeMap<String, MemberInfo>,
    power_levels: PowerLevels,
    summary: RoomSummary,
    sync_cursor: Option<String>,
}

impl MirrorState {
    fn from_snapshot(snapshot: RoomStateSnapshot, members: Vec<MemberInfo>) -> Self {
        let mut state = Self {
            timeline: Timeline::from_window(snapshot.timeline),
            members: BTreeMap::new(),
            power_levels: PowerLevels::default(),
            summary: RoomSummary::default(),
            sync_cursor: Some(snapshot.cursor).filter(|cursor| !cursor.is_empty()),
        };

        for event in &snapshot.state {
            state.apply_state(event);
        }
        // The dedicated member list is authoritative over state-derived entries.
        for member in members {
            state.members.insert(member.user_id.clone(), member);
        }
        state.refresh_member_levels();
        state
    }

    /// Fold a current-state event into membership, power levels or summary.
    fn apply_state(&mut self, event: &Event) {
        match event.event_type.as_str() {
            event_types::MEMBER => {
                if let Some(mut member) = MemberInfo::from_event(event) {
                    member.power_level = self.power_levels.user_level(&member.user_id);
                    self.members.insert(member.user_id.clone(), member);
                }
            }
            event_types::POWER_LEVELS if event.state_key.as_deref() == Some("") => {
                self.power_levels = PowerLevels::from_content(&event.content);
                self.refresh_member_levels();
            }
            _ => {
                self.summary.apply(event);
            }
        }
    }

    fn refresh_member_levels(&mut self) {
        for member in self.members.values_mut() {
            member.power_level = self.power_levels.user_level(&member.user_id);
        }
    }
}

/// Cached mirror of a single remote room.
pub struct RoomMirror {
    id: String,
    gateway: Arc<dyn RoomGateway>,
    options: MirrorOptions,
    /// `None` until the initial sync succeeds
    state: RwLock<Option<MirrorState>>,
    initial_sync: Mutex<Option<SharedSync>>,
    backfill_lock: tokio::sync::Mutex<()>,
    update_lock: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for RoomMirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomMirror")
            .field("id", &self.id)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl RoomMirror {
    pub fn new(id: impl Into<String>, gateway: Arc<dyn RoomGateway>, options: MirrorOptions) -> Self {
        Self {
            id: id.into(),
            gateway,
            options,
            state: RwLock::new(None),
            initial_sync: Mutex::new(None),
            backfill_lock: tokio::sync::Mutex::new(()),
            update_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_initialized(&self) -> bool {
        self.state.read().is_some()
    }

    /// Populate the mirror on first use.
    ///
    /// Returns immediately once initialized. Otherwise joins the in-flight
    /// sync, starting one if there is none.
    pub async fn lazy_initial_sync(self: &Arc<Self>) -> Result<(), GatewayError> {
        if self.is_initialized() {
            return Ok(());
        }

        let sync = {
            let mut slot = self.initial_sync.lock();
            if self.is_initialized() {
                return Ok(());
            }
            match slot.as_ref() {
                Some(in_flight) => in_flight.clone(),
                None => {
                    let sync = Arc::clone(self).run_initial_sync().boxed().shared();
                    *slot = Some(sync.clone());
                    sync
                }
            }
        };

        let result = sync.clone().await;

        let mut slot = self.initial_sync.lock();
        if slot.as_ref().is_some_and(|in_flight| in_flight.ptr_eq(&sync)) {
            *slot = None;
        }
        result
    }

    #[instrument(skip(self), fields(room_id = %self.id))]
    async fn run_initial_sync(self: Arc<Self>) -> Result<(), GatewayError> {
        let snapshot = self.gateway.fetch_room_state(&self.id).await.map_err(|err| {
            warn!(error = %err, "Initial room state fetch failed");
            err
        })?;
        let members = self.gateway.fetch_members(&self.id).await.map_err(|err| {
            warn!(error = %err, "Initial member fetch failed");
            err
        })?;

        let state = MirrorState::from_snapshot(snapshot, members);
        info!(
            events = state.timeline.len(),
            members = state.members.len(),
            "Room mirror initialized"
        );
        *self.state.write() = Some(state);
        Ok(())
    }

    /// Resolve `page_size` events starting `offset` events back from `anchor`.
    ///
    /// The anchor itself sits at offset 0; an empty anchor means the newest
    /// event. Events come back oldest first.
    pub async fn get_event_page(
        self: &Arc<Self>,
        anchor: &str,
        offset: usize,
        page_size: usize,
    ) -> Result<EventPage, TimelineError> {
        self.lazy_initial_sync().await?;
        let offset = offset.min(self.options.max_offset);

        if let Lookup::Page(page) = self.lookup(anchor, offset, page_size) {
            return Ok(page);
        }

        let _backfill = self.backfill_lock.lock().await;
        loop {
            match self.lookup(anchor, offset, page_size) {
                Lookup::Page(page) => return Ok(page),
                Lookup::AnchorMissing => self.search_anchor(anchor).await?,
                Lookup::NeedOlder { missing } => self.backfill(missing).await?,
            }
        }
    }

    fn lookup(&self, anchor: &str, offset: usize, page_size: usize) -> Lookup {
        match self.state.read().as_ref() {
            Some(state) => state.timeline.lookup(anchor, offset, page_size),
            // Unreachable after a successful initial sync; treat as missing
            // so the caller goes through the bounded search path.
            None => Lookup::AnchorMissing,
        }
    }

    fn oldest_event_id(&self) -> Option<String> {
        self.state
            .read()
            .as_ref()
            .and_then(|state| state.timeline.oldest_id().map(str::to_owned))
    }

    /// Walk back through remote history looking for `anchor`.
    ///
    /// Spends exactly `anchor_search_attempts` fetches before giving up. Fetched
    /// events are staged and only committed once the anchor turns up, so a
    /// failed search leaves the cache untouched.
    #[instrument(skip(self), fields(room_id = %self.id))]
    async fn search_anchor(&self, anchor: &str) -> Result<(), TimelineError> {
        let not_found = || TimelineError::CouldNotFindEvent {
            anchor: anchor.to_owned(),
        };
        let Some(join_point) = self.oldest_event_id() else {
            return Err(TimelineError::NoCachedEvents);
        };

        let mut before = join_point.clone();
        let mut staged: Vec<Event> = Vec::new();
        for attempt in 1..=self.options.anchor_search_attempts {
            let batch = self
                .gateway
                .fetch_timeline_page(&self.id, &before, self.options.backfill_batch)
                .await?;
            let found = batch.iter().any(|event| event.event_id == anchor);
            if let Some(oldest) = batch.last() {
                before = oldest.event_id.clone();
            }
            staged.extend(batch);

            if found {
                let mut guard = self.state.write();
                if let Some(state) = guard.as_mut() {
                    let added = state.timeline.append_older(&join_point, staged);
                    debug!(attempt, added, "Anchor located in remote history");
                }
                return Ok(());
            }
            debug!(attempt, "Anchor not in fetched history yet");
        }

        info!(anchor, "Giving up on anchor");
        Err(not_found())
    }

    /// Extend the cached window by at least `missing` older events, or mark
    /// the start of history as reached. Fails with `NoCachedEvents` when there
    /// is no oldest event to page back from.
    #[instrument(skip(self), fields(room_id = %self.id))]
    async fn backfill(&self, missing: usize) -> Result<(), TimelineError> {
        let Some(before) = self.oldest_event_id() else {
            warn!("Timeline is empty, cannot backfill until forward sync caches an event");
            return Err(TimelineError::NoCachedEvents);
        };

        let count = missing.max(self.options.backfill_batch);
        let batch = self
            .gateway
            .fetch_timeline_page(&self.id, &before, count)
            .await?;

        let mut guard = self.state.write();
        let Some(state) = guard.as_mut() else {
            return Ok(());
        };
        let fetched = batch.len();
        let added = state.timeline.append_older(&before, batch);
        if added == 0 {
            // Nothing new behind the oldest event: history is exhausted.
            state.timeline.mark_start_reached();
        }
        debug!(fetched, added, "Backfilled timeline");
        Ok(())
    }

    /// Advance the mirror past its sync cursor.
    ///
    /// A no-op for rooms that have not been initialized. Returns the number of
    /// newly cached events.
    #[instrument(skip(self), fields(room_id = %self.id))]
    pub async fn lazy_update_room(&self) -> Result<usize, GatewayError> {
        let _update = self.update_lock.lock().await;

        let cursor = match self.state.read().as_ref() {
            Some(state) => state.sync_cursor.clone(),
            None => return Ok(0),
        };
        let Some(cursor) = cursor else {
            debug!("No sync cursor, skipping forward sync");
            return Ok(0);
        };

        let new_events = self
            .gateway
            .fetch_new_events_since(&self.id, &cursor)
            .await?;

        let mut guard = self.state.write();
        let Some(state) = guard.as_mut() else {
            return Ok(0);
        };

        let mut added = 0;
        for event in new_events.events {
            if state.timeline.contains(&event.event_id) {
                continue;
            }
            if event.is_state() {
                state.apply_state(&event);
            }
            state.timeline.push_newer(event);
            added += 1;
        }
        if !new_events.cursor.is_empty() {
            state.sync_cursor = Some(new_events.cursor);
        }

        if added > 0 {
            debug!(added, "Forward sync applied new events");
        }
        Ok(added)
    }

    /// Full cached membership, ordered by user ID.
    pub fn get_members(&self) -> Result<Vec<MemberInfo>, RoomError> {
        self.with_state(|state| state.members.values().cloned().collect())
    }

    /// Point lookup of one member. `Ok(None)` means the room is loaded but the
    /// user is not part of it.
    pub fn get_member(&self, user_id: &str) -> Result<Option<MemberInfo>, RoomError> {
        self.with_state(|state| state.members.get(user_id).cloned())
    }

    pub fn power_levels(&self) -> Result<PowerLevels, RoomError> {
        self.with_state(|state| state.power_levels.clone())
    }

    pub fn summary(&self) -> Result<RoomSummary, RoomError> {
        self.with_state(|state| state.summary.clone())
    }

    /// Distinct homeservers of joined members, sorted.
    pub fn servers(&self) -> Result<Vec<String>, RoomError> {
        self.with_state(|state| {
            state
                .members
                .values()
                .filter(|member| member.membership == Membership::Join)
                .filter_map(MemberInfo::server_name)
                .map(str::to_owned)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        })
    }

    /// Current forward-sync cursor.
    pub fn sync_cursor(&self) -> Option<String> {
        self.state
            .read()
            .as_ref()
            .and_then(|state| state.sync_cursor.clone())
    }

    /// The whole cached timeline, oldest first.
    pub fn cached_timeline(&self) -> Vec<Event> {
        self.state
            .read()
            .as_ref()
            .map(|state| state.timeline.to_display_vec())
            .unwrap_or_default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&MirrorState) -> T) -> Result<T, RoomError> {
        self.state.read().as_ref().map(f).ok_or(RoomError::NotLoaded)
    }
}
