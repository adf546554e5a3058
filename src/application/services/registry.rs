//! Room Registry
//!
//! The single entry point the view layer queries: owns every known room
//! mirror and the cached public room directory.
//!
//! Mirrors are created on first lookup and never evicted. The directory is
//! swapped in wholesale on each refresh, so readers always hold one complete
//! snapshot.

use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, info, instrument, warn};

use super::room_mirror::{MirrorOptions, RoomMirror};
use crate::domain::{DirectorySnapshot, GatewayError, PublicRoomEntry, RoomGateway};
use crate::infrastructure::metrics;

/// Registry of room mirrors plus the public directory cache.
pub struct RoomRegistry {
    gateway: Arc<dyn RoomGateway>,
    options: MirrorOptions,
    directory_freshness: chrono::Duration,
    rooms: DashMap<String, Arc<RoomMirror>>,
    /// Insertion order of `rooms`
    order: RwLock<Vec<Arc<RoomMirror>>>,
    directory: ArcSwap<DirectorySnapshot>,
    refresh_lock: tokio::sync::Mutex<()>,
}

impl RoomRegistry {
    pub fn new(
        gateway: Arc<dyn RoomGateway>,
        options: MirrorOptions,
        directory_freshness: std::time::Duration,
    ) -> Self {
        Self {
            gateway,
            options,
            directory_freshness: chrono::Duration::from_std(directory_freshness)
                .unwrap_or(chrono::Duration::MAX),
            rooms: DashMap::new(),
            order: RwLock::new(Vec::new()),
            directory: ArcSwap::from_pointee(DirectorySnapshot::default()),
            refresh_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Existing mirror for `room_id`, or a new uninitialized one.
    pub fn get_room(&self, room_id: &str) -> Arc<RoomMirror> {
        if let Some(room) = self.rooms.get(room_id) {
            return Arc::clone(room.value());
        }

        match self.rooms.entry(room_id.to_owned()) {
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                let room = Arc::new(RoomMirror::new(
                    room_id,
                    Arc::clone(&self.gateway),
                    self.options,
                ));
                let mut order = self.order.write();
                order.push(Arc::clone(&room));
                metrics::set_known_rooms(order.len());
                entry.insert(Arc::clone(&room));
                debug!(room_id, "Registered room mirror");
                room
            }
        }
    }

    /// Known rooms in insertion order, `skip..end`. `end = -1` means all
    /// remaining. Out-of-range bounds are clamped.
    pub fn get_room_list(&self, skip: usize, end: isize) -> Vec<Arc<RoomMirror>> {
        let order = self.order.read();
        let (start, stop) = clamp_range(order.len(), skip, end);
        order[start..stop].to_vec()
    }

    pub fn room_count(&self) -> usize {
        self.order.read().len()
    }

    /// Refresh the public directory.
    ///
    /// Without `force`, a snapshot still inside its freshness window is kept.
    /// On failure the previous snapshot stays in place.
    #[instrument(skip(self))]
    pub async fn load_public_rooms(&self, force: bool) -> Result<(), GatewayError> {
        let _refresh = self.refresh_lock.lock().await;

        if !force && self.directory.load().is_fresh(Utc::now(), self.directory_freshness) {
            debug!("Public room directory still fresh, skipping refresh");
            return Ok(());
        }

        let entries = self.gateway.fetch_public_directory().await.map_err(|err| {
            warn!(error = %err, "Failed to load public room directory");
            err
        })?;

        info!(rooms = entries.len(), "Loaded public room directory");
        metrics::set_directory_size(entries.len());
        self.directory
            .store(Arc::new(DirectorySnapshot::new(entries, Utc::now())));
        Ok(())
    }

    /// The current directory snapshot.
    pub fn public_rooms(&self) -> Arc<DirectorySnapshot> {
        self.directory.load_full()
    }

    /// Directory entries `skip..end` of the current snapshot.
    pub fn public_room_page(&self, skip: usize, end: isize) -> Vec<PublicRoomEntry> {
        let snapshot = self.directory.load();
        let (start, stop) = clamp_range(snapshot.entries.len(), skip, end);
        snapshot.entries[start..stop].to_vec()
    }

    /// Whether `room_id` is listed in the current directory.
    pub fn is_public(&self, room_id: &str) -> bool {
        self.directory.load().contains(room_id)
    }
}

fn clamp_range(len: usize, skip: usize, end: isize) -> (usize, usize) {
    let stop = usize::try_from(end).map_or(len, |end| end.min(len));
    (skip.min(stop), stop)
}
