//! Background Scheduler
//!
//! Two independent periodic tasks keep the registry fresh:
//!
//! - **Forward sync**: every tick, advances every known room past its sync
//!   cursor, one room at a time.
//! - **Directory refresh**: every tick, reloads the public room directory
//!   unless the cached one is still fresh.
//!
//! Failures are logged and retried on the next tick; there is never a caller
//! waiting on them.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::registry::RoomRegistry;
use crate::infrastructure::metrics;

/// Run one forward-sync pass over every known room.
///
/// Returns the total number of new events cached. A failing room does not
/// stop the pass.
pub async fn forward_sync_tick(registry: &RoomRegistry) -> usize {
    let rooms = registry.get_room_list(0, -1);
    let mut total = 0;

    for room in rooms {
        match room.lazy_update_room().await {
            Ok(added) => total += added,
            Err(err) => {
                metrics::record_forward_sync_failure();
                warn!(room_id = room.id(), error = %err, "Forward sync failed");
            }
        }
    }

    debug!(new_events = total, "Forward sync pass complete");
    total
}

/// Spawn the forward-sync loop. The first pass runs one interval after start.
pub fn spawn_forward_sync(registry: Arc<RoomRegistry>, period: Duration) -> JoinHandle<()> {
    info!(period_secs = period.as_secs(), "Starting forward sync loop");
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            forward_sync_tick(&registry).await;
        }
    })
}

/// Spawn the directory refresh loop. The first refresh runs one interval
/// after start; the startup load is forced separately.
pub fn spawn_directory_refresh(registry: Arc<RoomRegistry>, period: Duration) -> JoinHandle<()> {
    info!(period_secs = period.as_secs(), "Starting directory refresh loop");
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            // Failure is already logged by the registry.
            let _ = registry.load_public_rooms(false).await;
        }
    })
}
