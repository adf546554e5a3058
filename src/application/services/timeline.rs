//! Cached Timeline
//!
//! The contiguous window of a room's history held by a mirror. Events are
//! stored in fetch order (newest first) so both forward sync and backfill are
//! cheap pushes on either end of a deque. Callers only ever see display order
//! (oldest first), produced by [`into_display_order`].

use std::collections::{HashSet, VecDeque};

use serde::Serialize;

use crate::domain::Event;

/// Convert a run of events from fetch order (newest first) to display order
/// (oldest first).
pub fn into_display_order(mut events: Vec<Event>) -> Vec<Event> {
    events.reverse();
    events
}

/// A page of events resolved against an anchor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventPage {
    /// Events in display order: oldest first, closest to the anchor last
    pub events: Vec<Event>,

    /// Event the page was resolved against. Set to the newest cached event
    /// when the request carried no anchor.
    pub anchor: Option<String>,

    /// How far back from the anchor the page starts
    pub offset: usize,

    pub page_size: usize,
}

impl EventPage {
    /// Whether the oldest returned event is the room's creation event, i.e.
    /// there is no more history behind this page.
    pub fn reached_room_create(&self) -> bool {
        self.events.first().is_some_and(Event::is_room_create)
    }
}

/// Outcome of resolving a page against the cache alone.
#[derive(Debug)]
pub(crate) enum Lookup {
    Page(EventPage),
    AnchorMissing,
    NeedOlder { missing: usize },
}

/// Contiguous, duplicate-free window of room history.
#[derive(Debug, Default)]
pub(crate) struct Timeline {
    /// Newest first
    events: VecDeque<Event>,
    event_ids: HashSet<String>,
    /// No history exists behind the oldest cached event
    reached_start: bool,
}

impl Timeline {
    /// Build from a window delivered oldest first.
    ///
    /// An empty window says nothing about where history starts, so it leaves
    /// the start unknown.
    pub(crate) fn from_window(window: Vec<Event>) -> Self {
        let mut timeline = Self::default();
        for event in window {
            timeline.push_newer(event);
        }
        timeline.reached_start = timeline
            .events
            .back()
            .is_some_and(Event::is_room_create);
        timeline
    }

    pub(crate) fn len(&self) -> usize {
        self.events.len()
    }

    pub(crate) fn reached_start(&self) -> bool {
        self.reached_start
    }

    pub(crate) fn mark_start_reached(&mut self) {
        self.reached_start = true;
    }

    pub(crate) fn oldest_id(&self) -> Option<&str> {
        self.events.back().map(|event| event.event_id.as_str())
    }

    pub(crate) fn contains(&self, event_id: &str) -> bool {
        self.event_ids.contains(event_id)
    }

    /// Distance of an event from the newest end.
    pub(crate) fn position(&self, event_id: &str) -> Option<usize> {
        if !self.contains(event_id) {
            return None;
        }
        self.events.iter().position(|event| event.event_id == event_id)
    }

    /// Add an event at the newest end. Returns `false` for a duplicate.
    pub(crate) fn push_newer(&mut self, event: Event) -> bool {
        if !self.event_ids.insert(event.event_id.clone()) {
            return false;
        }
        self.events.push_front(event);
        true
    }

    /// Append a batch fetched from before `before`, newest first.
    ///
    /// The batch is only joined on at the current oldest event so the window
    /// stays contiguous. Returns the number of events added.
    pub(crate) fn append_older(&mut self, before: &str, batch: Vec<Event>) -> usize {
        let skip = match self.oldest_id() {
            Some(oldest) if oldest == before => 0,
            Some(oldest) => match batch.iter().position(|event| event.event_id == oldest) {
                Some(idx) => idx + 1,
                None => return 0,
            },
            None => return 0,
        };

        let mut added = 0;
        for event in batch.into_iter().skip(skip) {
            if !self.event_ids.insert(event.event_id.clone()) {
                continue;
            }
            if event.is_room_create() {
                self.reached_start = true;
            }
            self.events.push_back(event);
            added += 1;
        }
        added
    }

    /// Resolve `page_size` events starting `offset` events back from the anchor.
    ///
    /// An empty anchor means the newest cached event.
    pub(crate) fn lookup(&self, anchor: &str, offset: usize, page_size: usize) -> Lookup {
        let anchor_idx = if anchor.is_empty() {
            0
        } else {
            match self.position(anchor) {
                Some(idx) => idx,
                None => return Lookup::AnchorMissing,
            }
        };

        let start = anchor_idx.saturating_add(offset);
        let end = start.saturating_add(page_size);
        let len = self.events.len();
        if end > len && !self.reached_start {
            return Lookup::NeedOlder { missing: end - len };
        }

        let window: Vec<Event> = self
            .events
            .range(start.min(len)..end.min(len))
            .cloned()
            .collect();

        Lookup::Page(EventPage {
            events: into_display_order(window),
            anchor: self.events.get(anchor_idx).map(|event| event.event_id.clone()),
            offset,
            page_size,
        })
    }

    /// The whole cached window in display order.
    pub(crate) fn to_display_vec(&self) -> Vec<Event> {
        into_display_order(self.events.iter().cloned().collect())
    }
}
