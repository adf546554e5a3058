//! Request DTOs
//!
//! Query parameters accepted by the view. Numeric values arrive as raw
//! strings so malformed input can fall back to a default instead of
//! rejecting the request.

use serde::Deserialize;

/// `?page=N` for page-numbered listings.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    /// Requested page, 1-based. Missing, malformed or zero means page 1.
    pub fn page(&self) -> usize {
        self.page
            .as_deref()
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|page| *page >= 1)
            .unwrap_or(1)
    }
}

/// `?anchor=EVENT_ID&offset=K` for timeline pages.
#[derive(Debug, Default, Deserialize)]
pub struct TimelineQuery {
    pub anchor: Option<String>,
    pub offset: Option<String>,
}

impl TimelineQuery {
    /// Anchor event ID; empty means the newest event.
    pub fn anchor(&self) -> &str {
        self.anchor.as_deref().map(str::trim).unwrap_or_default()
    }

    /// Offset back from the anchor. Missing or malformed means 0.
    pub fn offset(&self) -> usize {
        self.offset
            .as_deref()
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .unwrap_or(0)
    }
}
