//! Timeline data structures.
//!
//! Posts are kept as opaque JSON documents: the crawler archives them
//! verbatim and only ever inspects the `id` field to derive pagination
//! cursors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One post from an account's timeline, stored verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Post(pub serde_json::Value);

impl Post {
    /// The numeric post id, if the document carries one.
    pub fn id(&self) -> Option<u64> {
        self.0.get("id").and_then(serde_json::Value::as_u64)
    }
}

/// Cursor for requesting the next older page.
///
/// The wire meaning is "only return posts with id <= this value"; the
/// endpoint derives it from the oldest post of the previous page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor(pub u64);

/// Quota metadata parsed from one endpoint response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSnapshot {
    /// Calls left in the current window
    pub remaining: u32,

    /// When the window resets
    pub reset_at: DateTime<Utc>,
}

/// One bounded chunk of a paginated timeline.
#[derive(Debug, Clone)]
pub struct TimelinePage {
    /// Posts in this page, newest first
    pub posts: Vec<Post>,

    /// Cursor for the next older page; `None` means no further pages
    pub next_cursor: Option<PageCursor>,

    /// Quota metadata, when the response carried it
    pub rate_limit: Option<RateLimitSnapshot>,
}
