//! Shared rate-limit bookkeeping.
//!
//! One [`RateLimitState`] tracks the quota window of one endpoint class.
//! It is refreshed from the metadata of every response and consulted
//! before every call; when the window is exhausted the caller sleeps
//! until the advertised reset, never past it.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::models::RateLimitSnapshot;

/// Tracked quota for one endpoint class.
///
/// Starts empty (nothing known, no waiting) until the first response
/// metadata is observed.
#[derive(Debug, Clone, Copy, Default)]
pub struct RateLimitState {
    remaining: Option<u32>,
    reset_at: Option<DateTime<Utc>>,
}

impl RateLimitState {
    /// Create an empty state for an endpoint class not yet called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the quota metadata from the latest response.
    pub fn observe(&mut self, snapshot: RateLimitSnapshot) {
        self.remaining = Some(snapshot.remaining);
        self.reset_at = Some(snapshot.reset_at);
    }

    /// How long the next call must wait for the window to reset.
    ///
    /// `None` when quota remains, when nothing is known yet, or when the
    /// advertised reset is already past.
    pub fn wait_before_call(&self) -> Option<Duration> {
        self.wait_before_call_at(Utc::now())
    }

    fn wait_before_call_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.remaining? > 0 {
            return None;
        }
        let reset_at = self.reset_at?;
        (reset_at - now).to_std().ok().filter(|d| !d.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn snapshot(remaining: u32, reset_in_secs: i64, now: DateTime<Utc>) -> RateLimitSnapshot {
        RateLimitSnapshot {
            remaining,
            reset_at: now + TimeDelta::seconds(reset_in_secs),
        }
    }

    #[test]
    fn test_fresh_state_never_waits() {
        assert_eq!(RateLimitState::new().wait_before_call(), None);
    }

    #[test]
    fn test_quota_left_never_waits() {
        let now = Utc::now();
        let mut state = RateLimitState::new();
        state.observe(snapshot(3, 900, now));
        assert_eq!(state.wait_before_call_at(now), None);
    }

    #[test]
    fn test_exhausted_waits_until_reset() {
        let now = Utc::now();
        let mut state = RateLimitState::new();
        state.observe(snapshot(0, 60, now));

        let wait = state.wait_before_call_at(now).unwrap();
        assert_eq!(wait, Duration::from_secs(60));
    }

    #[test]
    fn test_past_reset_does_not_wait() {
        let now = Utc::now();
        let mut state = RateLimitState::new();
        state.observe(snapshot(0, -5, now));
        assert_eq!(state.wait_before_call_at(now), None);
    }

    #[test]
    fn test_observe_refreshes_window() {
        let now = Utc::now();
        let mut state = RateLimitState::new();
        state.observe(snapshot(0, 60, now));
        assert!(state.wait_before_call_at(now).is_some());

        state.observe(snapshot(180, 900, now));
        assert_eq!(state.wait_before_call_at(now), None);
    }
}
