//! Persisted limit records and the derived state exposed to callers.

use serde::{Deserialize, Serialize};

/// The persisted state of one limiter, keyed by its storage key.
///
/// Wire shape is `{"requests": [epoch_ms, ...], "resetTime": epoch_ms}`
/// and must round-trip exactly. `requests` holds the instants at which
/// actions were recorded, in insertion (= chronological) order;
/// `reset_time` is the deadline of the current window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitRecord {
    /// Epoch-millisecond instants of recorded actions.
    pub requests: Vec<u64>,
    /// Epoch-millisecond deadline of the current window.
    #[serde(rename = "resetTime")]
    pub reset_time: u64,
}

impl LimitRecord {
    /// A fresh record whose window starts now.
    pub fn empty(now: u64, window_millis: u64) -> Self {
        Self {
            requests: Vec::new(),
            reset_time: now.saturating_add(window_millis),
        }
    }

    /// Parse a persisted value. Malformed content yields `None`; the
    /// caller treats that as an absent record, never as an error.
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    /// Reconcile a persisted record against the current time.
    ///
    /// Past-deadline records roll over to a fresh window. Otherwise
    /// timestamps older than the window are purged. The only staleness
    /// test is `now - ts >= window`, so a backward clock jump degrades
    /// gracefully rather than being special-cased.
    pub fn reconcile(mut self, now: u64, window_millis: u64) -> Self {
        if now >= self.reset_time {
            return Self::empty(now, window_millis);
        }
        self.requests
            .retain(|&ts| now.saturating_sub(ts) < window_millis);
        self
    }

    /// Number of actions currently recorded.
    pub fn count(&self) -> usize {
        self.requests.len()
    }
}

/// Derived, never-persisted view of a limiter, recomputed on each refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitState {
    /// Whether a new action would currently be permitted.
    pub can_proceed: bool,
    /// Remaining capacity in the current window, clamped at zero.
    pub remaining_requests: u32,
    /// Epoch-millisecond deadline of the current window.
    pub reset_time: u64,
    /// Milliseconds until the window rolls over, clamped at zero.
    pub time_until_reset: u64,
}

impl LimitState {
    /// Derive the state for `record` under a `max_count` cap at `now`.
    ///
    /// A persisted record longer than `max_count` (e.g. after the cap was
    /// lowered across a deploy) reads as "no remaining capacity".
    pub fn derive(record: &LimitRecord, max_count: u32, now: u64) -> Self {
        let remaining = (max_count as u64).saturating_sub(record.count() as u64) as u32;
        Self {
            can_proceed: remaining > 0,
            remaining_requests: remaining,
            reset_time: record.reset_time,
            time_until_reset: record.reset_time.saturating_sub(now),
        }
    }
}
