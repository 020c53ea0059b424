//! The sliding-window limiter.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::LimitConfig;
use crate::storage::StorageBackend;

use super::record::{LimitRecord, LimitState};

/// A rate limiter counting actions in a trailing time window, with its
/// count persisted so it survives a process restart within the window.
///
/// Decisions are synchronous and strictly ordered within one process.
/// Across processes sharing the same storage there is no mutual
/// exclusion; two of them may both observe capacity and both proceed.
/// That is an accepted limitation of client-local throttling, not
/// something this type tries to paper over.
pub struct SlidingWindowLimiter {
    config: LimitConfig,
    storage: Arc<dyn StorageBackend>,
    clock: Arc<dyn Clock>,
    /// Last derived state, refreshed on every operation.
    state: RwLock<LimitState>,
}

impl SlidingWindowLimiter {
    /// Create a limiter over the given storage, using the system clock.
    pub fn new(config: LimitConfig, storage: Arc<dyn StorageBackend>) -> Self {
        Self::with_clock(config, storage, Arc::new(SystemClock))
    }

    /// Create a limiter with an explicit clock.
    pub fn with_clock(
        config: LimitConfig,
        storage: Arc<dyn StorageBackend>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let now = clock.now_millis();
        let record = Self::load_at(&config, storage.as_ref(), now);
        let state = LimitState::derive(&record, config.max_count, now);
        Self {
            config,
            storage,
            clock,
            state: RwLock::new(state),
        }
    }

    /// The configuration this limiter was built with.
    pub fn config(&self) -> &LimitConfig {
        &self.config
    }

    /// Snapshot of the last derived state.
    pub fn state(&self) -> LimitState {
        *self.state.read()
    }

    /// Read and reconcile the persisted record.
    ///
    /// Absent or corrupt values yield a fresh empty record; rollover and
    /// stale-timestamp purging happen here. The stored value is not
    /// rewritten until the next mutation.
    fn load_at(config: &LimitConfig, storage: &dyn StorageBackend, now: u64) -> LimitRecord {
        let window = config.window_millis();
        match storage.get(&config.storage_key) {
            Some(raw) => match LimitRecord::parse(&raw) {
                Some(record) => record.reconcile(now, window),
                None => {
                    debug!(key = %config.storage_key, "Corrupt limit record, treating as empty");
                    LimitRecord::empty(now, window)
                }
            },
            None => LimitRecord::empty(now, window),
        }
    }

    /// Persist `record` verbatim. A failed write is logged and swallowed;
    /// the cached state still reflects the record for this session.
    fn save(&self, record: &LimitRecord) {
        let serialized = match serde_json::to_string(record) {
            Ok(s) => s,
            Err(e) => {
                warn!(key = %self.config.storage_key, error = %e, "Failed to serialize limit record");
                return;
            }
        };
        if !self.storage.set(&self.config.storage_key, &serialized) {
            warn!(
                key = %self.config.storage_key,
                "Failed to persist limit record, state is session-only"
            );
        }
    }

    /// Recompute the derived state from persisted data and the clock.
    ///
    /// Non-mutating with respect to storage, and idempotent: without an
    /// intervening `record_request` only `time_until_reset` changes, and
    /// only because real time passed.
    pub fn refresh(&self) -> LimitState {
        let now = self.clock.now_millis();
        let record = Self::load_at(&self.config, self.storage.as_ref(), now);
        let state = LimitState::derive(&record, self.config.max_count, now);
        *self.state.write() = state;
        state
    }

    /// Atomically (within this process) check capacity and record one
    /// action.
    ///
    /// Returns `true` and persists the action's timestamp if capacity
    /// remains; returns `false` and records nothing if the window is
    /// already full (or `max_count` is zero). Either way the cached
    /// state is recomputed once.
    pub fn record_request(&self) -> bool {
        let now = self.clock.now_millis();
        let mut record = Self::load_at(&self.config, self.storage.as_ref(), now);

        trace!(
            name = %self.config.name,
            used = record.count(),
            limit = self.config.max_count,
            "Checking rate limit"
        );

        // A zero max_count rejects everything: count() >= 0 always holds.
        if record.count() >= self.config.max_count as usize {
            debug!(
                name = %self.config.name,
                limit = self.config.max_count,
                "Rate limit exceeded"
            );
            *self.state.write() = LimitState::derive(&record, self.config.max_count, now);
            return false;
        }

        record.requests.push(now);
        self.save(&record);
        *self.state.write() = LimitState::derive(&record, self.config.max_count, now);
        true
    }
}
