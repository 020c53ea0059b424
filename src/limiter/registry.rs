//! Registry of named limiters.

use std::sync::Arc;

use dashmap::DashMap;

use crate::clock::{Clock, SystemClock};
use crate::config::LimitConfig;
use crate::storage::StorageBackend;

use super::window::SlidingWindowLimiter;

/// A collection of independent limiters sharing one storage backend.
///
/// Limiters are created lazily on first use and keyed by name. Each one
/// owns its own storage key, so they never interact.
pub struct LimiterRegistry {
    storage: Arc<dyn StorageBackend>,
    clock: Arc<dyn Clock>,
    limiters: DashMap<String, Arc<SlidingWindowLimiter>>,
}

impl LimiterRegistry {
    /// Create a registry over the given storage, using the system clock.
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock))
    }

    /// Create a registry with an explicit clock.
    pub fn with_clock(storage: Arc<dyn StorageBackend>, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            clock,
            limiters: DashMap::new(),
        }
    }

    /// Get the limiter for `config.name`, creating it on first use.
    pub fn get_or_create(&self, config: &LimitConfig) -> Arc<SlidingWindowLimiter> {
        self.limiters
            .entry(config.name.clone())
            .or_insert_with(|| {
                Arc::new(SlidingWindowLimiter::with_clock(
                    config.clone(),
                    self.storage.clone(),
                    self.clock.clone(),
                ))
            })
            .clone()
    }

    /// Look up an already-created limiter by name.
    pub fn get(&self, name: &str) -> Option<Arc<SlidingWindowLimiter>> {
        self.limiters.get(name).map(|entry| entry.clone())
    }

    /// Number of limiters created so far.
    pub fn len(&self) -> usize {
        self.limiters.len()
    }

    /// Whether any limiter has been created.
    pub fn is_empty(&self) -> bool {
        self.limiters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStorage;
    use std::time::Duration;

    fn registry() -> LimiterRegistry {
        LimiterRegistry::with_clock(
            Arc::new(MemoryStorage::new()),
            Arc::new(ManualClock::new(0)),
        )
    }

    #[test]
    fn test_get_or_create_reuses_instances() {
        let registry = registry();
        let config = LimitConfig::new("feedback", 3, Duration::from_secs(300));

        let a = registry.get_or_create(&config);
        let b = registry.get_or_create(&config);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_unknown_is_none() {
        let registry = registry();
        assert!(registry.get("missing").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_named_limiters_are_independent() {
        let registry = registry();
        let feedback = registry.get_or_create(&LimitConfig::feedback_submission());
        let changelog = registry.get_or_create(&LimitConfig::changelog_creation());

        for _ in 0..3 {
            feedback.record_request();
        }

        assert!(!feedback.state().can_proceed);
        assert_eq!(changelog.refresh().remaining_requests, 5);
    }
}
