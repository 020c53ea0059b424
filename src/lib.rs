//! Floodgate - Best-Effort Client-Local Rate Limiting
//!
//! This crate implements a sliding-window rate limiter whose state is
//! persisted through a pluggable key-value store, so counts survive a
//! process restart within the active window. It is a UX throttle, not a
//! security control: there is no cross-process coordination and no
//! server-side authority, and its failure paths deliberately degrade to
//! "permit as if no history" or "deny due to capacity" rather than error.

pub mod clock;
pub mod config;
pub mod error;
pub mod limiter;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{FloodgateConfig, LimitConfig, LimitRule, WindowUnit};
pub use error::{FloodgateError, Result};
pub use limiter::{LimitRecord, LimitState, LimiterRegistry, RefreshHandle, SlidingWindowLimiter};
pub use storage::{FileStorage, MemoryStorage, StorageBackend};
