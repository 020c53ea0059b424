//! Rate limiting logic and state management.

mod record;
mod refresh;
mod registry;
mod window;

pub use record::{LimitRecord, LimitState};
pub use refresh::{RefreshHandle, REFRESH_PERIOD};
pub use registry::LimiterRegistry;
pub use window::SlidingWindowLimiter;
