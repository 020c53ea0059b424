//! Key-value persistence substrate for limiter state.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Capability trait for the persistence substrate.
///
/// Reads and writes are synchronous local operations; no network I/O
/// belongs behind this trait. A failed `set` reports `false` rather than
/// an error, matching the "quota errors are swallowed" contract — the
/// limiter keeps working, it just loses durability for that write.
pub trait StorageBackend: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`. Returns `false` if the write failed
    /// (capacity, I/O); the failure is not propagated further.
    fn set(&self, key: &str, value: &str) -> bool;

    /// Remove the value stored under `key`, if any.
    fn remove(&self, key: &str);
}
