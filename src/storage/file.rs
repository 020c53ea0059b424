//! File-backed storage backing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, warn};

use super::StorageBackend;

/// A key-value store persisted as a single JSON document on disk.
///
/// The whole document is read once at open and rewritten on every `set`,
/// which is fine at the scale of a handful of limiter records. Write
/// failures are logged and reported as `false`; the in-memory view keeps
/// the new value so the current process still sees it.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
}

impl FileStorage {
    /// Open a store at `path`, loading any existing document.
    ///
    /// A missing or unparsable document is treated as empty, never as an
    /// error.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Unparsable state file, starting empty");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unreadable state file, starting empty");
                HashMap::new()
            }
        };

        debug!(path = %path.display(), keys = entries.len(), "Opened file storage");

        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the backing document from the current in-memory view.
    fn persist(&self, entries: &HashMap<String, String>) -> bool {
        let serialized = match serde_json::to_string(entries) {
            Ok(s) => s,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to serialize state");
                return false;
            }
        };

        // Write via a sibling temp file so a crash mid-write can't leave a
        // truncated document behind.
        let tmp = self.path.with_extension("tmp");
        if let Err(e) = std::fs::write(&tmp, &serialized) {
            warn!(path = %tmp.display(), error = %e, "Failed to write state file");
            return false;
        }
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to replace state file");
            return false;
        }
        true
    }
}

impl StorageBackend for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> bool {
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.write();
        if entries.remove(key).is_some() {
            self.persist(&entries);
        }
    }
}
