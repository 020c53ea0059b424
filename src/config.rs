//! Configuration management for floodgate.
//!
//! Two layers: `LimitConfig` is the immutable, fully-resolved description
//! of one limiter that callers construct in code, and `FloodgateConfig` is
//! the YAML-file form holding a map of named limit rules plus storage
//! settings.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{FloodgateError, Result};

/// Prefix used when deriving a storage key from a limit name.
const STORAGE_KEY_PREFIX: &str = "ratelimit";

/// Fully-resolved configuration for one limiter (immutable once built).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitConfig {
    /// Identifier distinguishing independent limiters.
    pub name: String,
    /// Maximum actions allowed per window. Zero means "always reject".
    pub max_count: u32,
    /// Length of the trailing window.
    pub window: Duration,
    /// Key under which this limiter's record is persisted.
    pub storage_key: String,
}

impl LimitConfig {
    /// Create a config with a storage key derived from the name.
    pub fn new(name: impl Into<String>, max_count: u32, window: Duration) -> Self {
        let name = name.into();
        let storage_key = format!("{}:{}", STORAGE_KEY_PREFIX, name);
        Self {
            name,
            max_count,
            window,
            storage_key,
        }
    }

    /// Override the derived storage key.
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Window length in milliseconds.
    pub fn window_millis(&self) -> u64 {
        self.window.as_millis() as u64
    }

    /// Conventional limit for feedback submissions: 3 per 5 minutes.
    pub fn feedback_submission() -> Self {
        Self::new("feedback_submission", 3, Duration::from_secs(5 * 60))
    }

    /// Conventional limit for changelog creation: 5 per hour.
    pub fn changelog_creation() -> Self {
        Self::new("changelog_creation", 5, Duration::from_secs(3600))
    }

    /// Conventional general API limit: 100 per minute.
    pub fn api_general() -> Self {
        Self::new("api_general", 100, Duration::from_secs(60))
    }
}

/// Time unit for configured windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowUnit {
    Second,
    Minute,
    Hour,
    Day,
}

impl WindowUnit {
    /// Duration of one unit.
    pub fn duration(&self) -> Duration {
        match self {
            WindowUnit::Second => Duration::from_secs(1),
            WindowUnit::Minute => Duration::from_secs(60),
            WindowUnit::Hour => Duration::from_secs(3600),
            WindowUnit::Day => Duration::from_secs(86400),
        }
    }
}

/// A single named limit rule as it appears in configuration files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitRule {
    /// Maximum actions allowed per window.
    pub max_count: u32,
    /// How many units the window spans (defaults to 1).
    #[serde(default = "default_per")]
    pub per: u64,
    /// The time unit of the window.
    pub unit: WindowUnit,
    /// Optional explicit storage key (defaults to a name-derived key).
    #[serde(default)]
    pub storage_key: Option<String>,
}

fn default_per() -> u64 {
    1
}

impl LimitRule {
    /// Resolve this rule into a `LimitConfig` under the given name.
    pub fn resolve(&self, name: &str) -> Result<LimitConfig> {
        if self.per == 0 {
            return Err(FloodgateError::Config(format!(
                "limit '{}' has a zero-length window",
                name
            )));
        }
        let window = Duration::from_secs(self.unit.duration().as_secs() * self.per);
        let mut config = LimitConfig::new(name, self.max_count, window);
        if let Some(ref key) = self.storage_key {
            config = config.with_storage_key(key.clone());
        }
        Ok(config)
    }
}

/// Storage settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the JSON file backing durable state. `None` means in-memory.
    pub path: Option<String>,
}

/// Main configuration for floodgate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FloodgateConfig {
    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Named limit rules
    #[serde(default)]
    pub limits: HashMap<String, LimitRule>,
}

impl FloodgateConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading floodgate configuration");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| FloodgateError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Resolve the named rule into a `LimitConfig`, if present.
    pub fn limit(&self, name: &str) -> Option<Result<LimitConfig>> {
        self.limits.get(name).map(|rule| rule.resolve(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_storage_key() {
        let config = LimitConfig::new("feedback", 3, Duration::from_secs(300));
        assert_eq!(config.storage_key, "ratelimit:feedback");
        assert_eq!(config.window_millis(), 300_000);
    }

    #[test]
    fn test_storage_key_override() {
        let config = LimitConfig::new("feedback", 3, Duration::from_secs(300))
            .with_storage_key("widget.feedback.v2");
        assert_eq!(config.storage_key, "widget.feedback.v2");
    }

    #[test]
    fn test_presets() {
        let feedback = LimitConfig::feedback_submission();
        assert_eq!(feedback.max_count, 3);
        assert_eq!(feedback.window_millis(), 300_000);

        let changelog = LimitConfig::changelog_creation();
        assert_eq!(changelog.max_count, 5);
        assert_eq!(changelog.window_millis(), 3_600_000);

        let api = LimitConfig::api_general();
        assert_eq!(api.max_count, 100);
        assert_eq!(api.window_millis(), 60_000);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
storage:
  path: /tmp/floodgate.json
limits:
  feedback_submission:
    max_count: 3
    per: 5
    unit: minute
  api_general:
    max_count: 100
    unit: minute
"#;
        let config = FloodgateConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.storage.path.as_deref(), Some("/tmp/floodgate.json"));

        let feedback = config.limit("feedback_submission").unwrap().unwrap();
        assert_eq!(feedback.max_count, 3);
        assert_eq!(feedback.window, Duration::from_secs(300));

        let api = config.limit("api_general").unwrap().unwrap();
        assert_eq!(api.window, Duration::from_secs(60));
        assert_eq!(api.storage_key, "ratelimit:api_general");
    }

    #[test]
    fn test_zero_window_rejected() {
        let yaml = r#"
limits:
  bad:
    max_count: 1
    per: 0
    unit: second
"#;
        let config = FloodgateConfig::from_yaml(yaml).unwrap();
        assert!(config.limit("bad").unwrap().is_err());
    }

    #[test]
    fn test_unknown_limit_is_none() {
        let config = FloodgateConfig::new();
        assert!(config.limit("missing").is_none());
    }

    #[test]
    fn test_unparsable_yaml_is_config_error() {
        let result = FloodgateConfig::from_yaml(": not yaml: [");
        assert!(matches!(result, Err(FloodgateError::Config(_))));
    }
}
