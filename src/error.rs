//! Error types for floodgate.

use thiserror::Error;

/// Main error type for floodgate operations.
///
/// Rate limit decisions never produce an error: over-capacity is a normal
/// `can_proceed = false` outcome, and storage failures degrade to empty or
/// non-durable state. These variants cover the surrounding plumbing
/// (configuration loading, CLI I/O).
#[derive(Error, Debug)]
pub enum FloodgateError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage errors surfaced outside the limiter's decision path
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for floodgate operations.
pub type Result<T> = std::result::Result<T, FloodgateError>;
