//! Error types for mocktcp
//!
//! Provides a unified error type for all operations, classified the way the
//! run controller needs to act on them.

use thiserror::Error;

/// Result type alias using MockError
pub type Result<T> = std::result::Result<T, MockError>;

/// Unified error type for mocktcp operations
#[derive(Debug, Error)]
pub enum MockError {
    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(String),

    // -------------------------------------------------------------------------
    // Script Errors
    // -------------------------------------------------------------------------
    #[error("Invalid payload encoding {0:?}, only could be [string|byte]")]
    InvalidEncoding(String),

    #[error("Invalid hex payload: {0}")]
    InvalidHexPayload(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Test Verdicts
    // -------------------------------------------------------------------------
    #[error("Response to request #{index} did not contain expected {expected:?}")]
    MatchFailure { index: usize, expected: String },
}

/// Coarse classification used for exit statuses and log routing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The script itself is invalid
    Config,

    /// Resolve, dial, bind, read or write failed
    Transport,

    /// The peer answered, but not with what the script expected
    MatchFailure,
}

impl MockError {
    pub fn class(&self) -> ErrorClass {
        match self {
            MockError::Io(_) | MockError::Network(_) => ErrorClass::Transport,
            MockError::InvalidEncoding(_)
            | MockError::InvalidHexPayload(_)
            | MockError::Config(_) => ErrorClass::Config,
            MockError::MatchFailure { .. } => ErrorClass::MatchFailure,
        }
    }

    /// Process exit status for this error
    ///
    /// A match failure maps to 255, which is how a shell observes `exit(-1)`.
    pub fn exit_code(&self) -> i32 {
        match self.class() {
            ErrorClass::Transport => 1,
            ErrorClass::Config => 2,
            ErrorClass::MatchFailure => 255,
        }
    }
}
