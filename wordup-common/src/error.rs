//! Common error types for wordup

use thiserror::Error;

/// Common result type for wordup operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by wordup crates
#[derive(Error, Debug)]
pub enum Error {
    /// Config file exists but could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
