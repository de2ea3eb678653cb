//! Error types for toolbox operations.

use thiserror::Error;

/// All error types that toolbox operations can produce.
#[derive(Error, Debug)]
pub enum ToolboxError {
    /// Invalid or missing configuration (TOML parse errors, out-of-range values, etc.).
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A user supplied value could not be parsed or is out of range.
    #[error("{0}")]
    InvalidInput(String),

    /// A filesystem I/O operation failed.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// An image could not be decoded or encoded.
    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    /// A report could not be serialized to JSON.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A stego container header is missing or corrupt.
    #[error("{path} has an invalid header: {reason}")]
    InvalidContainer { path: String, reason: String },

    /// The stored container checksum does not match its payload.
    #[error("{path} has an invalid checksum {found} != {expected}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        found: String,
    },

    /// `image stego validate` found a bad container.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// A payload does not fit in the image container.
    #[error("Payload of {requested} byte(s) exceeds container capacity of {capacity} byte(s)")]
    CapacityExceeded { requested: usize, capacity: usize },

    /// `initialize` was run against an image that already carries a valid header.
    #[error("{path} is already a container, refusing to initialize")]
    AlreadyInitialized { path: String },

    /// A required input file or directory does not exist.
    #[error("File {0} does not exist")]
    NotFound(String),

    /// An external program needed by a command is not installed.
    #[error("Required tool '{0}' was not found on PATH")]
    ToolNotFound(String),

    /// An external program exited unsuccessfully.
    #[error("{tool} failed: {reason}")]
    ToolFailed { tool: String, reason: String },
}

/// Convenience type alias for `Result<T, ToolboxError>`.
pub type Result<T> = std::result::Result<T, ToolboxError>;
