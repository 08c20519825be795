//! Error types for the billx-core library.
//!
//! The extraction pipeline itself never fails on well-formed tokens; these
//! errors only surface at the edges, when token files or configuration are
//! read from disk.

use thiserror::Error;

/// Main error type for the billx library.
#[derive(Error, Debug)]
pub enum BillxError {
    /// Token input could not be read or understood.
    #[error("input error: {0}")]
    Input(#[from] InputError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to recognition token input.
#[derive(Error, Debug)]
pub enum InputError {
    /// The token document is not valid JSON of the expected shape.
    #[error("failed to parse token document: {0}")]
    Parse(String),

    /// Page numbers start at 1.
    #[error("invalid page number: {0}")]
    InvalidPageNumber(u32),
}

/// Errors related to configuration files.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// A configuration value is out of range.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Result type for the billx library.
pub type Result<T> = std::result::Result<T, BillxError>;
