//! Error types for advertising configuration loading.
//!
//! Event handling never fails: a broken break simply contributes no ad.
//! Only reading and parsing configuration can return an error.

use thiserror::Error;

/// Result type for cueFlow operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Reading a configuration file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration JSON could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
