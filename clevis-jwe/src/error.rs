//! Error types for JWE dispatch

use thiserror::Error;

/// Dispatch error types
///
/// Every variant is terminal: the dispatcher reports one line on stderr and
/// exits non-zero. Nothing is retried or recovered into a degraded mode.
#[derive(Debug, Error)]
pub enum ClevisError {
    /// Invoked with unexpected command-line arguments.
    #[error("Usage: clevis-decrypt < JWE")]
    Usage,
    /// Standard input was unreadable or not valid JSON.
    #[error("Invalid JWE input: {0}")]
    Parse(#[from] serde_json::Error),
    /// Document does not have the structural shape of a JWE.
    #[error("Error merging JWE header")]
    Header,
    /// Merged header lacks a `clevis.pin` string.
    #[error("JWE header missing clevis.pin")]
    MissingPin,
    /// Pin identifier is empty or violates the `[A-Za-z0-9-]` character set.
    #[error("Invalid pin name: {0:?}")]
    InvalidPin(String),
    /// Resolved plugin path exceeds the platform path limit.
    #[error("Plugin path exceeds maximum length")]
    PathTooLong,
    /// Pipe or process-creation primitive failed.
    #[error("Failed to spawn pin plugin: {0}")]
    Spawn(String),
    /// The pin plugin executable could not be invoked.
    #[error("Failed to execute pin plugin {path}: {source}")]
    Exec {
        /// Resolved path of the plugin that could not be run.
        path: String,
        /// Underlying operating system error.
        source: std::io::Error,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ClevisError>;
