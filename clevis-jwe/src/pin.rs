//! Pin identifier validation and plugin path construction

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::error::{ClevisError, Result};
use crate::limits::MAX_PATH_LEN;

/// A validated pin identifier.
///
/// Invariant: non-empty, every byte an ASCII letter, digit, or hyphen. The
/// identifier comes from untrusted JWE metadata and is later joined into a
/// filesystem path and executed, so this character set is the barrier
/// against path traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinName(String);

impl PinName {
    /// Validate a raw identifier.
    pub fn new(raw: &str) -> Result<Self> {
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
            return Err(ClevisError::InvalidPin(raw.to_string()));
        }
        Ok(PinName(raw.to_string()))
    }

    /// Extract and validate the pin recorded at `clevis.pin` in a merged
    /// JWE header.
    pub fn from_header(header: &Map<String, Value>) -> Result<Self> {
        let pin = header
            .get("clevis")
            .and_then(|clevis| clevis.get("pin"))
            .and_then(Value::as_str)
            .ok_or(ClevisError::MissingPin)?;
        Self::new(pin)
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PinName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolve the executable path for a pin: `<cmd_dir>/pins/<pin>`.
///
/// Fails rather than truncates when the result would not fit in
/// [`MAX_PATH_LEN`] (the limit counts the trailing NUL, so a path of
/// exactly `MAX_PATH_LEN - 1` bytes is the longest representable).
pub fn plugin_path(cmd_dir: &Path, pin: &PinName) -> Result<PathBuf> {
    let path = cmd_dir.join("pins").join(pin.as_str());
    if path.as_os_str().len() >= MAX_PATH_LEN {
        return Err(ClevisError::PathTooLong);
    }
    Ok(path)
}
