//! Clevis JWE primitives - the decryption dispatcher's data layer
//!
//! This crate provides everything the `clevis-decrypt` dispatcher needs to
//! decide which pin plugin a JWE belongs to, with no process or environment
//! side effects. It includes:
//!
//! - Merged header construction (protected/unprotected/per-recipient)
//! - Pin identifier validation
//! - Plugin path construction with platform limits
//! - Canonical JSON serialization
//! - Error types

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod canonical;
pub mod error;
pub mod header;
pub mod limits;
pub mod pin;

// Re-export commonly used items
pub use canonical::to_canonical_json;
pub use error::{ClevisError, Result};
pub use header::merge_header;
pub use pin::{plugin_path, PinName};
