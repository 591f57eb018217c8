//! JWE header merging
//!
//! A JWE carries header parameters in up to four places: the protected
//! header (base64url-encoded in the compact-friendly serializations), the
//! shared `unprotected` header, a flattened top-level `header`, and one
//! `header` per entry of the general form's `recipients` array. The
//! dispatcher only cares about the union of these, so they are collapsed
//! into one flat object before the pin lookup.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{Map, Value};

use crate::error::{ClevisError, Result};

/// Merge a JWE's header sources into a single flat object.
///
/// Sources are applied in increasing precedence: protected, then
/// `unprotected`, then the flattened `header`, then each recipient's
/// `header`. Per-recipient values override shared ones key by key; the
/// merge is shallow. A JWE with none of the sources present yields an
/// empty object, which is still a merged header (the pin lookup fails
/// later, distinctly).
pub fn merge_header(jwe: &Value) -> Result<Map<String, Value>> {
    let doc = jwe.as_object().ok_or(ClevisError::Header)?;
    let mut merged = Map::new();

    if let Some(protected) = doc.get("protected") {
        let decoded = decode_protected(protected)?;
        merge_source(&mut merged, &decoded)?;
    }
    if let Some(unprotected) = doc.get("unprotected") {
        merge_source(&mut merged, unprotected)?;
    }
    if let Some(header) = doc.get("header") {
        merge_source(&mut merged, header)?;
    }
    if let Some(recipients) = doc.get("recipients") {
        let recipients = recipients.as_array().ok_or(ClevisError::Header)?;
        for recipient in recipients {
            let recipient = recipient.as_object().ok_or(ClevisError::Header)?;
            if let Some(header) = recipient.get("header") {
                merge_source(&mut merged, header)?;
            }
        }
    }

    Ok(merged)
}

fn merge_source(merged: &mut Map<String, Value>, source: &Value) -> Result<()> {
    let source = source.as_object().ok_or(ClevisError::Header)?;
    for (key, value) in source {
        merged.insert(key.clone(), value.clone());
    }
    Ok(())
}

/// The protected header is base64url-encoded (unpadded) JSON in the compact
/// and flattened serializations, but may appear as a plain object in
/// pre-serialization documents. Accept both.
fn decode_protected(protected: &Value) -> Result<Value> {
    match protected {
        Value::Object(_) => Ok(protected.clone()),
        Value::String(encoded) => {
            let raw = URL_SAFE_NO_PAD
                .decode(encoded)
                .map_err(|_| ClevisError::Header)?;
            let value: Value = serde_json::from_slice(&raw).map_err(|_| ClevisError::Header)?;
            if value.is_object() {
                Ok(value)
            } else {
                Err(ClevisError::Header)
            }
        }
        _ => Err(ClevisError::Header),
    }
}
