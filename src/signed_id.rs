//! Signed-ID envelope, the external signer's wire format.
//!
//! `signedId/` followed by unpadded base64url of a JSON object
//! `{ "id": "...", "metadata": { k: v, ... } }`. The signer here is
//! explicitly **not** cryptographic, callers must not rely on its
//! integrity, only its shape.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub const SIGNED_ID_PREFIX: &str = "signedId/";

#[derive(Error, Debug)]
pub enum SignedIdError {
    #[error("missing 'signedId/' prefix")]
    InvalidPrefix,
    #[error("invalid base64 envelope: {0}")]
    InvalidBase64(String),
    #[error("invalid json envelope: {0}")]
    InvalidJson(String),
    #[error("envelope serialisation failed: {0}")]
    SerializationFailure(String),
}

/// The JSON payload carried inside a signed-ID envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignedIdPayload {
    pub id: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Wrap a blob identifier string (and arbitrary metadata) into a
/// `signedId/...` envelope. Always succeeds unless JSON serialisation
/// itself fails, which cannot happen for this payload shape but is
/// propagated rather than unwrapped, matching the `SerializationFailure`
/// kind below.
pub fn wrap(id: &str, metadata: BTreeMap<String, String>) -> Result<String, SignedIdError> {
    let payload = SignedIdPayload { id: id.to_string(), metadata };
    let json = serde_json::to_vec(&payload)
        .map_err(|e| SignedIdError::SerializationFailure(e.to_string()))?;
    Ok(format!("{SIGNED_ID_PREFIX}{}", URL_SAFE_NO_PAD.encode(json)))
}

/// Unwrap a `signedId/...` envelope. Performs no integrity check, the
/// envelope is not cryptographically signed, it is only shaped this way.
pub fn unwrap(envelope: &str) -> Result<SignedIdPayload, SignedIdError> {
    let encoded = envelope
        .strip_prefix(SIGNED_ID_PREFIX)
        .ok_or(SignedIdError::InvalidPrefix)?;
    let json = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|e| SignedIdError::InvalidBase64(e.to_string()))?;
    serde_json::from_slice(&json).map_err(|e| SignedIdError::InvalidJson(e.to_string()))
}
