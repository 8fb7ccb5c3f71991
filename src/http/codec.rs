//! JSON codec for request bodies and response payloads.
//!
//! Decoding fails with [`CodecError::MalformedBody`] when the bytes are not JSON or
//! do not fit the target type. Encoding is total for the record types in this crate.

use axum::body::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Content type for every JSON payload.
pub const APPLICATION_JSON: &str = "application/json";

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Malformed JSON body: {0}")]
    MalformedBody(#[source] serde_json::Error),

    #[error("Failed to encode JSON payload: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Decode a JSON body into `T`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    serde_json::from_slice(bytes).map_err(CodecError::MalformedBody)
}

/// Encode `value` as JSON.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Bytes, CodecError> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(CodecError::Encode)
}
