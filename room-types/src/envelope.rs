//! Envelope - the `{action, payload}` wire unit exchanged in both directions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::CodecError;

/// The untyped wire envelope.
///
/// Every frame on the connection is a JSON object with an `action` string and
/// an optional `payload`. A missing payload decodes as `null`, and a `null`
/// payload is omitted on encode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Action discriminator, e.g. `roomList` or `createRoom`.
    pub action: String,
    /// Action-specific payload.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
}

impl Envelope {
    /// Build an envelope from an action name and any serializable payload.
    pub fn new<P: Serialize>(action: &str, payload: &P) -> Result<Self, CodecError> {
        let payload = serde_json::to_value(payload).map_err(CodecError::Serialization)?;
        Ok(Self {
            action: action.to_string(),
            payload,
        })
    }

    /// Serialize to JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(self).map_err(CodecError::Serialization)
    }

    /// Deserialize from JSON bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        serde_json::from_slice(bytes).map_err(CodecError::Malformed)
    }
}

/// Encode an action and payload into wire bytes.
pub fn encode<P: Serialize>(action: &str, payload: &P) -> Result<Vec<u8>, CodecError> {
    Envelope::new(action, payload)?.to_bytes()
}

/// Decode wire bytes into an untyped envelope.
pub fn decode(bytes: &[u8]) -> Result<Envelope, CodecError> {
    Envelope::from_bytes(bytes)
}
