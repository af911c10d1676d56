//! Error types for the roomsync codec.

use thiserror::Error;

/// Errors produced while encoding or decoding envelopes.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Bytes did not parse as an `{action, payload}` envelope.
    #[error("malformed message: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The envelope parsed, but the payload does not fit its action.
    #[error("malformed payload for action {action:?}: {source}")]
    InvalidPayload {
        /// The action named by the envelope.
        action: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),
}
