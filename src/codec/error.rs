//! Codec error types

/// Error type for decoding and encoding inbound/outbound units
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Text unit is not a well-formed control envelope
    #[error("Malformed control payload: {reason}")]
    MalformedPayload {
        /// What was wrong with it
        reason: String,
    },

    /// Binary unit shorter than the address header
    #[error("Binary unit too short: {len} bytes, need at least 4")]
    TooShort {
        /// Length of the unit received
        len: usize,
    },

    /// Envelope kind is not one this protocol defines
    #[error("Unknown message kind: {0:?}")]
    UnknownKind(String),

    /// Outbound payload cannot be represented as JSON
    #[error("Payload cannot be serialized: {0}")]
    Unserializable(#[source] serde_json::Error),
}

impl CodecError {
    pub(crate) fn malformed(reason: impl std::fmt::Display) -> Self {
        CodecError::MalformedPayload {
            reason: reason.to_string(),
        }
    }
}
