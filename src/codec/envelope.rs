//! Control envelope codec
//!
//! Control messages travel as UTF-8 JSON text units:
//!
//! ```text
//! { "kind": "AddDevice", "payload": { "address": "192.168.1.10" } }
//! ```
//!
//! Decoding happens in two steps. The outer envelope is parsed first, which
//! separates undecodable input (`MalformedPayload`) from a well-formed
//! envelope naming a kind this protocol does not define (`UnknownKind`).
//! The payload is then decoded into the schema for its kind, so downstream
//! code only ever sees typed values.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::CodecError;

/// Control message kinds understood by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// Initial catalog announcement
    Init,
    /// A device joined
    AddDevice,
    /// A device changed status or metadata
    UpdateDevice,
    /// A device left
    RemoveDevice,
}

impl MessageKind {
    /// Every kind, in declaration order
    pub const ALL: [MessageKind; 4] = [
        MessageKind::Init,
        MessageKind::AddDevice,
        MessageKind::UpdateDevice,
        MessageKind::RemoveDevice,
    ];

    /// Wire name of the kind
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Init => "Init",
            MessageKind::AddDevice => "AddDevice",
            MessageKind::UpdateDevice => "UpdateDevice",
            MessageKind::RemoveDevice => "RemoveDevice",
        }
    }
}

impl FromStr for MessageKind {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MessageKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CodecError::UnknownKind(s.to_string()))
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outer control envelope
///
/// `kind` is kept as a string so outbound commands can use kinds outside
/// [`MessageKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<P = Value> {
    /// Message kind
    pub kind: String,
    /// Kind-specific payload
    pub payload: P,
}

/// Per-device payload of `AddDevice`, `UpdateDevice` and `RemoveDevice`,
/// and the element type of the `Init` device list
///
/// The address is carried as received; the dispatcher validates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePayload {
    /// Dotted-quad address
    pub address: String,

    /// Status reported by the device
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl DevicePayload {
    /// Payload naming only an address
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            status: None,
        }
    }
}

/// Payload of `Init`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitPayload {
    /// Number of devices the peer knows about
    pub device_count: u64,

    /// The devices themselves, when the peer lists them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devices: Option<Vec<DevicePayload>>,
}

/// A decoded control message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload")]
pub enum ControlMessage {
    /// Initial catalog announcement
    Init(InitPayload),
    /// A device joined
    AddDevice(DevicePayload),
    /// A device changed status or metadata
    UpdateDevice(DevicePayload),
    /// A device left
    RemoveDevice(DevicePayload),
}

impl ControlMessage {
    /// Kind of this message
    pub fn kind(&self) -> MessageKind {
        match self {
            ControlMessage::Init(_) => MessageKind::Init,
            ControlMessage::AddDevice(_) => MessageKind::AddDevice,
            ControlMessage::UpdateDevice(_) => MessageKind::UpdateDevice,
            ControlMessage::RemoveDevice(_) => MessageKind::RemoveDevice,
        }
    }

    /// Serialize into a text unit
    pub fn encode(&self) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(CodecError::Unserializable)
    }
}

impl Envelope<Value> {
    /// Decode the payload according to the envelope's kind
    pub fn into_message(self) -> Result<ControlMessage, CodecError> {
        let kind: MessageKind = self.kind.parse()?;

        let message = match kind {
            MessageKind::Init => ControlMessage::Init(payload_as(kind, self.payload)?),
            MessageKind::AddDevice => ControlMessage::AddDevice(payload_as(kind, self.payload)?),
            MessageKind::UpdateDevice => {
                ControlMessage::UpdateDevice(payload_as(kind, self.payload)?)
            }
            MessageKind::RemoveDevice => {
                ControlMessage::RemoveDevice(payload_as(kind, self.payload)?)
            }
        };

        Ok(message)
    }
}

fn payload_as<T: serde::de::DeserializeOwned>(
    kind: MessageKind,
    payload: Value,
) -> Result<T, CodecError> {
    serde_json::from_value(payload)
        .map_err(|e| CodecError::malformed(format!("invalid {} payload: {}", kind, e)))
}

/// Parse a text unit into its outer envelope without interpreting the kind
pub fn decode_envelope(raw: &str) -> Result<Envelope, CodecError> {
    let value: Value = serde_json::from_str(raw).map_err(CodecError::malformed)?;
    if !value.is_object() {
        return Err(CodecError::malformed("envelope is not a JSON object"));
    }

    serde_json::from_value(value).map_err(CodecError::malformed)
}

/// Decode a text unit into a typed control message
pub fn decode_text(raw: &str) -> Result<ControlMessage, CodecError> {
    decode_envelope(raw)?.into_message()
}

/// Serialize an outbound envelope
///
/// `kind` is not restricted to [`MessageKind`]; device commands use their
/// own vocabulary.
pub fn encode<P: Serialize>(kind: &str, payload: &P) -> Result<String, CodecError> {
    #[derive(Serialize)]
    struct Outbound<'a, P> {
        kind: &'a str,
        payload: &'a P,
    }

    serde_json::to_string(&Outbound { kind, payload }).map_err(CodecError::Unserializable)
}
