//! Wire codec for device traffic
//!
//! Two kinds of unit share one duplex connection:
//! - Binary units: a 4-byte address header followed by frame data
//! - Text units: JSON control envelopes (`{"kind": .., "payload": ..}`)
//!
//! The transport tags each unit as binary or text; this module never guesses
//! from content.

pub mod envelope;
pub mod error;
pub mod frame;

pub use envelope::{
    decode_envelope, decode_text, encode, ControlMessage, DevicePayload, Envelope, InitPayload,
    MessageKind,
};
pub use error::CodecError;
pub use frame::{decode_binary, encode_frame, FramePacket, ADDRESS_HEADER_LEN};
