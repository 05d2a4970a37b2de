//! Binary frame codec
//!
//! Frames pushed by devices carry a fixed address header followed by an
//! opaque payload (normally a JPEG image):
//!
//! ```text
//! +----+----+----+----+-------------------+
//! | a  | b  | c  | d  | payload (0..N)    |
//! +----+----+----+----+-------------------+
//!   address a.b.c.d
//! ```
//!
//! The payload is not inspected.

use bytes::{BufMut, Bytes, BytesMut};

use super::error::CodecError;
use crate::registry::DeviceAddress;

/// Size of the address header at the start of every binary unit
pub const ADDRESS_HEADER_LEN: usize = 4;

/// A decoded binary unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePacket {
    /// Device the frame came from
    pub address: DeviceAddress,
    /// Frame data (shares the inbound buffer)
    pub payload: Bytes,
}

/// Split a binary unit into its address and payload
///
/// The payload is a reference-counted slice of `raw`; it may be empty.
pub fn decode_binary(raw: Bytes) -> Result<FramePacket, CodecError> {
    let Some(header) = raw.get(..ADDRESS_HEADER_LEN) else {
        return Err(CodecError::TooShort { len: raw.len() });
    };
    let address = DeviceAddress::new(header[0], header[1], header[2], header[3]);

    Ok(FramePacket {
        address,
        payload: raw.slice(ADDRESS_HEADER_LEN..),
    })
}

/// Build a binary unit for `address` carrying `payload`
pub fn encode_frame(address: DeviceAddress, payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(ADDRESS_HEADER_LEN + payload.len());
    buf.put_slice(&address.octets());
    buf.put_slice(payload);
    buf.freeze()
}
