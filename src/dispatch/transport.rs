//! Boundaries to the outside world
//!
//! The dispatcher sits between two collaborators it does not own:
//! - the transport, which delivers tagged inbound units and accepts outbound
//!   text when writable
//! - the render sink, which consumes frames and disposes of removed devices

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::registry::DeviceRecord;

/// One unit received from the connection, tagged by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundUnit {
    /// Binary frame unit (address header + payload)
    Binary(Bytes),
    /// Text control unit (JSON envelope)
    Text(String),
}

impl InboundUnit {
    /// Check if this is a binary unit
    pub fn is_binary(&self) -> bool {
        matches!(self, InboundUnit::Binary(_))
    }

    /// Size of the unit in bytes
    pub fn len(&self) -> usize {
        match self {
            InboundUnit::Binary(b) => b.len(),
            InboundUnit::Text(t) => t.len(),
        }
    }

    /// Check if the unit is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Bytes> for InboundUnit {
    fn from(data: Bytes) -> Self {
        InboundUnit::Binary(data)
    }
}

impl From<String> for InboundUnit {
    fn from(text: String) -> Self {
        InboundUnit::Text(text)
    }
}

/// Outbound side of the connection
///
/// Connection setup, retries and closing all live behind this trait.
pub trait Transport: Send + Sync {
    /// Queue a text unit for sending
    ///
    /// Returns false if the connection is not currently writable. Must not
    /// block.
    fn try_send(&self, text: String) -> bool;
}

impl Transport for mpsc::Sender<String> {
    fn try_send(&self, text: String) -> bool {
        mpsc::Sender::try_send(self, text).is_ok()
    }
}

impl Transport for mpsc::UnboundedSender<String> {
    fn try_send(&self, text: String) -> bool {
        self.send(text).is_ok()
    }
}

/// Consumer of attributed frames and removed devices
///
/// Closures `Fn(Bytes, &DeviceRecord<H>)` implement this directly; removed
/// records are then simply dropped, which drops their render handle.
pub trait RenderSink<H>: Send + Sync {
    /// A frame was attributed to `record` (already counted)
    fn frame(&self, payload: Bytes, record: &DeviceRecord<H>);

    /// A device was removed; dispose of its render handle
    fn removed(&self, _record: DeviceRecord<H>) {}
}

impl<H, F> RenderSink<H> for F
where
    F: Fn(Bytes, &DeviceRecord<H>) + Send + Sync,
{
    fn frame(&self, payload: Bytes, record: &DeviceRecord<H>) {
        self(payload, record)
    }
}

/// Sink that discards frames
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl<H> RenderSink<H> for DiscardSink {
    fn frame(&self, _payload: Bytes, _record: &DeviceRecord<H>) {}
}
