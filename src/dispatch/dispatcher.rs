//! Protocol dispatcher
//!
//! Routes each inbound unit to the registry. Processing is terminal per unit:
//! a unit either applies fully or is dropped with a log entry, and no state
//! carries over to the next unit except what the registry holds.

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;

use super::transport::{InboundUnit, RenderSink, Transport};
use crate::codec::{self, ControlMessage, DevicePayload, InitPayload, MessageKind};
use crate::error::{Error, Result};
use crate::registry::{DeviceAddress, DeviceRegistry, RegistryError};
use crate::stats::DispatchStats;

/// What a successfully dispatched unit did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Frame attributed to a registered device
    FrameRecorded {
        /// Device the frame came from
        address: DeviceAddress,
        /// Frame count after this frame
        frame_count: u64,
    },
    /// Devices registered or refreshed by `Init` or `AddDevice`
    Announced(Vec<DeviceAddress>),
    /// `RemoveDevice` processed; `existed` is false for unknown addresses
    Removed {
        /// Device named by the message
        address: DeviceAddress,
        /// Whether a record was actually removed
        existed: bool,
    },
    /// Recognised kind that changes nothing
    Ignored(MessageKind),
}

/// Demultiplexes inbound units into registry operations
pub struct Dispatcher<H, T, S> {
    registry: Arc<DeviceRegistry<H>>,
    transport: T,
    sink: S,
    stats: DispatchStats,
}

impl<H, T, S> Dispatcher<H, T, S>
where
    H: Clone,
    T: Transport,
    S: RenderSink<H>,
{
    /// Create a dispatcher over a shared registry
    pub fn new(registry: Arc<DeviceRegistry<H>>, transport: T, sink: S) -> Self {
        Self {
            registry,
            transport,
            sink,
            stats: DispatchStats::new(),
        }
    }

    /// Get the registry this dispatcher mutates
    pub fn registry(&self) -> &Arc<DeviceRegistry<H>> {
        &self.registry
    }

    /// Get the dispatch counters
    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    /// Process one inbound unit to completion
    ///
    /// Failures are logged and the unit is dropped; the error is returned for
    /// callers that want to inspect it, but it never needs handling.
    pub fn dispatch(&self, unit: InboundUnit) -> Result<Outcome> {
        self.stats.unit_received();

        let result = match unit {
            InboundUnit::Binary(raw) => self.handle_binary(raw),
            InboundUnit::Text(text) => self.handle_text(&text),
        };

        if let Err(ref e) = result {
            self.stats.unit_dropped();
            match e {
                Error::Registry(RegistryError::NotFound(address)) => {
                    tracing::warn!(address = %address, "Frame from unknown device, dropped");
                }
                e => tracing::warn!(error = %e, "Inbound unit dropped"),
            }
        }

        result
    }

    /// Encode and send a command envelope
    ///
    /// Fails with [`Error::TransportUnavailable`] if the transport is not
    /// writable; nothing is retried.
    pub fn send<P: Serialize>(&self, kind: &str, payload: &P) -> Result<()> {
        let text = codec::encode(kind, payload)?;

        if !self.transport.try_send(text) {
            tracing::debug!(kind = kind, "Send failed, transport unavailable");
            return Err(Error::TransportUnavailable);
        }

        self.stats.command_sent();
        tracing::debug!(kind = kind, "Command sent");
        Ok(())
    }

    fn handle_binary(&self, raw: Bytes) -> Result<Outcome> {
        let packet = codec::decode_binary(raw)?;
        let record = self.registry.record_frame(&packet.address)?;

        self.stats.frame_recorded(packet.payload.len());
        let outcome = Outcome::FrameRecorded {
            address: record.address,
            frame_count: record.frame_count,
        };
        self.sink.frame(packet.payload, &record);

        Ok(outcome)
    }

    fn handle_text(&self, text: &str) -> Result<Outcome> {
        let message = codec::decode_text(text)?;
        let kind = message.kind();

        let outcome = match message {
            ControlMessage::Init(init) => self.apply_init(init),
            ControlMessage::AddDevice(payload) => {
                let address = parse_address(&payload)?;
                self.registry.upsert(address);
                Outcome::Announced(vec![address])
            }
            ControlMessage::RemoveDevice(payload) => {
                let address = parse_address(&payload)?;
                let removed = self.registry.remove(&address);
                let existed = removed.is_some();
                if let Some(record) = removed {
                    self.sink.removed(record);
                }
                Outcome::Removed { address, existed }
            }
            // Status reports are accepted but not applied
            ControlMessage::UpdateDevice(payload) => {
                tracing::debug!(address = %payload.address, "UpdateDevice accepted, no change");
                Outcome::Ignored(kind)
            }
        };

        self.stats.message_applied();
        tracing::debug!(kind = %kind, "Control message applied");
        Ok(outcome)
    }

    fn apply_init(&self, init: InitPayload) -> Outcome {
        let devices = init.devices.unwrap_or_default();

        tracing::info!(
            device_count = init.device_count,
            listed = devices.len(),
            "Init received"
        );

        let announced = devices
            .iter()
            .filter_map(|device| match parse_address(device) {
                Ok(address) => Some(address),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping Init entry");
                    None
                }
            })
            .map(|address| self.registry.upsert(address).address)
            .collect();

        Outcome::Announced(announced)
    }
}

fn parse_address(payload: &DevicePayload) -> Result<DeviceAddress> {
    payload
        .address
        .parse()
        .map_err(|_| Error::InvalidAddress(payload.address.clone()))
}

impl<H, T, S> std::fmt::Debug for Dispatcher<H, T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("stats", &self.stats)
            .finish()
    }
}
