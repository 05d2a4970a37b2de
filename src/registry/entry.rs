//! Device record and status types
//!
//! This module defines the per-device state stored in the registry.

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::address::DeviceAddress;

/// Connection status of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceStatus {
    /// Silent past the liveness timeout
    Disconnected,
    /// Activity observed recently
    Connected,
    /// Reported idle by the device
    Standby,
    /// Reported faulty by the device
    Error,
}

impl DeviceStatus {
    /// Whether the device counts as active
    pub fn is_active(self) -> bool {
        self == DeviceStatus::Connected
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeviceStatus::Disconnected => "disconnected",
            DeviceStatus::Connected => "connected",
            DeviceStatus::Standby => "standby",
            DeviceStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Entry for a single device in the registry
///
/// `H` is the render handle type. It belongs to whoever renders devices;
/// the registry stores it and hands it back on removal, nothing else.
#[derive(Debug, Clone)]
pub struct DeviceRecord<H = ()> {
    /// Device address (immutable key)
    pub address: DeviceAddress,

    /// Last time any unit was attributed to this device
    pub last_seen_at: Instant,

    /// Current status
    pub status: DeviceStatus,

    /// Frames attributed since the record was created
    pub frame_count: u64,

    /// When the record was created
    pub created_at: Instant,

    /// Externally owned render handle
    pub render_handle: Option<H>,
}

impl<H> DeviceRecord<H> {
    /// Create a new record, connected as of `now`
    pub(super) fn new(address: DeviceAddress, now: Instant) -> Self {
        Self {
            address,
            last_seen_at: now,
            status: DeviceStatus::Connected,
            frame_count: 0,
            created_at: now,
            render_handle: None,
        }
    }

    /// Check if the device is currently connected
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Time since the last attributed unit, as of `now`
    pub fn silence(&self, now: Instant) -> std::time::Duration {
        now.saturating_duration_since(self.last_seen_at)
    }

    /// Note activity at `now`
    ///
    /// `last_seen_at` never moves backwards, so an out-of-order timestamp
    /// still reconnects the device but leaves the clock where it was.
    pub(super) fn touch(&mut self, now: Instant) {
        if now > self.last_seen_at {
            self.last_seen_at = now;
        }
        self.status = DeviceStatus::Connected;
    }

    /// Count one attributed frame at `now`
    pub(super) fn record_frame(&mut self, now: Instant) {
        self.frame_count = self.frame_count.saturating_add(1);
        self.touch(now);
    }

    /// Demote to disconnected; returns true if the status changed
    pub(super) fn mark_inactive(&mut self) -> bool {
        if self.status == DeviceStatus::Connected {
            self.status = DeviceStatus::Disconnected;
            true
        } else {
            false
        }
    }
}

/// Aggregate statistics for the registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Number of records
    pub devices: usize,
    /// Number of connected records
    pub active: usize,
    /// Sum of frame counts across all records
    pub total_frames: u64,
}
