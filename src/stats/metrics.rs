//! Statistics for the protocol dispatcher

use std::sync::atomic::{AtomicU64, Ordering};

/// Live dispatch counters
///
/// Updated with relaxed atomics; read them through [`DispatchStats::snapshot`].
#[derive(Debug, Default)]
pub struct DispatchStats {
    units_received: AtomicU64,
    frames_recorded: AtomicU64,
    frame_bytes: AtomicU64,
    messages_applied: AtomicU64,
    units_dropped: AtomicU64,
    commands_sent: AtomicU64,
}

impl DispatchStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn unit_received(&self) {
        self.units_received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn frame_recorded(&self, payload_len: usize) {
        self.frames_recorded.fetch_add(1, Ordering::Relaxed);
        self.frame_bytes
            .fetch_add(payload_len as u64, Ordering::Relaxed);
    }

    pub(crate) fn message_applied(&self) {
        self.messages_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn unit_dropped(&self) {
        self.units_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn command_sent(&self) {
        self.commands_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Read every counter
    pub fn snapshot(&self) -> DispatchSnapshot {
        DispatchSnapshot {
            units_received: self.units_received.load(Ordering::Relaxed),
            frames_recorded: self.frames_recorded.load(Ordering::Relaxed),
            frame_bytes: self.frame_bytes.load(Ordering::Relaxed),
            messages_applied: self.messages_applied.load(Ordering::Relaxed),
            units_dropped: self.units_dropped.load(Ordering::Relaxed),
            commands_sent: self.commands_sent.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`DispatchStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSnapshot {
    /// Inbound units handed to the dispatcher
    pub units_received: u64,
    /// Binary units attributed to a registered device
    pub frames_recorded: u64,
    /// Payload bytes of recorded frames
    pub frame_bytes: u64,
    /// Control messages accepted (including no-op kinds)
    pub messages_applied: u64,
    /// Units dropped after a decode or dispatch failure
    pub units_dropped: u64,
    /// Outbound commands handed to the transport
    pub commands_sent: u64,
}

impl DispatchSnapshot {
    /// Fraction of received units that were dropped
    pub fn drop_rate(&self) -> f64 {
        if self.units_received > 0 {
            self.units_dropped as f64 / self.units_received as f64
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = DispatchStats::new();
        stats.unit_received();
        stats.unit_received();
        stats.frame_recorded(1024);
        stats.unit_dropped();
        stats.command_sent();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.units_received, 2);
        assert_eq!(snapshot.frames_recorded, 1);
        assert_eq!(snapshot.frame_bytes, 1024);
        assert_eq!(snapshot.messages_applied, 0);
        assert_eq!(snapshot.units_dropped, 1);
        assert_eq!(snapshot.commands_sent, 1);
    }

    #[test]
    fn test_drop_rate() {
        assert_eq!(DispatchSnapshot::default().drop_rate(), 0.0);

        let snapshot = DispatchSnapshot {
            units_received: 4,
            units_dropped: 1,
            ..Default::default()
        };
        assert!((snapshot.drop_rate() - 0.25).abs() < f64::EPSILON);
    }
}
