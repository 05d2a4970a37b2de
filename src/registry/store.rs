//! Device registry implementation
//!
//! The authoritative catalog of devices, keyed by address. All operations are
//! synchronous and never suspend; callers that share the registry across
//! tasks wrap it in an `Arc`.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tokio::time::Instant;

use super::address::DeviceAddress;
use super::config::RegistryConfig;
use super::entry::{DeviceRecord, RegistryStats};
use super::error::RegistryError;
use super::notifier::{ChangeEvent, ChangeNotifier};

/// Central registry for all known devices
///
/// Mutations take the write lock for the duration of the map update only.
/// Notifications fire after the lock is released, before the call returns.
pub struct DeviceRegistry<H = ()> {
    /// Map of address to device record
    devices: RwLock<HashMap<DeviceAddress, DeviceRecord<H>>>,

    /// Observers of catalog changes
    notifier: ChangeNotifier<H>,

    /// Configuration
    config: RegistryConfig,
}

impl<H> DeviceRegistry<H> {
    /// Create a new device registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new device registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            devices: RwLock::new(HashMap::new()),
            notifier: ChangeNotifier::new(),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Get the change notifier, to register callbacks
    pub fn notifier(&self) -> &ChangeNotifier<H> {
        &self.notifier
    }

    /// Mark a device disconnected
    ///
    /// Only a connected device changes; the record is kept either way.
    /// Returns true if the status changed.
    pub fn mark_inactive(&self, address: &DeviceAddress) -> bool {
        let mut devices = self.write();

        let changed = devices
            .get_mut(address)
            .map(DeviceRecord::mark_inactive)
            .unwrap_or(false);

        if changed {
            tracing::info!(address = %address, "Device marked inactive");
        }
        changed
    }

    /// Remove a device from the catalog
    ///
    /// Returns the removed record so the caller can dispose of its render
    /// handle. Removing an unknown address is a no-op.
    pub fn remove(&self, address: &DeviceAddress) -> Option<DeviceRecord<H>> {
        let removed = self.write().remove(address);

        match removed {
            Some(ref record) => tracing::info!(
                address = %address,
                frames = record.frame_count,
                "Device removed"
            ),
            None => tracing::debug!(address = %address, "Remove for unknown device ignored"),
        }

        removed
    }

    /// Remove every device, returning the records for handle disposal
    pub fn clear(&self) -> Vec<DeviceRecord<H>> {
        let removed: Vec<DeviceRecord<H>> = self.write().drain().map(|(_, r)| r).collect();

        tracing::info!(devices = removed.len(), "Registry cleared");
        removed
    }

    /// Attach a render handle to a device
    ///
    /// Returns the handle that was attached before, if any, so the caller
    /// can dispose of it.
    pub fn attach_render_handle(
        &self,
        address: &DeviceAddress,
        handle: H,
    ) -> Result<Option<H>, RegistryError> {
        let mut devices = self.write();

        let record = devices
            .get_mut(address)
            .ok_or(RegistryError::NotFound(*address))?;

        Ok(record.render_handle.replace(handle))
    }

    /// Check if an address is in the catalog
    pub fn contains(&self, address: &DeviceAddress) -> bool {
        self.read().contains_key(address)
    }

    /// Get total number of devices
    pub fn count(&self) -> usize {
        self.read().len()
    }

    /// Get number of connected devices
    pub fn active_count(&self) -> usize {
        self.read().values().filter(|r| r.is_active()).count()
    }

    /// Get aggregate statistics
    pub fn stats(&self) -> RegistryStats {
        let devices = self.read();

        devices.values().fold(
            RegistryStats {
                devices: devices.len(),
                ..RegistryStats::default()
            },
            |mut stats, record| {
                if record.is_active() {
                    stats.active += 1;
                }
                stats.total_frames = stats.total_frames.saturating_add(record.frame_count);
                stats
            },
        )
    }

    /// Demote every connected device silent for longer than `timeout`
    ///
    /// Returns the addresses that transitioned to disconnected. Records are
    /// never evicted here, and devices that are already disconnected (or in
    /// standby/error) are left alone, so repeating a sweep with the same
    /// `now` changes nothing.
    pub fn sweep(&self, now: Instant, timeout: Duration) -> BTreeSet<DeviceAddress> {
        let mut devices = self.write();

        let demoted: BTreeSet<DeviceAddress> = devices
            .values_mut()
            .filter(|record| record.is_active() && record.silence(now) > timeout)
            .filter_map(|record| record.mark_inactive().then_some(record.address))
            .collect();

        for address in &demoted {
            tracing::info!(
                address = %address,
                timeout_secs = timeout.as_secs(),
                "Device silent past liveness timeout, marked disconnected"
            );
        }

        demoted
    }

    /// Run the liveness sweep once against the current time
    pub fn sweep_expired(&self) -> BTreeSet<DeviceAddress> {
        self.sweep(Instant::now(), self.config.liveness_timeout)
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<DeviceAddress, DeviceRecord<H>>> {
        // No mutation leaves the map half-updated, so a poisoned lock is
        // still consistent.
        self.devices.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<DeviceAddress, DeviceRecord<H>>> {
        self.devices.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<H: Clone> DeviceRegistry<H> {
    /// Register a device, or refresh it if already known
    pub fn upsert(&self, address: DeviceAddress) -> DeviceRecord<H> {
        self.upsert_at(address, Instant::now())
    }

    /// Register a device as of `now`, or refresh it if already known
    ///
    /// A new record starts connected with zero frames and fires the added
    /// notification. A known record is refreshed and reconnected without
    /// notifying.
    pub fn upsert_at(&self, address: DeviceAddress, now: Instant) -> DeviceRecord<H> {
        let (record, created) = {
            let mut devices = self.write();

            match devices.entry(address) {
                Entry::Occupied(mut entry) => {
                    let record = entry.get_mut();
                    record.touch(now);

                    tracing::debug!(
                        address = %address,
                        frames = record.frame_count,
                        "Device already registered, refreshed"
                    );
                    (record.clone(), false)
                }
                Entry::Vacant(entry) => {
                    let record = entry.insert(DeviceRecord::new(address, now));

                    tracing::info!(address = %address, "Device registered");
                    (record.clone(), true)
                }
            }
        };

        if created {
            self.notifier.notify(ChangeEvent::Added, &record);
        }

        record
    }

    /// Attribute one frame to a registered device
    pub fn record_frame(&self, address: &DeviceAddress) -> Result<DeviceRecord<H>, RegistryError> {
        self.record_frame_at(address, Instant::now())
    }

    /// Attribute one frame to a registered device as of `now`
    ///
    /// Frames never create records: an unknown address fails with
    /// [`RegistryError::NotFound`] and leaves the catalog untouched.
    pub fn record_frame_at(
        &self,
        address: &DeviceAddress,
        now: Instant,
    ) -> Result<DeviceRecord<H>, RegistryError> {
        let record = {
            let mut devices = self.write();

            let record = devices
                .get_mut(address)
                .ok_or(RegistryError::NotFound(*address))?;
            record.record_frame(now);

            tracing::trace!(address = %address, frames = record.frame_count, "Frame recorded");
            record.clone()
        };

        self.notifier.notify(ChangeEvent::Updated, &record);

        Ok(record)
    }

    /// Get a snapshot of one device
    pub fn get(&self, address: &DeviceAddress) -> Option<DeviceRecord<H>> {
        self.read().get(address).cloned()
    }

    /// Get a snapshot of every device
    pub fn list(&self) -> Vec<DeviceRecord<H>> {
        self.read().values().cloned().collect()
    }

    /// Get a snapshot of every connected device
    pub fn list_active(&self) -> Vec<DeviceRecord<H>> {
        self.read()
            .values()
            .filter(|r| r.is_active())
            .cloned()
            .collect()
    }
}

impl<H: Send + Sync + 'static> DeviceRegistry<H> {
    /// Spawn background liveness sweep task
    ///
    /// Returns a handle that must be aborted on teardown.
    pub fn spawn_sweep_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let registry = Arc::clone(self);
        let mut ticker = registry.config.sweep_ticker();

        tokio::spawn(async move {
            loop {
                ticker.tick().await;
                registry.sweep_expired();
            }
        })
    }
}

impl<H> Default for DeviceRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> std::fmt::Debug for DeviceRegistry<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceRegistry")
            .field("devices", &self.count())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::registry::DeviceStatus;

    const CAM: DeviceAddress = DeviceAddress::new(192, 168, 1, 10);
    const OTHER: DeviceAddress = DeviceAddress::new(192, 168, 1, 11);

    fn counting(registry: &DeviceRegistry, event: ChangeEvent) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let callback = move |_: &DeviceRecord| {
            counter.fetch_add(1, Ordering::Relaxed);
        };
        match event {
            ChangeEvent::Added => registry.notifier().on_added(callback),
            ChangeEvent::Updated => registry.notifier().on_updated(callback),
        }
        count
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let registry = DeviceRegistry::new();
        let added = counting(&registry, ChangeEvent::Added);

        let first = registry.upsert(CAM);
        registry.record_frame(&CAM).unwrap();
        let second = registry.upsert(CAM);

        assert_eq!(registry.count(), 1);
        assert_eq!(added.load(Ordering::Relaxed), 1);
        assert_eq!(first.frame_count, 0);
        assert_eq!(second.frame_count, 1);
        assert_eq!(second.status, DeviceStatus::Connected);
    }

    #[test]
    fn test_upsert_reconnects_disconnected_device() {
        let registry: DeviceRegistry = DeviceRegistry::new();
        registry.upsert(CAM);
        assert!(registry.mark_inactive(&CAM));

        let record = registry.upsert(CAM);
        assert_eq!(record.status, DeviceStatus::Connected);
    }

    #[test]
    fn test_record_frame_unknown_device() {
        let registry = DeviceRegistry::new();
        let updated = counting(&registry, ChangeEvent::Updated);

        let result = registry.record_frame(&CAM);

        assert_eq!(result.unwrap_err(), RegistryError::NotFound(CAM));
        assert_eq!(registry.count(), 0);
        assert_eq!(updated.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_record_frame_counts_and_reconnects() {
        let registry = DeviceRegistry::new();
        let updated = counting(&registry, ChangeEvent::Updated);
        registry.upsert(CAM);

        for expected in 1..=3 {
            let record = registry.record_frame(&CAM).unwrap();
            assert_eq!(record.frame_count, expected);
        }

        registry.mark_inactive(&CAM);
        let record = registry.record_frame(&CAM).unwrap();

        // No reset on reconnect
        assert_eq!(record.frame_count, 4);
        assert_eq!(record.status, DeviceStatus::Connected);
        assert_eq!(updated.load(Ordering::Relaxed), 4);
    }

    #[test]
    fn test_mark_inactive_keeps_record() {
        let registry: DeviceRegistry = DeviceRegistry::new();
        registry.upsert(CAM);

        assert!(registry.mark_inactive(&CAM));
        assert!(!registry.mark_inactive(&CAM));
        assert!(!registry.mark_inactive(&OTHER));

        assert_eq!(registry.count(), 1);
        assert_eq!(registry.active_count(), 0);
        assert_eq!(registry.get(&CAM).unwrap().status, DeviceStatus::Disconnected);
    }

    #[test]
    fn test_remove_returns_handle() {
        let registry: DeviceRegistry<u32> = DeviceRegistry::new();
        registry.upsert(CAM);
        assert_eq!(registry.attach_render_handle(&CAM, 7).unwrap(), None);

        let removed = registry.remove(&CAM).unwrap();
        assert_eq!(removed.render_handle, Some(7));
        assert!(!registry.contains(&CAM));

        // Absent address is a no-op
        assert!(registry.remove(&CAM).is_none());
    }

    #[test]
    fn test_attach_render_handle() {
        let registry: DeviceRegistry<&'static str> = DeviceRegistry::new();

        assert_eq!(
            registry.attach_render_handle(&CAM, "tile-0"),
            Err(RegistryError::NotFound(CAM))
        );

        registry.upsert(CAM);
        assert_eq!(registry.attach_render_handle(&CAM, "tile-0"), Ok(None));
        assert_eq!(registry.attach_render_handle(&CAM, "tile-1"), Ok(Some("tile-0")));
        assert_eq!(registry.get(&CAM).unwrap().render_handle, Some("tile-1"));
    }

    #[test]
    fn test_callback_can_reenter_registry() {
        let registry: Arc<DeviceRegistry<usize>> = Arc::new(DeviceRegistry::new());

        let weak = Arc::downgrade(&registry);
        registry.notifier().on_added(move |record| {
            if let Some(registry) = weak.upgrade() {
                let _ = registry.attach_render_handle(&record.address, 42);
            }
        });

        registry.upsert(CAM);
        assert_eq!(registry.get(&CAM).unwrap().render_handle, Some(42));
    }

    #[test]
    fn test_clear() {
        let registry: DeviceRegistry<u8> = DeviceRegistry::new();
        registry.upsert(CAM);
        registry.upsert(OTHER);
        registry.attach_render_handle(&OTHER, 1).unwrap();

        let mut handles: Vec<Option<u8>> =
            registry.clear().into_iter().map(|r| r.render_handle).collect();
        handles.sort();

        assert_eq!(handles, vec![None, Some(1)]);
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_list_active_and_stats() {
        let registry: DeviceRegistry = DeviceRegistry::new();
        registry.upsert(CAM);
        registry.upsert(OTHER);
        registry.record_frame(&CAM).unwrap();
        registry.record_frame(&CAM).unwrap();
        registry.mark_inactive(&OTHER);

        let active = registry.list_active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].address, CAM);
        assert_eq!(registry.list().len(), 2);

        assert_eq!(
            registry.stats(),
            RegistryStats {
                devices: 2,
                active: 1,
                total_frames: 2,
            }
        );
    }

    #[test]
    fn test_sweep_demotes_only_stale_connected() {
        let registry: DeviceRegistry = DeviceRegistry::new();
        let start = Instant::now();
        let timeout = Duration::from_secs(30);

        registry.upsert_at(CAM, start);
        registry.upsert_at(OTHER, start + Duration::from_secs(2));

        let now = start + Duration::from_secs(31);
        let demoted = registry.sweep(now, timeout);

        assert_eq!(demoted, BTreeSet::from([CAM]));
        assert_eq!(registry.get(&CAM).unwrap().status, DeviceStatus::Disconnected);
        assert_eq!(registry.get(&OTHER).unwrap().status, DeviceStatus::Connected);

        // Same clock: nothing further changes
        assert!(registry.sweep(now, timeout).is_empty());
        assert_eq!(registry.count(), 2);
    }

    #[test]
    fn test_sweep_boundary_is_exclusive() {
        let registry: DeviceRegistry = DeviceRegistry::new();
        let start = Instant::now();
        registry.upsert_at(CAM, start);

        let timeout = Duration::from_secs(30);
        assert!(registry.sweep(start + timeout, timeout).is_empty());
        assert_eq!(registry.sweep(start + timeout + Duration::from_millis(1), timeout).len(), 1);
    }

    #[test]
    fn test_frame_refreshes_liveness() {
        let registry: DeviceRegistry = DeviceRegistry::new();
        let start = Instant::now();
        registry.upsert_at(CAM, start);
        registry.record_frame_at(&CAM, start + Duration::from_secs(2)).unwrap();

        // Silent for 29s since the frame
        let demoted = registry.sweep(start + Duration::from_secs(31), Duration::from_secs(30));
        assert!(demoted.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_task() {
        let config = RegistryConfig::default()
            .liveness_timeout(Duration::from_secs(30))
            .sweep_interval(Duration::from_secs(5));
        let registry: Arc<DeviceRegistry> = Arc::new(DeviceRegistry::with_config(config));
        registry.upsert(CAM);

        let handle = registry.spawn_sweep_task();

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(registry.active_count(), 1);

        // Next tick after the timeout passes
        tokio::time::sleep(Duration::from_secs(7)).await;
        assert_eq!(registry.active_count(), 0);
        assert_eq!(registry.count(), 1);

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
    }
}
