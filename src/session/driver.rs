//! Session driver
//!
//! Owns the cooperative loop for one connection: inbound units and liveness
//! sweeps are handled by the same task, one at a time, so a sweep never
//! observes a half-dispatched unit.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::dispatch::{Dispatcher, InboundUnit, RenderSink, Transport};
use crate::registry::DeviceRegistry;
use crate::session::config::SessionConfig;
use crate::stats::DispatchSnapshot;

/// Drives a dispatcher from a channel of inbound units
pub struct SessionDriver<H, T, S> {
    dispatcher: Dispatcher<H, T, S>,
    config: SessionConfig,
}

impl<H, T, S> SessionDriver<H, T, S>
where
    H: Clone,
    T: Transport,
    S: RenderSink<H>,
{
    /// Create a driver with default configuration
    pub fn new(dispatcher: Dispatcher<H, T, S>) -> Self {
        Self::with_config(dispatcher, SessionConfig::default())
    }

    /// Create a driver with custom configuration
    pub fn with_config(dispatcher: Dispatcher<H, T, S>, config: SessionConfig) -> Self {
        Self { dispatcher, config }
    }

    /// Get the dispatcher
    pub fn dispatcher(&self) -> &Dispatcher<H, T, S> {
        &self.dispatcher
    }

    /// Get the shared registry
    pub fn registry(&self) -> &Arc<DeviceRegistry<H>> {
        self.dispatcher.registry()
    }

    /// Create the inbound channel sized by this driver's configuration
    ///
    /// The transport keeps the sender and pushes each received unit into it.
    pub fn channel(&self) -> (mpsc::Sender<InboundUnit>, mpsc::Receiver<InboundUnit>) {
        mpsc::channel(self.config.inbound_capacity)
    }

    /// Run until the inbound channel closes
    pub async fn run(&self, units: mpsc::Receiver<InboundUnit>) -> DispatchSnapshot {
        self.run_until(units, std::future::pending()).await
    }

    /// Run until the inbound channel closes or `shutdown` resolves
    ///
    /// The sweep ticker lives inside this loop and stops with it. Returns the
    /// dispatch counters at exit.
    pub async fn run_until<F>(
        &self,
        mut units: mpsc::Receiver<InboundUnit>,
        shutdown: F,
    ) -> DispatchSnapshot
    where
        F: Future<Output = ()>,
    {
        let registry = self.dispatcher.registry();
        let mut ticker = registry.config().sweep_ticker();

        tokio::pin!(shutdown);

        tracing::info!(
            sweep_interval_ms = registry.config().sweep_interval.as_millis() as u64,
            liveness_timeout_secs = registry.config().liveness_timeout.as_secs(),
            "Session started"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown signal received");
                    break;
                }
                unit = units.recv() => match unit {
                    Some(unit) => {
                        // Failures are already logged by the dispatcher
                        let _ = self.dispatcher.dispatch(unit);
                    }
                    None => {
                        tracing::debug!("Inbound channel closed");
                        break;
                    }
                },
                _ = ticker.tick() => {
                    registry.sweep_expired();
                }
            }
        }

        let snapshot = self.dispatcher.stats().snapshot();
        tracing::info!(
            units = snapshot.units_received,
            frames = snapshot.frames_recorded,
            dropped = snapshot.units_dropped,
            "Session ended"
        );
        snapshot
    }
}

impl<H, T, S> std::fmt::Debug for SessionDriver<H, T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionDriver")
            .field("dispatcher", &self.dispatcher)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use tokio::sync::oneshot;

    use super::*;
    use crate::codec::encode_frame;
    use crate::dispatch::DiscardSink;
    use crate::registry::{DeviceAddress, DeviceStatus, RegistryConfig};

    const CAM: DeviceAddress = DeviceAddress::new(192, 168, 1, 10);
    const OTHER: DeviceAddress = DeviceAddress::new(192, 168, 1, 11);

    type TestDriver = SessionDriver<(), mpsc::UnboundedSender<String>, DiscardSink>;

    fn driver() -> (Arc<TestDriver>, mpsc::UnboundedReceiver<String>) {
        let config = RegistryConfig::default()
            .liveness_timeout(Duration::from_secs(30))
            .sweep_interval(Duration::from_secs(5));
        let registry = Arc::new(DeviceRegistry::with_config(config));
        let (out_tx, out_rx) = mpsc::unbounded_channel();

        let dispatcher = Dispatcher::new(registry, out_tx, DiscardSink);
        (Arc::new(SessionDriver::new(dispatcher)), out_rx)
    }

    fn add_device(address: &str) -> InboundUnit {
        InboundUnit::Text(
            json!({"kind": "AddDevice", "payload": {"address": address}}).to_string(),
        )
    }

    #[tokio::test]
    async fn test_runs_until_channel_closes() {
        let (driver, _out) = driver();
        let (tx, rx) = driver.channel();

        tx.send(InboundUnit::Binary(encode_frame(CAM, b"early"))).await.unwrap();
        tx.send(add_device("192.168.1.10")).await.unwrap();
        tx.send(InboundUnit::Binary(encode_frame(CAM, b"frame"))).await.unwrap();
        drop(tx);

        let snapshot = driver.run(rx).await;

        assert_eq!(snapshot.units_received, 3);
        assert_eq!(snapshot.units_dropped, 1);
        assert_eq!(snapshot.frames_recorded, 1);
        assert_eq!(driver.registry().get(&CAM).unwrap().frame_count, 1);
    }

    #[tokio::test]
    async fn test_shutdown_stops_loop() {
        let (driver, _out) = driver();
        let (_tx, rx) = driver.channel();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let task = {
            let driver = Arc::clone(&driver);
            tokio::spawn(async move {
                driver
                    .run_until(rx, async {
                        let _ = stop_rx.await;
                    })
                    .await
            })
        };

        stop_tx.send(()).unwrap();
        let snapshot = task.await.unwrap();
        assert_eq!(snapshot.units_received, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_runs_between_units() {
        let (driver, _out) = driver();
        let (tx, rx) = driver.channel();

        let task = {
            let driver = Arc::clone(&driver);
            tokio::spawn(async move { driver.run(rx).await })
        };

        tx.send(add_device("192.168.1.10")).await.unwrap();
        tx.send(add_device("192.168.1.11")).await.unwrap();

        // OTHER keeps streaming, CAM goes quiet
        for _ in 0..7 {
            tokio::time::sleep(Duration::from_secs(5)).await;
            tx.send(InboundUnit::Binary(encode_frame(OTHER, b"jpg"))).await.unwrap();
        }
        tokio::time::sleep(Duration::from_secs(2)).await;

        let registry = driver.registry();
        assert_eq!(registry.get(&CAM).unwrap().status, DeviceStatus::Disconnected);
        assert_eq!(registry.get(&OTHER).unwrap().status, DeviceStatus::Connected);
        assert_eq!(registry.count(), 2);

        drop(tx);
        let snapshot = task.await.unwrap();
        assert_eq!(snapshot.frames_recorded, 7);
    }

    #[tokio::test]
    async fn test_send_through_dispatcher() {
        let (driver, mut out) = driver();

        driver
            .dispatcher()
            .send("SetStreaming", &json!({"address": "192.168.1.10", "enabled": true}))
            .unwrap();

        let text = out.recv().await.unwrap();
        assert!(text.contains("\"kind\":\"SetStreaming\""));
    }
}
