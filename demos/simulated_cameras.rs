//! Simulated cameras feeding a session driver
//!
//! Run with: cargo run --example simulated_cameras [SECONDS]
//!
//! Two fake cameras announce themselves over the control channel and push
//! JPEG-like frames. The second camera stops after two seconds, so the
//! liveness sweep (shortened to a 3s timeout here) marks it disconnected.
//! Set RUST_LOG=camlink=trace to see every frame.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use camlink::codec::{encode_frame, ControlMessage, DevicePayload, InitPayload};
use camlink::{
    DeviceAddress, DeviceRecord, DeviceRegistry, Dispatcher, InboundUnit, RegistryConfig,
    SessionDriver,
};
use tokio::sync::mpsc;

const FRONT_DOOR: DeviceAddress = DeviceAddress::new(192, 168, 1, 10);
const GARAGE: DeviceAddress = DeviceAddress::new(192, 168, 1, 11);

/// Fake JPEG: SOI marker, some filler, EOI marker
fn fake_jpeg(seq: u8) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8];
    data.extend(std::iter::repeat(seq).take(64));
    data.extend([0xFF, 0xD9]);
    data
}

async fn camera(
    address: DeviceAddress,
    units: mpsc::Sender<InboundUnit>,
    frames: usize,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    for seq in 0..frames {
        ticker.tick().await;
        let unit = InboundUnit::Binary(encode_frame(address, &fake_jpeg(seq as u8)));
        if units.send(unit).await.is_err() {
            return;
        }
    }
    println!("[{}] camera went quiet", address);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let seconds: u64 = match std::env::args().nth(1) {
        Some(s) => s.parse()?,
        None => 6,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("camlink=info".parse()?),
        )
        .init();

    let config = RegistryConfig::default()
        .liveness_timeout(Duration::from_secs(3))
        .sweep_interval(Duration::from_millis(500));
    let registry: Arc<DeviceRegistry<String>> = Arc::new(DeviceRegistry::with_config(config));

    // The "renderer": gives every camera a tile name
    let weak = Arc::downgrade(&registry);
    registry.notifier().on_added(move |record| {
        println!("[{}] added", record.address);
        if let Some(registry) = weak.upgrade() {
            let _ = registry.attach_render_handle(&record.address, format!("tile-{}", record.address));
        }
    });

    let sink = |payload: Bytes, record: &DeviceRecord<String>| {
        if record.frame_count % 10 == 1 {
            println!(
                "[{}] frame #{} ({} bytes) -> {}",
                record.address,
                record.frame_count,
                payload.len(),
                record.render_handle.as_deref().unwrap_or("<no tile>")
            );
        }
    };

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
    let driver = Arc::new(SessionDriver::new(Dispatcher::new(
        Arc::clone(&registry),
        outbound_tx,
        sink,
    )));
    let (units_tx, units_rx) = driver.channel();

    tokio::spawn(async move {
        while let Some(text) = outbound_rx.recv().await {
            println!("-> transport: {}", text);
        }
    });

    // Announce both cameras, then one bogus unit to show it being dropped
    let init = ControlMessage::Init(InitPayload {
        device_count: 2,
        devices: Some(vec![
            DevicePayload::new(FRONT_DOOR.to_string()),
            DevicePayload::new(GARAGE.to_string()),
        ]),
    });
    units_tx.send(InboundUnit::Text(init.encode()?)).await?;
    units_tx
        .send(InboundUnit::Text(r#"{"kind":"Bogus","payload":{}}"#.to_string()))
        .await?;

    tokio::spawn(camera(FRONT_DOOR, units_tx.clone(), usize::MAX, Duration::from_millis(100)));
    tokio::spawn(camera(GARAGE, units_tx.clone(), 20, Duration::from_millis(100)));
    drop(units_tx);

    driver
        .dispatcher()
        .send("SetStreaming", &serde_json::json!({"enabled": true}))?;

    let run = {
        let driver = Arc::clone(&driver);
        tokio::spawn(async move {
            driver
                .run_until(units_rx, async {
                    tokio::select! {
                        _ = tokio::time::sleep(Duration::from_secs(seconds)) => {}
                        _ = tokio::signal::ctrl_c() => {}
                    }
                })
                .await
        })
    };
    let snapshot = run.await?;

    println!();
    println!("=== Devices ===");
    for record in registry.list() {
        println!(
            "{:<16} {:<13} frames={}",
            record.address.to_string(),
            record.status.to_string(),
            record.frame_count
        );
    }
    println!(
        "units={} frames={} dropped={} ({:.1}%)",
        snapshot.units_received,
        snapshot.frames_recorded,
        snapshot.units_dropped,
        snapshot.drop_rate() * 100.0
    );

    for record in registry.clear() {
        if let Some(tile) = record.render_handle {
            println!("disposing {}", tile);
        }
    }

    Ok(())
}
