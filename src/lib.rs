//! Device registry and protocol demultiplexer for networked cameras
//!
//! Cameras announce themselves over a JSON control channel and push frames as
//! binary units over the same duplex connection. This crate keeps the
//! authoritative catalog of those devices and turns raw inbound units into
//! catalog changes:
//!
//! - [`codec`]: control envelope and binary frame header encoding
//! - [`registry`]: the device catalog, liveness sweep and change notifier
//! - [`dispatch`]: routes inbound units to registry operations, sends commands
//! - [`session`]: the cooperative loop that feeds the dispatcher and runs sweeps
//!
//! Connection setup and rendering stay outside; they plug in through the
//! [`Transport`] and [`RenderSink`] traits and the registry's notifier.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use camlink::codec::encode_frame;
//! use camlink::{DeviceAddress, DeviceRegistry, DiscardSink, Dispatcher, InboundUnit};
//! use tokio::sync::mpsc;
//!
//! let registry: Arc<DeviceRegistry> = Arc::new(DeviceRegistry::new());
//! registry
//!     .notifier()
//!     .on_added(|record| println!("camera {} joined", record.address));
//!
//! let (outbound, _rx) = mpsc::unbounded_channel::<String>();
//! let dispatcher = Dispatcher::new(Arc::clone(&registry), outbound, DiscardSink);
//!
//! let add = r#"{"kind":"AddDevice","payload":{"address":"192.168.1.10"}}"#;
//! dispatcher.dispatch(InboundUnit::Text(add.to_string())).unwrap();
//!
//! let camera = DeviceAddress::new(192, 168, 1, 10);
//! let frame = encode_frame(camera, &[0xFF, 0xD8, 0xFF, 0xE0]);
//! dispatcher.dispatch(InboundUnit::Binary(frame)).unwrap();
//!
//! assert_eq!(registry.get(&camera).unwrap().frame_count, 1);
//! ```

pub mod codec;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod session;
pub mod stats;

pub use dispatch::{DiscardSink, Dispatcher, InboundUnit, Outcome, RenderSink, Transport};
pub use error::{Error, Result};
pub use registry::{
    ChangeEvent, DeviceAddress, DeviceRecord, DeviceRegistry, DeviceStatus, RegistryConfig,
};
pub use session::{SessionConfig, SessionDriver};
