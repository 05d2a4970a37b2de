//! Device registry and change notification
//!
//! The registry is the authoritative catalog of known devices. It is the only
//! owner of the device map; every other component goes through its methods.
//!
//! # Architecture
//!
//! ```text
//!                        Arc<DeviceRegistry<H>>
//!                   ┌───────────────────────────────┐
//!                   │ devices: HashMap<Address,     │
//!                   │   DeviceRecord {              │
//!                   │     status, frame_count,      │
//!                   │     last_seen_at,             │
//!                   │     render_handle: Option<H>, │
//!                   │   }                           │
//!                   │ >                             │
//!                   │ notifier: added / updated     │
//!                   └───────────────┬───────────────┘
//!                                   │
//!         ┌─────────────────────────┼─────────────────────────┐
//!         │                         │                         │
//!         ▼                         ▼                         ▼
//!    [Dispatcher]             [Sweep ticker]            [Renderer]
//!    upsert()                 sweep(now, timeout)       on_added()
//!    record_frame()                                     attach_render_handle()
//!    remove()                                           disposes removed handles
//! ```
//!
//! # Liveness
//!
//! Inbound activity marks a device connected. Only the sweep marks it
//! disconnected, and only removal deletes it.

pub mod address;
pub mod config;
pub mod entry;
pub mod error;
pub mod notifier;
pub mod store;

pub use address::{AddressParseError, DeviceAddress};
pub use config::RegistryConfig;
pub use entry::{DeviceRecord, DeviceStatus, RegistryStats};
pub use error::RegistryError;
pub use notifier::{ChangeEvent, ChangeNotifier};
pub use store::DeviceRegistry;
