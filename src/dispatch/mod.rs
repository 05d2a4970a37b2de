//! Protocol demultiplexing
//!
//! The dispatcher classifies nothing itself: the transport tags each unit as
//! binary or text, and the dispatcher decodes it, validates it, and turns it
//! into registry calls.
//!
//! ```text
//!  Transport ──InboundUnit──► Dispatcher ──► codec::decode_*
//!                                 │
//!                                 ├─ Binary ─► registry.record_frame() ─► RenderSink::frame()
//!                                 ├─ Init / AddDevice ─► registry.upsert()
//!                                 ├─ RemoveDevice ─► registry.remove() ─► RenderSink::removed()
//!                                 └─ UpdateDevice ─► (no change)
//!
//!  caller ──send(kind, payload)──► codec::encode ──► Transport::try_send()
//! ```

pub mod dispatcher;
pub mod transport;

pub use dispatcher::{Dispatcher, Outcome};
pub use transport::{DiscardSink, InboundUnit, RenderSink, Transport};
