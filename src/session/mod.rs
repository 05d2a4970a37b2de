//! Per-connection session handling
//!
//! The transport pushes tagged units into a channel; the [`SessionDriver`]
//! pulls them off one at a time and interleaves the liveness sweep between
//! them.

pub mod config;
pub mod driver;

pub use config::SessionConfig;
pub use driver::SessionDriver;
