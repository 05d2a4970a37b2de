//! Registry error types
//!
//! Error types for device registry operations.

use super::address::DeviceAddress;

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No record exists for this address
    #[error("Device not found: {0}")]
    NotFound(DeviceAddress),
}
