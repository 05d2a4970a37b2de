//! Crate-wide error type
//!
//! Every failure in this crate is local to one inbound unit or one outbound
//! command. None of them leaves the registry in a bad state, and none of
//! them is fatal to the connection.

use crate::codec::CodecError;
use crate::registry::RegistryError;

/// Result type alias for camlink operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error type for dispatch and send operations
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Unit could not be decoded, or a command could not be encoded
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Unit referenced a device the registry does not know
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Control payload carried an address that is not a dotted quad
    #[error("Invalid device address: {0:?}")]
    InvalidAddress(String),

    /// The transport cannot currently send
    #[error("Transport unavailable")]
    TransportUnavailable,
}

impl Error {
    /// Whether the condition is expected in normal operation
    ///
    /// Everything here is recoverable except an unserializable outbound
    /// payload, which the caller has to fix.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::Codec(CodecError::Unserializable(_)))
    }
}
