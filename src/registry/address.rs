//! Device address type
//!
//! Devices are keyed by a dotted-quad address. The binary frame header carries
//! the same four octets, so both channels resolve to the same key.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Unique identifier for a device (dotted-quad address)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceAddress(Ipv4Addr);

impl DeviceAddress {
    /// Create an address from its four octets
    pub const fn new(a: u8, b: u8, c: u8, d: u8) -> Self {
        Self(Ipv4Addr::new(a, b, c, d))
    }

    /// The four octets, in wire order
    pub fn octets(&self) -> [u8; 4] {
        self.0.octets()
    }
}

impl From<[u8; 4]> for DeviceAddress {
    fn from(octets: [u8; 4]) -> Self {
        Self(Ipv4Addr::from(octets))
    }
}

impl From<Ipv4Addr> for DeviceAddress {
    fn from(addr: Ipv4Addr) -> Self {
        Self(addr)
    }
}

impl From<DeviceAddress> for Ipv4Addr {
    fn from(addr: DeviceAddress) -> Self {
        addr.0
    }
}

/// Error returned when a string is not a dotted-quad address
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid device address: {0:?}")]
pub struct AddressParseError(pub String);

impl FromStr for DeviceAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Ipv4Addr already rejects leading zeros, extra octets and
        // out-of-range values; whitespace is not trimmed on purpose.
        s.parse::<Ipv4Addr>()
            .map(Self)
            .map_err(|_| AddressParseError(s.to_string()))
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for DeviceAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DeviceAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
