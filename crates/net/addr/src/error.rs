//! Validation errors for interface address construction.

use std::net::IpAddr;

/// Why a set of raw parts does not form a valid interface address.
///
/// Every construction surface reports through this one enum; there is
/// no partially-built descriptor to inspect on failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidIfaceAddress {
    /// The textual input was missing a component or failed to parse.
    #[error("unparsable interface address {0:?}")]
    UnparsableAddress(String),
    /// Prefix length outside the family range (0..=32 for IPv4, 0..=128 for IPv6).
    #[error("prefix length {prefix_len} out of range (family maximum {max})")]
    PrefixOutOfRange { prefix_len: i32, max: u8 },
    /// Multicast addresses are never assigned to an interface.
    #[error("multicast address {0} cannot be an interface address")]
    MulticastAddress(IpAddr),
    /// Exactly one of deprecation/expiration was known. They come in pairs.
    #[error("deprecation and expiration times must both be known or both be unknown")]
    AsymmetricLifetime,
    /// Deprecation scheduled after the address has already expired.
    #[error("deprecation time is later than expiration time")]
    DeprecationAfterExpiration,
    /// Lifetimes are boot-relative and cannot be negative.
    #[error("negative lifetime timestamp {0}")]
    NegativeTimestamp(i64),
}
