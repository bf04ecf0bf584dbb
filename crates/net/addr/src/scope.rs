//! Routing scope classification for interface addresses.
//!
//! The scope bounds how far an address is reachable as a source or
//! destination. Discriminants are the rtnetlink scope codes, which is
//! also what the wire layout carries.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Routing reachability of an address, narrowest to widest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::FromRepr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum AddressScope {
    /// Globally routable.
    Universe = 0,
    /// Site-local (deprecated IPv6 fec0::/10 block).
    Site = 200,
    /// Valid on the attached link only.
    Link = 253,
    /// Valid on this host only.
    Host = 254,
}

impl AddressScope {
    /// Classify an address that arrived without an explicit scope.
    ///
    /// First match wins. Note the asymmetry inherited from the routing
    /// stack: only the unspecified addresses are `Host`; loopback
    /// classifies as `Link` in both families.
    pub fn classify(addr: IpAddr) -> AddressScope {
        match addr {
            IpAddr::V4(v4) => Self::classify_v4(v4),
            IpAddr::V6(v6) => Self::classify_v6(v6),
        }
    }

    fn classify_v4(addr: Ipv4Addr) -> AddressScope {
        if addr.is_unspecified() {
            AddressScope::Host
        } else if addr.is_loopback() || addr.is_link_local() {
            AddressScope::Link
        } else {
            AddressScope::Universe
        }
    }

    fn classify_v6(addr: Ipv6Addr) -> AddressScope {
        if addr.is_unspecified() {
            AddressScope::Host
        } else if addr.is_loopback() || addr.is_unicast_link_local() {
            AddressScope::Link
        } else if is_site_local(addr) {
            AddressScope::Site
        } else {
            AddressScope::Universe
        }
    }

    /// The rtnetlink code for this scope, as carried on the wire.
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// fec0::/10. Deprecated by RFC 3879 but still classified distinctly.
fn is_site_local(addr: Ipv6Addr) -> bool {
    let [first, ..] = addr.segments();
    (first & 0xffc0) == 0xfec0
}
