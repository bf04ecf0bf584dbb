//! The interface address descriptor.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::IpAddr;
use std::str::FromStr;

use ipnet::{IpNet, Ipv4Net, Ipv6Net};

use crate::error::InvalidIfaceAddress;
use crate::flags;
use crate::lifetime::Lifetime;
use crate::scope::AddressScope;

/// One address assigned to a network interface, with its prefix
/// length, state flags, routing scope and lease lifetimes.
///
/// Immutable once constructed; "changing" an address means building a
/// new descriptor. Safe to share across threads without
/// synchronization. The stored flag mask is fixed at construction;
/// what a reader observes comes from
/// [`effective_flags`](Self::effective_flags), which reconciles the
/// mask with the lifetimes at the caller-supplied clock reading.
#[derive(Debug, Clone, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "raw::RawIfaceAddress", into = "raw::RawIfaceAddress")
)]
pub struct IfaceAddress {
    addr: IpAddr,
    prefix_len: u8,
    flags: u32,
    scope: AddressScope,
    deprecation: Lifetime,
    expiration: Lifetime,
}

impl IfaceAddress {
    /// Address with the given prefix length, no flags, classified
    /// scope and no lifetime information.
    pub fn new(addr: IpAddr, prefix_len: u8) -> Result<Self, InvalidIfaceAddress> {
        Self::from_raw_parts(addr, prefix_len, 0, None, Lifetime::Unknown, Lifetime::Unknown)
    }

    /// Address with explicit flags and, optionally, an explicit scope.
    ///
    /// A supplied scope is stored verbatim; `None` stores the scope
    /// computed by [`AddressScope::classify`]. The flag mask is not
    /// constrained: nonsensical combinations are the kernel's business,
    /// not ours.
    pub fn with_properties(
        addr: IpAddr,
        prefix_len: u8,
        flags: u32,
        scope: Option<AddressScope>,
    ) -> Result<Self, InvalidIfaceAddress> {
        Self::from_raw_parts(addr, prefix_len, flags, scope, Lifetime::Unknown, Lifetime::Unknown)
    }

    /// Full construction surface including the lease lifetimes.
    ///
    /// The lifetimes must either both be [`Lifetime::Unknown`] or both
    /// be known, with deprecation no later than expiration.
    pub fn with_lifetimes(
        addr: IpAddr,
        prefix_len: u8,
        flags: u32,
        scope: Option<AddressScope>,
        deprecation: Lifetime,
        expiration: Lifetime,
    ) -> Result<Self, InvalidIfaceAddress> {
        Self::from_raw_parts(addr, prefix_len, flags, scope, deprecation, expiration)
    }

    /// Parse `"<address>/<prefix>"` with explicit flags/scope.
    pub fn parse_with_properties(
        s: &str,
        flags: u32,
        scope: Option<AddressScope>,
    ) -> Result<Self, InvalidIfaceAddress> {
        let unparsable = || InvalidIfaceAddress::UnparsableAddress(s.to_string());
        let (addr_part, prefix_part) = s.split_once('/').ok_or_else(unparsable)?;
        let addr: IpAddr = addr_part.parse().map_err(|_| unparsable())?;
        // Parsed wide so that "/-1" and "/300" report as range errors,
        // not parse errors.
        let prefix_len: i32 = prefix_part.parse().map_err(|_| unparsable())?;
        let max = family_prefix_max(addr);
        if prefix_len < 0 || prefix_len > i32::from(max) {
            return Err(InvalidIfaceAddress::PrefixOutOfRange { prefix_len, max });
        }
        Self::from_raw_parts(
            addr,
            prefix_len as u8,
            flags,
            scope,
            Lifetime::Unknown,
            Lifetime::Unknown,
        )
    }

    /// The single validator every construction surface funnels into.
    ///
    /// Also the decode funnel for [`wire`](crate::wire) and the serde
    /// mirror, so nothing observable can bypass these checks.
    pub(crate) fn from_raw_parts(
        addr: IpAddr,
        prefix_len: u8,
        flags: u32,
        scope: Option<AddressScope>,
        deprecation: Lifetime,
        expiration: Lifetime,
    ) -> Result<Self, InvalidIfaceAddress> {
        let max = family_prefix_max(addr);
        if prefix_len > max {
            return Err(InvalidIfaceAddress::PrefixOutOfRange {
                prefix_len: i32::from(prefix_len),
                max,
            });
        }
        if addr.is_multicast() {
            return Err(InvalidIfaceAddress::MulticastAddress(addr));
        }
        if deprecation.is_unknown() != expiration.is_unknown() {
            return Err(InvalidIfaceAddress::AsymmetricLifetime);
        }
        for lifetime in [deprecation, expiration] {
            if let Lifetime::At(ms) = lifetime
                && ms < 0
            {
                return Err(InvalidIfaceAddress::NegativeTimestamp(ms));
            }
        }
        if !deprecation.is_unknown() && deprecation.sort_key() > expiration.sort_key() {
            return Err(InvalidIfaceAddress::DeprecationAfterExpiration);
        }
        Ok(Self {
            addr,
            prefix_len,
            flags,
            scope: scope.unwrap_or_else(|| AddressScope::classify(addr)),
            deprecation,
            expiration,
        })
    }

    pub fn address(&self) -> IpAddr {
        self.addr
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    pub fn is_ipv4(&self) -> bool {
        self.addr.is_ipv4()
    }

    pub fn is_ipv6(&self) -> bool {
        self.addr.is_ipv6()
    }

    /// IPv6 unique local address, fc00::/7.
    pub fn is_ipv6_ula(&self) -> bool {
        match self.addr {
            IpAddr::V6(v6) => v6.is_unique_local(),
            IpAddr::V4(_) => false,
        }
    }

    pub fn scope(&self) -> AddressScope {
        self.scope
    }

    /// The mask exactly as given at construction, before any
    /// lifecycle derivation.
    pub fn stored_flags(&self) -> u32 {
        self.flags
    }

    /// Returns the stored deprecation lifetime unchanged; the
    /// derivation applies only to the flags read path.
    pub fn deprecation_time(&self) -> Lifetime {
        self.deprecation
    }

    /// Returns the stored expiration lifetime unchanged.
    pub fn expiration_time(&self) -> Lifetime {
        self.expiration
    }

    /// The flag mask a reader should observe at `now_ms` on the
    /// boot-relative clock. See [`flags::effective`].
    pub fn effective_flags(&self, now_ms: i64) -> u32 {
        flags::effective(self.flags, self.deprecation, self.expiration, now_ms)
    }

    /// Whether `bit` is set in the effective mask at `now_ms`.
    pub fn has_flag(&self, now_ms: i64, bit: u32) -> bool {
        self.effective_flags(now_ms) & bit != 0
    }

    /// Whether the two descriptors denote the same address: address
    /// bytes and prefix length match, flags and scope ignored.
    ///
    /// Coarser than `==`. Higher layers use it to tell "the same
    /// address re-announced with different state" from a genuinely
    /// new address.
    pub fn is_same_address_as(&self, other: &IfaceAddress) -> bool {
        self.addr == other.addr && self.prefix_len == other.prefix_len
    }

    /// Whether this address may be handed out as a default global
    /// source address at `now_ms`.
    ///
    /// Universe scope only, never an IPv6 ULA, and the effective flags
    /// must carry neither DADFAILED nor DEPRECATED. A TENTATIVE
    /// address qualifies only while OPTIMISTIC is also set (when the
    /// tentative state clears, DAD has either succeeded or failed and
    /// both bits drop together).
    pub fn is_global_preferred(&self, now_ms: i64) -> bool {
        let flags = self.effective_flags(now_ms);
        self.scope == AddressScope::Universe
            && !self.is_ipv6_ula()
            && flags & (flags::DADFAILED | flags::DEPRECATED) == 0
            && (flags & flags::TENTATIVE == 0 || flags & flags::OPTIMISTIC != 0)
    }
}

fn family_prefix_max(addr: IpAddr) -> u8 {
    if addr.is_ipv4() { 32 } else { 128 }
}

/// Full equality: address, prefix length, flags and scope. Lifetimes
/// are excluded; an administratively identical address may have been
/// refreshed with new lease times.
impl PartialEq for IfaceAddress {
    fn eq(&self, other: &Self) -> bool {
        self.addr == other.addr
            && self.prefix_len == other.prefix_len
            && self.flags == other.flags
            && self.scope == other.scope
    }
}

impl Hash for IfaceAddress {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr.hash(state);
        self.prefix_len.hash(state);
        self.flags.hash(state);
        self.scope.hash(state);
    }
}

impl fmt::Display for IfaceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix_len)
    }
}

impl FromStr for IfaceAddress {
    type Err = InvalidIfaceAddress;

    /// Parse `"<address>/<prefix>"`: no flags, classified scope.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with_properties(s, 0, None)
    }
}

/// Platform-reported interface addresses arrive as [`IpNet`] values
/// (interface watchers and enumerators both speak it); they funnel
/// through the same validator as everything else.
impl TryFrom<IpNet> for IfaceAddress {
    type Error = InvalidIfaceAddress;

    fn try_from(net: IpNet) -> Result<Self, Self::Error> {
        Self::new(net.addr(), net.prefix_len())
    }
}

impl TryFrom<Ipv4Net> for IfaceAddress {
    type Error = InvalidIfaceAddress;

    fn try_from(net: Ipv4Net) -> Result<Self, Self::Error> {
        Self::try_from(IpNet::V4(net))
    }
}

impl TryFrom<Ipv6Net> for IfaceAddress {
    type Error = InvalidIfaceAddress;

    fn try_from(net: Ipv6Net) -> Result<Self, Self::Error> {
        Self::try_from(IpNet::V6(net))
    }
}

#[cfg(feature = "serde")]
mod raw {
    //! Serde mirror. Deserialization rebuilds through the validator so
    //! a hand-edited or hostile payload cannot yield an invalid
    //! descriptor.

    use super::*;

    #[derive(serde::Serialize, serde::Deserialize)]
    pub(super) struct RawIfaceAddress {
        addr: IpAddr,
        prefix_len: u8,
        flags: u32,
        scope: AddressScope,
        deprecation: Lifetime,
        expiration: Lifetime,
    }

    impl From<IfaceAddress> for RawIfaceAddress {
        fn from(value: IfaceAddress) -> Self {
            RawIfaceAddress {
                addr: value.addr,
                prefix_len: value.prefix_len,
                flags: value.flags,
                scope: value.scope,
                deprecation: value.deprecation,
                expiration: value.expiration,
            }
        }
    }

    impl TryFrom<RawIfaceAddress> for IfaceAddress {
        type Error = InvalidIfaceAddress;

        fn try_from(value: RawIfaceAddress) -> Result<Self, Self::Error> {
            IfaceAddress::from_raw_parts(
                value.addr,
                value.prefix_len,
                value.flags,
                Some(value.scope),
                value.deprecation,
                value.expiration,
            )
        }
    }
}
