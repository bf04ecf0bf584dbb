//! Transfer layout for interface addresses.
//!
//! The descriptor crosses process and persistence boundaries as a
//! fixed, ordered field sequence:
//!
//! 1. address octet count (`u8`, 4 or 16) followed by the raw octets
//! 2. prefix length (`u8`)
//! 3. flags (`u32`, big-endian)
//! 4. rtnetlink scope code (`u8`)
//! 5. raw deprecation lifetime (`i64`, big-endian) — current layout only
//! 6. raw expiration lifetime (`i64`, big-endian) — current layout only
//!
//! Two generations exist. [`WireVersion::Legacy`] stops after field 4;
//! [`WireVersion::Lifetimes`] appends fields 5 and 6, never
//! interleaving, so a legacy reader that ignores trailing fields keeps
//! working. [`IfaceAddress::decode`] resolves the generation from the
//! field count and rejects trailing bytes; [`IfaceAddress::decode_legacy`]
//! is the explicit compatibility mode that ignores them.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::descriptor::IfaceAddress;
use crate::error::InvalidIfaceAddress;
use crate::lifetime::Lifetime;
use crate::scope::AddressScope;

/// Which generation of the layout to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireVersion {
    /// Four fields: address, prefix, flags, scope.
    Legacy,
    /// The legacy four plus the two lifetimes.
    Lifetimes,
}

/// Malformed wire data. Decoding never yields a partial descriptor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("wire buffer ended mid-field")]
    Truncated,
    #[error("address length {0} is not an IPv4 or IPv6 octet count")]
    BadAddressLength(u8),
    #[error("unknown scope code {0}")]
    UnknownScope(u8),
    #[error("{0} trailing bytes after the last field")]
    TrailingBytes(usize),
    #[error(transparent)]
    Invalid(#[from] InvalidIfaceAddress),
}

impl IfaceAddress {
    /// Append the wire form to `dst`.
    pub fn encode(&self, version: WireVersion, dst: &mut BytesMut) {
        match self.address() {
            IpAddr::V4(v4) => {
                dst.put_u8(4);
                dst.put_slice(&v4.octets());
            }
            IpAddr::V6(v6) => {
                dst.put_u8(16);
                dst.put_slice(&v6.octets());
            }
        }
        dst.put_u8(self.prefix_len());
        dst.put_u32(self.stored_flags());
        dst.put_u8(self.scope().code());
        if version == WireVersion::Lifetimes {
            dst.put_i64(self.deprecation_time().to_raw());
            dst.put_i64(self.expiration_time().to_raw());
        }
    }

    /// The wire form as a freshly allocated buffer.
    pub fn to_wire(&self, version: WireVersion) -> Bytes {
        let mut dst = BytesMut::with_capacity(self.encoded_len(version));
        self.encode(version, &mut dst);
        dst.freeze()
    }

    pub fn encoded_len(&self, version: WireVersion) -> usize {
        let addr_len = if self.is_ipv4() { 4 } else { 16 };
        let legacy = 1 + addr_len + 1 + 4 + 1;
        match version {
            WireVersion::Legacy => legacy,
            WireVersion::Lifetimes => legacy + 8 + 8,
        }
    }

    /// Decode one descriptor, resolving the layout generation from the
    /// field count. A buffer that ends after the scope field is the
    /// legacy layout; otherwise both lifetimes must follow. Anything
    /// left over afterwards is an error, not extra compatibility.
    pub fn decode(bytes: &[u8]) -> Result<IfaceAddress, WireError> {
        let mut buf = bytes;
        let (addr, prefix_len, flags, scope) = decode_legacy_fields(&mut buf)?;
        let (deprecation, expiration) = if buf.has_remaining() {
            if buf.remaining() < 16 {
                return Err(WireError::Truncated);
            }
            (
                Lifetime::from_raw(buf.get_i64())?,
                Lifetime::from_raw(buf.get_i64())?,
            )
        } else {
            (Lifetime::Unknown, Lifetime::Unknown)
        };
        if buf.has_remaining() {
            return Err(WireError::TrailingBytes(buf.remaining()));
        }
        Ok(IfaceAddress::from_raw_parts(
            addr,
            prefix_len,
            flags,
            Some(scope),
            deprecation,
            expiration,
        )?)
    }

    /// Legacy-compatibility decode: read the four legacy fields and
    /// ignore whatever follows, the way a legacy reader would.
    pub fn decode_legacy(bytes: &[u8]) -> Result<IfaceAddress, WireError> {
        let mut buf = bytes;
        let (addr, prefix_len, flags, scope) = decode_legacy_fields(&mut buf)?;
        Ok(IfaceAddress::from_raw_parts(
            addr,
            prefix_len,
            flags,
            Some(scope),
            Lifetime::Unknown,
            Lifetime::Unknown,
        )?)
    }
}

fn decode_legacy_fields(
    buf: &mut &[u8],
) -> Result<(IpAddr, u8, u32, AddressScope), WireError> {
    if buf.remaining() < 1 {
        return Err(WireError::Truncated);
    }
    let addr_len = buf.get_u8();
    let addr: IpAddr = match addr_len {
        4 => {
            if buf.remaining() < 4 {
                return Err(WireError::Truncated);
            }
            let mut octets = [0u8; 4];
            buf.copy_to_slice(&mut octets);
            Ipv4Addr::from(octets).into()
        }
        16 => {
            if buf.remaining() < 16 {
                return Err(WireError::Truncated);
            }
            let mut octets = [0u8; 16];
            buf.copy_to_slice(&mut octets);
            Ipv6Addr::from(octets).into()
        }
        other => return Err(WireError::BadAddressLength(other)),
    };
    if buf.remaining() < 1 + 4 + 1 {
        return Err(WireError::Truncated);
    }
    let prefix_len = buf.get_u8();
    let flags = buf.get_u32();
    let scope_code = buf.get_u8();
    let scope =
        AddressScope::from_repr(scope_code).ok_or(WireError::UnknownScope(scope_code))?;
    Ok((addr, prefix_len, flags, scope))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::{PERMANENT, TEMPORARY};
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    fn lifetimed() -> IfaceAddress {
        IfaceAddress::with_lifetimes(
            "2001:db8::1".parse().unwrap(),
            64,
            TEMPORARY,
            Some(AddressScope::Universe),
            Lifetime::At(100_000),
            Lifetime::Permanent,
        )
        .unwrap()
    }

    #[test]
    fn legacy_layout_round_trips() {
        let addr = IfaceAddress::parse_with_properties(
            "192.0.2.1/28",
            PERMANENT,
            Some(AddressScope::Link),
        )
        .unwrap();
        let wire = addr.to_wire(WireVersion::Legacy);
        assert_eq!(wire.len(), addr.encoded_len(WireVersion::Legacy));

        let decoded = IfaceAddress::decode(&wire).unwrap();
        assert_eq!(decoded, addr);
        assert!(decoded.deprecation_time().is_unknown());
        assert_eq!(decoded.to_wire(WireVersion::Legacy), wire);
    }

    #[test]
    fn lifetime_layout_round_trips() {
        let addr = lifetimed();
        let wire = addr.to_wire(WireVersion::Lifetimes);
        assert_eq!(wire.len(), addr.encoded_len(WireVersion::Lifetimes));

        let decoded = IfaceAddress::decode(&wire).unwrap();
        assert_eq!(decoded, addr);
        assert_eq!(decoded.deprecation_time(), Lifetime::At(100_000));
        assert_eq!(decoded.expiration_time(), Lifetime::Permanent);
        assert_eq!(decoded.to_wire(WireVersion::Lifetimes), wire);
    }

    #[test]
    fn lifetime_fields_append_after_legacy_fields() {
        let addr = lifetimed();
        let legacy = addr.to_wire(WireVersion::Legacy);
        let current = addr.to_wire(WireVersion::Lifetimes);
        assert_eq!(&current[..legacy.len()], &legacy[..]);
        assert_eq!(current.len(), legacy.len() + 16);
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut wire = BytesMut::from(&lifetimed().to_wire(WireVersion::Lifetimes)[..]);
        wire.put_u8(0);
        assert_matches!(
            IfaceAddress::decode(&wire),
            Err(WireError::TrailingBytes(1))
        );

        // One lifetime without the other is a truncated current layout,
        // not a legacy buffer with slack.
        let wire = &lifetimed().to_wire(WireVersion::Lifetimes);
        assert_matches!(
            IfaceAddress::decode(&wire[..wire.len() - 8]),
            Err(WireError::Truncated)
        );
    }

    #[test]
    fn legacy_mode_ignores_trailing_fields() {
        let addr = lifetimed();
        let wire = addr.to_wire(WireVersion::Lifetimes);
        let decoded = IfaceAddress::decode_legacy(&wire).unwrap();
        assert_eq!(decoded, addr);
        assert!(decoded.deprecation_time().is_unknown());
        assert!(decoded.expiration_time().is_unknown());
    }

    #[test]
    fn truncated_buffers_rejected() {
        let wire = lifetimed().to_wire(WireVersion::Legacy);
        for len in 0..wire.len() {
            assert_matches!(
                IfaceAddress::decode(&wire[..len]),
                Err(WireError::Truncated),
                "prefix of length {len}"
            );
        }
    }

    #[test]
    fn bad_address_length_rejected() {
        assert_matches!(
            IfaceAddress::decode(&[5, 1, 2, 3, 4, 5, 24, 0, 0, 0, 0, 0]),
            Err(WireError::BadAddressLength(5))
        );
    }

    #[test]
    fn unknown_scope_code_rejected() {
        let mut wire = BytesMut::from(&lifetimed().to_wire(WireVersion::Legacy)[..]);
        let scope_at = wire.len() - 1;
        wire[scope_at] = 7;
        assert_matches!(IfaceAddress::decode(&wire), Err(WireError::UnknownScope(7)));
    }

    #[test]
    fn decoded_parts_still_validated() {
        // 224.0.0.2/32, no flags, universe scope: well-formed bytes,
        // invalid descriptor.
        let wire = [4u8, 224, 0, 0, 2, 32, 0, 0, 0, 0, 0];
        assert_matches!(
            IfaceAddress::decode(&wire),
            Err(WireError::Invalid(InvalidIfaceAddress::MulticastAddress(_)))
        );

        // Negative non-sentinel lifetime on the wire.
        let mut wire = BytesMut::from(&lifetimed().to_wire(WireVersion::Legacy)[..]);
        wire.put_i64(-2);
        wire.put_i64(100_000);
        assert_matches!(
            IfaceAddress::decode(&wire),
            Err(WireError::Invalid(InvalidIfaceAddress::NegativeTimestamp(-2)))
        );
    }

    fn arb_addr() -> impl Strategy<Value = IpAddr> {
        prop_oneof![
            any::<[u8; 4]>().prop_map(|octets| IpAddr::from(Ipv4Addr::from(octets))),
            any::<[u8; 16]>().prop_map(|octets| IpAddr::from(Ipv6Addr::from(octets))),
        ]
    }

    fn arb_scope() -> impl Strategy<Value = AddressScope> {
        prop_oneof![
            Just(AddressScope::Universe),
            Just(AddressScope::Site),
            Just(AddressScope::Link),
            Just(AddressScope::Host),
        ]
    }

    fn arb_lifetimes() -> impl Strategy<Value = (Lifetime, Lifetime)> {
        prop_oneof![
            Just((Lifetime::Unknown, Lifetime::Unknown)),
            Just((Lifetime::Permanent, Lifetime::Permanent)),
            (0i64..1_000_000).prop_map(|dep| (Lifetime::At(dep), Lifetime::Permanent)),
            (0i64..1_000_000, 0i64..1_000_000).prop_map(|(a, b)| {
                (Lifetime::At(a.min(b)), Lifetime::At(a.max(b)))
            }),
        ]
    }

    fn arb_address() -> impl Strategy<Value = IfaceAddress> {
        (arb_addr(), any::<u8>(), any::<u32>(), arb_scope(), arb_lifetimes()).prop_filter_map(
            "valid interface address",
            |(addr, prefix_len, flags, scope, (deprecation, expiration))| {
                let max = if addr.is_ipv4() { 32 } else { 128 };
                IfaceAddress::with_lifetimes(
                    addr,
                    prefix_len % (max + 1),
                    flags,
                    Some(scope),
                    deprecation,
                    expiration,
                )
                .ok()
            },
        )
    }

    proptest! {
        #[test]
        fn round_trip_both_generations(addr in arb_address()) {
            let wire = addr.to_wire(WireVersion::Lifetimes);
            let decoded = IfaceAddress::decode(&wire).unwrap();
            prop_assert_eq!(&decoded, &addr);
            prop_assert_eq!(decoded.deprecation_time(), addr.deprecation_time());
            prop_assert_eq!(decoded.expiration_time(), addr.expiration_time());
            prop_assert_eq!(decoded.to_wire(WireVersion::Lifetimes), wire);

            let wire = addr.to_wire(WireVersion::Legacy);
            let decoded = IfaceAddress::decode(&wire).unwrap();
            prop_assert_eq!(&decoded, &addr);
            prop_assert_eq!(decoded.to_wire(WireVersion::Legacy), wire);
        }
    }
}
