//! Kernel-style interface address flag bits.
//!
//! The stored bitmask is opaque to this crate except for the two bits
//! the lifecycle deriver owns: [`DEPRECATED`] and [`PERMANENT`] are
//! recomputed from the lifetimes on every read through
//! [`effective`], never rewritten in place.

use crate::lifetime::Lifetime;

/// Privacy-extension temporary address.
pub const TEMPORARY: u32 = 0x01;
/// Duplicate address detection disabled.
pub const NODAD: u32 = 0x02;
/// Optimistic DAD: usable while still tentative.
pub const OPTIMISTIC: u32 = 0x04;
/// Duplicate address detection failed.
pub const DADFAILED: u32 = 0x08;
/// Mobile-IPv6 home address.
pub const HOMEADDRESS: u32 = 0x10;
/// Past its preferred lifetime.
pub const DEPRECATED: u32 = 0x20;
/// Duplicate address detection still in progress.
pub const TENTATIVE: u32 = 0x40;
/// No lease: the address never deprecates or expires.
pub const PERMANENT: u32 = 0x80;
/// Kernel manages a temporary address for this prefix.
pub const MANAGETEMPADDR: u32 = 0x100;
/// Do not install a prefix route for this address.
pub const NOPREFIXROUTE: u32 = 0x200;
/// Join multicast groups automatically.
pub const MCAUTOJOIN: u32 = 0x400;
/// RFC 7217 stable privacy address.
pub const STABLE_PRIVACY: u32 = 0x800;

/// Derive the flags a reader should observe at `now_ms`.
///
/// A known deprecation time overrides the stored [`DEPRECATED`] bit in
/// both directions: once `now_ms` reaches it the bit is on, and a
/// deprecation scheduled for the future keeps the bit off even if it
/// was set at construction. [`PERMANENT`] is on exactly when both
/// lifetimes are the permanent sentinel and off whenever a real
/// lease exists. Lifetime-unaware descriptors (both sentinels
/// [`Lifetime::Unknown`]) pass the stored mask through untouched.
#[inline]
pub fn effective(stored: u32, deprecation: Lifetime, expiration: Lifetime, now_ms: i64) -> u32 {
    let mut flags = stored;
    match deprecation {
        Lifetime::Unknown => {}
        Lifetime::Permanent => flags &= !DEPRECATED,
        Lifetime::At(at_ms) => {
            if now_ms >= at_ms {
                flags |= DEPRECATED;
            } else {
                flags &= !DEPRECATED;
            }
        }
    }
    match (deprecation, expiration) {
        (Lifetime::Permanent, Lifetime::Permanent) => flags |= PERMANENT,
        (Lifetime::Unknown, Lifetime::Unknown) => {}
        _ => flags &= !PERMANENT,
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_lifetimes_pass_through() {
        let stored = DEPRECATED | PERMANENT | TEMPORARY;
        assert_eq!(
            effective(stored, Lifetime::Unknown, Lifetime::Unknown, 0),
            stored
        );
    }

    #[test]
    fn reached_deprecation_forces_bit_on() {
        let derived = effective(0, Lifetime::At(1), Lifetime::Permanent, 1);
        assert_ne!(derived & DEPRECATED, 0);
        let derived = effective(0, Lifetime::At(1), Lifetime::Permanent, 5_000);
        assert_ne!(derived & DEPRECATED, 0);
    }

    #[test]
    fn future_deprecation_forces_bit_off() {
        let derived = effective(DEPRECATED, Lifetime::At(100_000), Lifetime::Permanent, 99_999);
        assert_eq!(derived & DEPRECATED, 0);
    }

    #[test]
    fn permanent_lifetimes_force_permanent_on() {
        let derived = effective(DEPRECATED, Lifetime::Permanent, Lifetime::Permanent, 0);
        assert_ne!(derived & PERMANENT, 0);
        // A permanent deprecation time never deprecates.
        assert_eq!(derived & DEPRECATED, 0);
    }

    #[test]
    fn finite_lease_forces_permanent_off() {
        let derived = effective(PERMANENT, Lifetime::At(1_000), Lifetime::At(100_000), 0);
        assert_eq!(derived & PERMANENT, 0);
        // Mixed concrete deprecation with permanent expiration is still a lease.
        let derived = effective(PERMANENT, Lifetime::At(1_000), Lifetime::Permanent, 0);
        assert_eq!(derived & PERMANENT, 0);
    }

    #[test]
    fn unrelated_bits_untouched() {
        let stored = TEMPORARY | TENTATIVE | OPTIMISTIC;
        let derived = effective(stored, Lifetime::At(1), Lifetime::Permanent, 10);
        assert_eq!(derived & stored, stored);
    }
}
