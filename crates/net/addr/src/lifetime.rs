//! Deprecation/expiration lifetimes.
//!
//! Lifetimes are expressed on the boot-relative monotonic clock, in
//! milliseconds, so that derived flags are immune to wall-clock
//! adjustments. The clock itself is never read here; readers pass the
//! current value in.

use crate::error::InvalidIfaceAddress;

/// Raw wire value standing for [`Lifetime::Unknown`].
pub const RAW_UNKNOWN: i64 = -1;
/// Raw wire value standing for [`Lifetime::Permanent`].
pub const RAW_PERMANENT: i64 = i64::MAX;

/// One end of an address lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Lifetime {
    /// No lifetime information. Lifetime-unaware construction path.
    Unknown,
    /// Infinitely far in the future.
    Permanent,
    /// Milliseconds since boot, on the same clock readers pass to the
    /// flag deriver. Never negative.
    At(i64),
}

impl Lifetime {
    pub fn is_unknown(self) -> bool {
        self == Lifetime::Unknown
    }

    /// Key for the `deprecation <= expiration` comparison, with
    /// [`Lifetime::Permanent`] sorting after every concrete instant.
    /// [`Lifetime::Unknown`] has no position; validation rules it out
    /// before any comparison.
    pub(crate) fn sort_key(self) -> i128 {
        match self {
            Lifetime::Unknown => i128::MIN,
            Lifetime::Permanent => i128::MAX,
            Lifetime::At(ms) => ms as i128,
        }
    }

    /// The raw i64 carried in the wire layout.
    pub fn to_raw(self) -> i64 {
        match self {
            Lifetime::Unknown => RAW_UNKNOWN,
            Lifetime::Permanent => RAW_PERMANENT,
            Lifetime::At(ms) => ms,
        }
    }

    /// Reverse of [`to_raw`](Self::to_raw). Negative values other than
    /// the unknown sentinel have no meaning on a boot-relative clock.
    pub fn from_raw(raw: i64) -> Result<Lifetime, InvalidIfaceAddress> {
        match raw {
            RAW_UNKNOWN => Ok(Lifetime::Unknown),
            RAW_PERMANENT => Ok(Lifetime::Permanent),
            ms if ms >= 0 => Ok(Lifetime::At(ms)),
            ms => Err(InvalidIfaceAddress::NegativeTimestamp(ms)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn raw_round_trip() {
        for lifetime in [Lifetime::Unknown, Lifetime::Permanent, Lifetime::At(0), Lifetime::At(3_600_000)] {
            assert_eq!(Lifetime::from_raw(lifetime.to_raw()), Ok(lifetime));
        }
    }

    #[test]
    fn negative_raw_rejected() {
        assert_matches!(
            Lifetime::from_raw(-2),
            Err(InvalidIfaceAddress::NegativeTimestamp(-2))
        );
    }

    #[test]
    fn permanent_sorts_after_any_instant() {
        assert!(Lifetime::At(i64::MAX - 1).sort_key() < Lifetime::Permanent.sort_key());
        assert!(Lifetime::At(100_000).sort_key() <= Lifetime::At(200_000).sort_key());
    }
}
