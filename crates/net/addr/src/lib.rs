//! Immutable interface address descriptors.
//!
//! - [`descriptor`] - the validated address + prefix value type
//! - [`scope`] - routing scope classification (host, link, site, universe)
//! - [`flags`] - kernel-style address flag bits and read-time lifecycle derivation
//! - [`lifetime`] - deprecation/expiration sentinels in boot-relative milliseconds
//! - [`wire`] - the two-generation transfer layout

pub mod descriptor;
pub mod error;
pub mod flags;
pub mod lifetime;
pub mod scope;
pub mod wire;

pub use descriptor::IfaceAddress;
pub use error::InvalidIfaceAddress;
pub use lifetime::Lifetime;
pub use scope::AddressScope;
pub use wire::{WireError, WireVersion};
