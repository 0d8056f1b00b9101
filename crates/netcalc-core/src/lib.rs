//! Core types for netcalc (network address calculator)
//!
//! This crate provides the foundational types used throughout the netcalc workspace:
//! - [`IpFamily`] - IPv4 or IPv6
//! - [`ParsedAddress`] - a validated address in canonical numeric form
//! - [`ParsedNetwork`] - an address plus a prefix length
//! - [`AddressCount`] - exact address counts up to 2^128
//! - [`NetcalcError`] - Error types
//!
//! ```
//! use netcalc_core::{parse, FamilyHint, Parsed};
//!
//! let parsed = parse("10.0.0.0/24", FamilyHint::Auto).unwrap();
//! assert!(matches!(parsed, Parsed::Network(_)));
//! ```

use serde::{Serialize, Serializer};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use thiserror::Error;

mod count;
pub mod parser;

pub use count::AddressCount;
pub use parser::{parse, FamilyHint};

/// Address family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum IpFamily {
    /// 32-bit addresses
    #[serde(rename = "IPv4")]
    V4,
    /// 128-bit addresses
    #[serde(rename = "IPv6")]
    V6,
}

impl IpFamily {
    /// Address width in bits
    pub fn bits(&self) -> u8 {
        match self {
            IpFamily::V4 => 32,
            IpFamily::V6 => 128,
        }
    }

    /// All bits of the family's width set
    pub fn all_ones(&self) -> u128 {
        match self {
            IpFamily::V4 => u32::MAX as u128,
            IpFamily::V6 => u128::MAX,
        }
    }

    /// IP version number (4 or 6)
    pub fn version(&self) -> u8 {
        match self {
            IpFamily::V4 => 4,
            IpFamily::V6 => 6,
        }
    }
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpFamily::V4 => write!(f, "IPv4"),
            IpFamily::V6 => write!(f, "IPv6"),
        }
    }
}

/// Network mask for `prefix_len` within the family's width.
///
/// `prefix_len` values above the width saturate to an all-ones mask.
///
/// ```
/// use netcalc_core::{prefix_mask, IpFamily};
///
/// assert_eq!(prefix_mask(IpFamily::V4, 24), 0xFFFF_FF00);
/// assert_eq!(prefix_mask(IpFamily::V6, 0), 0);
/// ```
pub fn prefix_mask(family: IpFamily, prefix_len: u8) -> u128 {
    let all = family.all_ones();
    all & !all.checked_shr(prefix_len as u32).unwrap_or(0)
}

/// A validated IP address
///
/// The value is held in a `u128` regardless of family; for IPv4 only the
/// low 32 bits can ever be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParsedAddress {
    family: IpFamily,
    value: u128,
}

impl ParsedAddress {
    /// IPv4 address from its numeric form
    pub fn v4(value: u32) -> Self {
        Self {
            family: IpFamily::V4,
            value: value as u128,
        }
    }

    /// IPv6 address from its numeric form
    pub fn v6(value: u128) -> Self {
        Self {
            family: IpFamily::V6,
            value,
        }
    }

    /// Create an address, checking that `value` fits the family's width
    pub fn new(family: IpFamily, value: u128) -> Result<Self> {
        if value & !family.all_ones() != 0 {
            return Err(NetcalcError::InvalidFormat(format!("{:#x}", value)));
        }
        Ok(Self { family, value })
    }

    /// Create an address, dropping any bits beyond the family's width
    pub fn truncated(family: IpFamily, value: u128) -> Self {
        Self {
            family,
            value: value & family.all_ones(),
        }
    }

    pub fn family(&self) -> IpFamily {
        self.family
    }

    /// Canonical numeric form
    pub fn value(&self) -> u128 {
        self.value
    }

    /// Add an offset, staying inside the family's address space
    pub fn checked_add(&self, offset: u128) -> Option<Self> {
        let value = self.value.checked_add(offset)?;
        Self::new(self.family, value).ok()
    }

    /// Subtract an offset, staying at or above the zero address
    pub fn checked_sub(&self, offset: u128) -> Option<Self> {
        let value = self.value.checked_sub(offset)?;
        Some(Self {
            family: self.family,
            value,
        })
    }

    pub fn to_ip_addr(&self) -> IpAddr {
        match self.family {
            IpFamily::V4 => IpAddr::V4(Ipv4Addr::from(self.value as u32)),
            IpFamily::V6 => IpAddr::V6(Ipv6Addr::from(self.value)),
        }
    }
}

impl fmt::Display for ParsedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_ip_addr())
    }
}

impl Serialize for ParsedAddress {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl From<Ipv4Addr> for ParsedAddress {
    fn from(addr: Ipv4Addr) -> Self {
        Self::v4(u32::from(addr))
    }
}

impl From<Ipv6Addr> for ParsedAddress {
    fn from(addr: Ipv6Addr) -> Self {
        Self::v6(u128::from(addr))
    }
}

impl From<IpAddr> for ParsedAddress {
    fn from(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(v4) => v4.into(),
            IpAddr::V6(v6) => v6.into(),
        }
    }
}

impl FromStr for ParsedAddress {
    type Err = NetcalcError;

    /// Parse a plain address; CIDR notation is rejected.
    fn from_str(s: &str) -> Result<Self> {
        match parse(s, FamilyHint::Auto)? {
            Parsed::Address(addr) => Ok(addr),
            Parsed::Network(_) => Err(NetcalcError::InvalidFormat(s.to_string())),
        }
    }
}

/// An address together with a prefix length
///
/// The address is kept as written (host bits are not cleared); the network
/// and last addresses are derived on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParsedNetwork {
    address: ParsedAddress,
    prefix_len: u8,
}

impl ParsedNetwork {
    /// Create a network, checking the prefix length against the family width
    pub fn new(address: ParsedAddress, prefix_len: u8) -> Result<Self> {
        if prefix_len > address.family().bits() {
            return Err(NetcalcError::PrefixOutOfRange(prefix_len.to_string()));
        }
        Ok(Self {
            address,
            prefix_len,
        })
    }

    /// Full-width network holding only `address`
    pub fn host(address: ParsedAddress) -> Self {
        Self {
            address,
            prefix_len: address.family().bits(),
        }
    }

    pub fn address(&self) -> ParsedAddress {
        self.address
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    pub fn family(&self) -> IpFamily {
        self.address.family()
    }

    /// Number of host bits (width minus prefix length)
    pub fn host_bits(&self) -> u8 {
        self.family().bits() - self.prefix_len
    }

    /// Network mask as a number
    pub fn mask(&self) -> u128 {
        prefix_mask(self.family(), self.prefix_len)
    }

    /// Address with all host bits cleared
    pub fn network(&self) -> ParsedAddress {
        ParsedAddress {
            family: self.family(),
            value: self.address.value() & self.mask(),
        }
    }

    /// Address with all host bits set (the broadcast address for IPv4)
    pub fn last_address(&self) -> ParsedAddress {
        let family = self.family();
        ParsedAddress {
            family,
            value: self.network().value() | (!self.mask() & family.all_ones()),
        }
    }

    /// Netmask in address form (e.g. 255.255.255.0)
    pub fn netmask(&self) -> ParsedAddress {
        ParsedAddress {
            family: self.family(),
            value: self.mask(),
        }
    }

    /// Inverse of the netmask (e.g. 0.0.0.255)
    pub fn wildcard(&self) -> ParsedAddress {
        let family = self.family();
        ParsedAddress {
            family,
            value: !self.mask() & family.all_ones(),
        }
    }

    /// Number of addresses in the block, `2^host_bits`
    pub fn total_addresses(&self) -> AddressCount {
        AddressCount::power_of_two(self.host_bits())
    }

    /// Whether `addr` falls inside this network
    pub fn contains(&self, addr: &ParsedAddress) -> bool {
        addr.family() == self.family() && addr.value() & self.mask() == self.network().value()
    }
}

impl fmt::Display for ParsedNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

impl FromStr for ParsedNetwork {
    type Err = NetcalcError;

    /// Parse CIDR notation; a plain address becomes a full-width host network.
    fn from_str(s: &str) -> Result<Self> {
        Ok(parse(s, FamilyHint::Auto)?.into_network())
    }
}

/// Outcome of parsing: a plain address or a CIDR block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parsed {
    /// No `/prefix` was present
    Address(ParsedAddress),
    /// CIDR notation
    Network(ParsedNetwork),
}

impl Parsed {
    pub fn address(&self) -> ParsedAddress {
        match self {
            Parsed::Address(addr) => *addr,
            Parsed::Network(net) => net.address(),
        }
    }

    pub fn family(&self) -> IpFamily {
        self.address().family()
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Parsed::Network(_))
    }

    /// Treat a plain address as a single-host network
    pub fn into_network(self) -> ParsedNetwork {
        match self {
            Parsed::Address(addr) => ParsedNetwork::host(addr),
            Parsed::Network(net) => net,
        }
    }
}

/// Machine-distinguishable error kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    InvalidFormat,
    OctetOutOfRange,
    PrefixOutOfRange,
    AmbiguousFamily,
    InsufficientAddressSpace,
    UnsupportedPolicyForFamily,
    UnknownPolicy,
    UnsupportedFamily,
}

impl ErrorKind {
    /// True for errors raised while reading address text
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidFormat
                | ErrorKind::OctetOutOfRange
                | ErrorKind::PrefixOutOfRange
                | ErrorKind::AmbiguousFamily
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Error types for netcalc operations
///
/// Every error is a deterministic consequence of the caller's input; none
/// is transient.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetcalcError {
    /// Input could not be tokenized as an address
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// IPv4 octet above 255
    #[error("Octet out of range: {0}")]
    OctetOutOfRange(String),

    /// Prefix length negative or wider than the family
    #[error("Prefix length out of range: {0}")]
    PrefixOutOfRange(String),

    /// Text matches neither the IPv4 nor the IPv6 grammar
    #[error("Ambiguous address family: {0}")]
    AmbiguousFamily(String),

    /// Policy reserves at least as many addresses as the subnet holds
    #[error("Insufficient address space: {policy} reserves {reserved} of {total} addresses in a /{prefix_len}")]
    InsufficientAddressSpace {
        policy: String,
        prefix_len: u8,
        total: AddressCount,
        reserved: u64,
    },

    /// Cloud reservation policies are only modelled for IPv4
    #[error("Policy {policy} is not supported for {family}")]
    UnsupportedPolicyForFamily { policy: String, family: IpFamily },

    /// Policy name not present in the registry
    #[error("Unknown policy: {0}")]
    UnknownPolicy(String),

    /// Operation only answers for one address family
    #[error("{operation} only supports {supported} addresses, got {family}")]
    UnsupportedFamily {
        operation: String,
        supported: IpFamily,
        family: IpFamily,
    },
}

impl NetcalcError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NetcalcError::InvalidFormat(_) => ErrorKind::InvalidFormat,
            NetcalcError::OctetOutOfRange(_) => ErrorKind::OctetOutOfRange,
            NetcalcError::PrefixOutOfRange(_) => ErrorKind::PrefixOutOfRange,
            NetcalcError::AmbiguousFamily(_) => ErrorKind::AmbiguousFamily,
            NetcalcError::InsufficientAddressSpace { .. } => ErrorKind::InsufficientAddressSpace,
            NetcalcError::UnsupportedPolicyForFamily { .. } => {
                ErrorKind::UnsupportedPolicyForFamily
            }
            NetcalcError::UnknownPolicy(_) => ErrorKind::UnknownPolicy,
            NetcalcError::UnsupportedFamily { .. } => ErrorKind::UnsupportedFamily,
        }
    }
}

/// Result type alias for netcalc operations
pub type Result<T> = std::result::Result<T, NetcalcError>;
