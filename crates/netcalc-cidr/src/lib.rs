//! CIDR block arithmetic
//!
//! Provides utilities for working with normalized CIDR blocks of either family:
//! - Parse CIDR notation (e.g., "192.168.0.0/24", "2001:db8::/32")
//! - Build blocks in `const` context for compiled-in tables
//! - Containment, subnet and supernet relations
//! - Iterate over the addresses of small blocks
//!
//! # Examples
//!
//! ```
//! use netcalc_cidr::Cidr;
//!
//! let cidr = Cidr::parse("192.168.1.0/24").unwrap();
//! assert_eq!(cidr.prefix_len(), 24);
//! assert_eq!(cidr.network().value(), 0xC0A80100); // 192.168.1.0
//! assert!(cidr.contains(&"192.168.1.1".parse().unwrap()));
//! assert!(!cidr.contains(&"192.168.0.1".parse().unwrap()));
//! ```

use netcalc_core::{
    parse, prefix_mask, AddressCount, FamilyHint, IpFamily, NetcalcError, Parsed, ParsedAddress,
    ParsedNetwork, Result,
};
use serde::{Serialize, Serializer};
use std::fmt;

/// CIDR block with host bits cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cidr {
    family: IpFamily,
    /// Network address (base IP)
    network: u128,
    prefix_len: u8,
}

impl Cidr {
    /// IPv4 block from octets, usable in `const` and `static` items
    ///
    /// # Panics
    ///
    /// If `prefix_len` exceeds 32 (a compile error in const context).
    pub const fn v4(octets: [u8; 4], prefix_len: u8) -> Self {
        assert!(prefix_len <= 32, "IPv4 prefix length must be 0-32");
        let addr = u32::from_be_bytes(octets) as u128;
        let mask = if prefix_len == 0 {
            0
        } else {
            (u32::MAX as u128) & !((u32::MAX as u128) >> prefix_len)
        };
        Self {
            family: IpFamily::V4,
            network: addr & mask,
            prefix_len,
        }
    }

    /// IPv6 block from eight 16-bit segments, usable in `const` and `static` items
    ///
    /// # Panics
    ///
    /// If `prefix_len` exceeds 128 (a compile error in const context).
    pub const fn v6(segments: [u16; 8], prefix_len: u8) -> Self {
        assert!(prefix_len <= 128, "IPv6 prefix length must be 0-128");
        let mut addr = 0u128;
        let mut i = 0;
        while i < 8 {
            addr = (addr << 16) | segments[i] as u128;
            i += 1;
        }
        let mask = if prefix_len == 0 {
            0
        } else {
            u128::MAX << (128 - prefix_len as u32)
        };
        Self {
            family: IpFamily::V6,
            network: addr & mask,
            prefix_len,
        }
    }

    /// Create a block from any address in it and a prefix length
    pub fn new(address: ParsedAddress, prefix_len: u8) -> Result<Self> {
        let net = ParsedNetwork::new(address, prefix_len)?;
        Ok(Self::from_network(&net))
    }

    /// Normalize a parsed network (host bits are dropped)
    pub fn from_network(net: &ParsedNetwork) -> Self {
        Self {
            family: net.family(),
            network: net.network().value(),
            prefix_len: net.prefix_len(),
        }
    }

    /// Parse CIDR notation string
    ///
    /// The `/prefix` is required; host bits are cleared.
    ///
    /// # Examples
    ///
    /// ```
    /// use netcalc_cidr::Cidr;
    ///
    /// let cidr = Cidr::parse("10.1.2.3/8").unwrap();
    /// assert_eq!(cidr.to_string(), "10.0.0.0/8");
    /// assert!(Cidr::parse("10.0.0.0").is_err());
    /// ```
    pub fn parse(cidr: &str) -> Result<Self> {
        match parse(cidr, FamilyHint::Auto)? {
            Parsed::Network(net) => Ok(Self::from_network(&net)),
            Parsed::Address(_) => Err(NetcalcError::InvalidFormat(cidr.to_string())),
        }
    }

    pub fn family(&self) -> IpFamily {
        self.family
    }

    /// Get network address
    pub fn network(&self) -> ParsedAddress {
        ParsedAddress::truncated(self.family, self.network)
    }

    /// Get prefix length
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Get network mask
    pub fn mask(&self) -> u128 {
        prefix_mask(self.family, self.prefix_len)
    }

    /// Last address of the block (broadcast for IPv4)
    pub fn last(&self) -> ParsedAddress {
        ParsedAddress::truncated(self.family, self.network | !self.mask())
    }

    /// Total number of addresses in this block
    pub fn size(&self) -> AddressCount {
        AddressCount::power_of_two(self.family.bits() - self.prefix_len)
    }

    /// Check if an address is in this block
    pub fn contains(&self, addr: &ParsedAddress) -> bool {
        addr.family() == self.family && (addr.value() & self.mask()) == self.network
    }

    /// True if `self` lies entirely inside `other` (equal blocks included)
    pub fn is_subnet_of(&self, other: &Cidr) -> bool {
        self.family == other.family
            && self.prefix_len >= other.prefix_len
            && (self.network & other.mask()) == other.network
    }

    /// True if `self` entirely covers `other` (equal blocks included)
    pub fn is_supernet_of(&self, other: &Cidr) -> bool {
        other.is_subnet_of(self)
    }

    /// True if the blocks share at least one address
    pub fn overlaps(&self, other: &Cidr) -> bool {
        self.is_subnet_of(other) || self.is_supernet_of(other)
    }

    /// Iterate over every address in this block
    ///
    /// Note: For large blocks (e.g., /8 or any short IPv6 prefix) this is
    /// very slow. Use `contains()` or `step_by` instead.
    pub fn iter(&self) -> CidrIterator {
        CidrIterator::new(*self)
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network(), self.prefix_len)
    }
}

impl Serialize for Cidr {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl From<ParsedNetwork> for Cidr {
    fn from(net: ParsedNetwork) -> Self {
        Self::from_network(&net)
    }
}

/// Iterator over addresses in a CIDR block
pub struct CidrIterator {
    family: IpFamily,
    current: Option<u128>,
    end: u128,
}

impl CidrIterator {
    fn new(cidr: Cidr) -> Self {
        Self {
            family: cidr.family,
            current: Some(cidr.network),
            end: cidr.last().value(),
        }
    }
}

impl Iterator for CidrIterator {
    type Item = ParsedAddress;

    fn next(&mut self) -> Option<Self::Item> {
        let value = self.current?;
        if value > self.end {
            self.current = None;
            return None;
        }
        self.current = if value == self.end {
            None
        } else {
            Some(value + 1)
        };
        Some(ParsedAddress::truncated(self.family, value))
    }
}
