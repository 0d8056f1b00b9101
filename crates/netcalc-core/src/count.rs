//! Exact address counts
//!
//! An IPv6 `/0` holds 2^128 addresses, one more than fits in a `u128`.
//! Counts are therefore stored as the offset of the last address from the
//! first (`count - 1`), which always fits.

use serde::{Serialize, Serializer};
use std::fmt;

/// 2^128 in decimal
const TWO_POW_128: &str = "340282366920938463463374607431768211456";

/// A non-zero number of addresses, `1 ..= 2^128`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AddressCount {
    last_offset: u128,
}

impl AddressCount {
    pub const ONE: AddressCount = AddressCount { last_offset: 0 };

    /// `2^bits` addresses; `bits` above 128 saturates to 2^128
    pub fn power_of_two(bits: u8) -> Self {
        let last_offset = if bits >= 128 {
            u128::MAX
        } else {
            (1u128 << bits) - 1
        };
        Self { last_offset }
    }

    /// Count from an exact value; zero is not a count
    pub fn new(count: u128) -> Option<Self> {
        count.checked_sub(1).map(|last_offset| Self { last_offset })
    }

    /// Offset of the last address relative to the first (`count - 1`)
    pub fn last_offset(&self) -> u128 {
        self.last_offset
    }

    /// Exact value, `None` only for 2^128
    pub fn to_u128(&self) -> Option<u128> {
        self.last_offset.checked_add(1)
    }

    pub fn to_u64(&self) -> Option<u64> {
        self.to_u128().and_then(|v| u64::try_from(v).ok())
    }

    /// Subtract `n`, returning `None` if fewer than one address would remain
    pub fn checked_sub(&self, n: u128) -> Option<Self> {
        self.last_offset
            .checked_sub(n)
            .map(|last_offset| Self { last_offset })
    }
}

impl fmt::Display for AddressCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_u128() {
            Some(v) => write!(f, "{}", v),
            None => f.write_str(TWO_POW_128),
        }
    }
}

/// JSON number when the value fits a `u64`, decimal string otherwise.
impl Serialize for AddressCount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.to_u64() {
            Some(v) => serializer.serialize_u64(v),
            None => serializer.collect_str(self),
        }
    }
}
