//! Special-use range classification
//!
//! Classifies addresses against an ordered table of CIDR ranges:
//! - RFC1918 private and RFC6598 shared address space
//! - Loopback, link-local, multicast and other IANA special-use blocks
//! - Known CDN edge ranges (Cloudflare built in, more can be added as data)
//!
//! The table is sorted once, from the narrowest prefix to the widest, and
//! is read-only afterwards; the first (most specific) matching range wins.
//!
//! # Examples
//!
//! ```
//! use netcalc_classify::{classify, AddressCategory};
//!
//! let addr = "10.0.0.5".parse().unwrap();
//! assert_eq!(classify(&addr), AddressCategory::PrivateRfc1918);
//! ```

use netcalc_cidr::Cidr;
use netcalc_core::{IpFamily, ParsedAddress};
use std::borrow::Cow;
use std::sync::OnceLock;

pub mod builtin;
mod category;
mod ranges_file;

pub use category::AddressCategory;
pub use ranges_file::{parse_cdn_ranges, RangeFileError};

/// One row of the classification table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeEntry {
    cidr: Cidr,
    category: AddressCategory,
}

impl RangeEntry {
    pub const fn new(cidr: Cidr, category: AddressCategory) -> Self {
        Self { cidr, category }
    }

    /// CDN row with a provider name known only at runtime
    pub fn cdn(provider: impl Into<String>, cidr: Cidr) -> Self {
        Self {
            cidr,
            category: AddressCategory::KnownCdnRange(Cow::Owned(provider.into())),
        }
    }

    pub fn cidr(&self) -> &Cidr {
        &self.cidr
    }

    pub fn category(&self) -> &AddressCategory {
        &self.category
    }
}

/// Immutable, ordered classification table
///
/// Rows are kept per family and sorted from the longest prefix to the
/// shortest; ties keep insertion order.
#[derive(Debug, Clone)]
pub struct ClassificationTable {
    v4: Vec<RangeEntry>,
    v6: Vec<RangeEntry>,
}

impl ClassificationTable {
    /// Build a table from arbitrary rows
    pub fn new(entries: impl IntoIterator<Item = RangeEntry>) -> Self {
        let (mut v4, mut v6): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .partition(|e| e.cidr.family() == IpFamily::V4);

        v4.sort_by(|a, b| b.cidr.prefix_len().cmp(&a.cidr.prefix_len()));
        v6.sort_by(|a, b| b.cidr.prefix_len().cmp(&a.cidr.prefix_len()));

        Self { v4, v6 }
    }

    /// Start from the compiled-in rows
    pub fn builder() -> TableBuilder {
        TableBuilder {
            entries: builtin::all().cloned().collect(),
        }
    }

    /// Rows for one family, most specific first
    pub fn entries(&self, family: IpFamily) -> &[RangeEntry] {
        match family {
            IpFamily::V4 => &self.v4,
            IpFamily::V6 => &self.v6,
        }
    }

    pub fn len(&self) -> usize {
        self.v4.len() + self.v6.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Most specific row containing `addr`
    pub fn lookup(&self, addr: &ParsedAddress) -> Option<&RangeEntry> {
        let entry = self
            .entries(addr.family())
            .iter()
            .find(|e| e.cidr.contains(addr));
        tracing::trace!(
            address = %addr,
            matched = ?entry.map(|e| e.cidr.to_string()),
            "classification lookup"
        );
        entry
    }

    /// Category of `addr`; [`AddressCategory::Public`] when no row matches
    pub fn classify(&self, addr: &ParsedAddress) -> AddressCategory {
        self.lookup(addr)
            .map(|e| e.category.clone())
            .unwrap_or(AddressCategory::Public)
    }

    /// Every row containing `addr`, most specific first
    pub fn matches<'a>(
        &'a self,
        addr: &'a ParsedAddress,
    ) -> impl Iterator<Item = &'a RangeEntry> + 'a {
        self.entries(addr.family())
            .iter()
            .filter(move |e| e.cidr.contains(addr))
    }

    /// Every row that is a subnet or supernet of `block`, most specific first
    pub fn overlapping<'a>(&'a self, block: &'a Cidr) -> impl Iterator<Item = &'a RangeEntry> + 'a {
        self.entries(block.family())
            .iter()
            .filter(move |e| e.cidr.overlaps(block))
    }
}

impl Default for ClassificationTable {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Accumulates rows before the table is frozen
#[derive(Debug, Clone, Default)]
pub struct TableBuilder {
    entries: Vec<RangeEntry>,
}

impl TableBuilder {
    /// Empty builder without the compiled-in rows
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn entry(mut self, entry: RangeEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Add a CDN range for `provider`
    pub fn cdn_range(self, provider: impl Into<String>, cidr: Cidr) -> Self {
        self.entry(RangeEntry::cdn(provider, cidr))
    }

    pub fn entries(mut self, entries: impl IntoIterator<Item = RangeEntry>) -> Self {
        self.entries.extend(entries);
        self
    }

    pub fn build(self) -> ClassificationTable {
        ClassificationTable::new(self.entries)
    }
}

/// Process-wide table of compiled-in rows, built on first use
pub fn default_table() -> &'static ClassificationTable {
    static TABLE: OnceLock<ClassificationTable> = OnceLock::new();
    TABLE.get_or_init(ClassificationTable::default)
}

/// Classify against the compiled-in table
pub fn classify(addr: &ParsedAddress) -> AddressCategory {
    default_table().classify(addr)
}
