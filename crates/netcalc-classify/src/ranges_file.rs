//! Text format for extra CDN ranges
//!
//! One `provider cidr` pair per line. Blank lines and `#` comments are
//! ignored; the provider name may not contain whitespace.
//!
//! ```text
//! # provider  range
//! Fastly      151.101.0.0/16
//! Fastly      2a04:4e40::/32
//! ```

use crate::RangeEntry;
use netcalc_cidr::Cidr;
use netcalc_core::NetcalcError;
use thiserror::Error;

/// Errors reading a ranges file
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeFileError {
    /// Line is not a `provider cidr` pair
    #[error("line {line}: expected `provider cidr`, got {text:?}")]
    Malformed { line: usize, text: String },

    /// Range could not be parsed
    #[error("line {line}: {source}")]
    InvalidRange {
        line: usize,
        #[source]
        source: NetcalcError,
    },
}

/// Parse a ranges file into CDN rows
pub fn parse_cdn_ranges(text: &str) -> Result<Vec<RangeEntry>, RangeFileError> {
    let mut entries = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let content = raw.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }

        let fields: Vec<&str> = content.split_whitespace().collect();
        let [provider, range] = fields[..] else {
            return Err(RangeFileError::Malformed {
                line,
                text: content.to_string(),
            });
        };

        let cidr = Cidr::parse(range).map_err(|source| RangeFileError::InvalidRange { line, source })?;
        entries.push(RangeEntry::cdn(provider, cidr));
    }

    tracing::debug!(count = entries.len(), "parsed CDN ranges");
    Ok(entries)
}
