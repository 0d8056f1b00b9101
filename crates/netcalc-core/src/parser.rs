//! Address and CIDR text parsing
//!
//! Hand-written grammar for both families so that every failure can be
//! reported with its precise kind and the offending substring.
//!
//! # Examples
//!
//! ```
//! use netcalc_core::{parse, ErrorKind, FamilyHint};
//!
//! let net = parse("2001:db8::/32", FamilyHint::Auto).unwrap().into_network();
//! assert_eq!(net.prefix_len(), 32);
//!
//! let err = parse("10.0.0.256", FamilyHint::V4).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::OctetOutOfRange);
//! ```

use crate::{IpFamily, NetcalcError, Parsed, ParsedAddress, ParsedNetwork, Result};

/// Which grammar to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FamilyHint {
    V4,
    V6,
    /// Detect the family from the text
    #[default]
    Auto,
}

impl From<IpFamily> for FamilyHint {
    fn from(family: IpFamily) -> Self {
        match family {
            IpFamily::V4 => FamilyHint::V4,
            IpFamily::V6 => FamilyHint::V6,
        }
    }
}

/// Parse an address or CIDR block
///
/// Without a `/prefix` the result is [`Parsed::Address`]; callers that need a
/// network use [`Parsed::into_network`].
pub fn parse(text: &str, hint: FamilyHint) -> Result<Parsed> {
    let result = parse_inner(text, hint);
    if let Err(ref e) = result {
        tracing::trace!(input = text, error = %e, "parse failed");
    }
    result
}

fn parse_inner(text: &str, hint: FamilyHint) -> Result<Parsed> {
    if text.is_empty() || text.chars().any(char::is_whitespace) {
        return Err(NetcalcError::InvalidFormat(text.to_string()));
    }

    let (addr_text, prefix_text) = match text.split_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix)),
        None => (text, None),
    };

    if addr_text.is_empty() {
        return Err(NetcalcError::InvalidFormat(text.to_string()));
    }

    let family = match hint {
        FamilyHint::V4 => IpFamily::V4,
        FamilyHint::V6 => IpFamily::V6,
        FamilyHint::Auto => detect_family(addr_text)?,
    };

    let address = match family {
        IpFamily::V4 => ParsedAddress::v4(parse_ipv4(addr_text)?),
        IpFamily::V6 => ParsedAddress::v6(parse_ipv6(addr_text)?),
    };

    match prefix_text {
        None => Ok(Parsed::Address(address)),
        Some(prefix) => {
            let prefix_len = parse_prefix(prefix, family)?;
            Ok(Parsed::Network(ParsedNetwork::new(address, prefix_len)?))
        }
    }
}

fn detect_family(addr: &str) -> Result<IpFamily> {
    if addr.contains(':') {
        Ok(IpFamily::V6)
    } else if addr.contains('.') && addr.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        Ok(IpFamily::V4)
    } else {
        Err(NetcalcError::AmbiguousFamily(addr.to_string()))
    }
}

/// Parse a dotted-quad IPv4 address to its numeric form
fn parse_ipv4(ip: &str) -> Result<u32> {
    let octets: Vec<&str> = ip.split('.').collect();
    if octets.len() != 4 {
        return Err(NetcalcError::InvalidFormat(ip.to_string()));
    }

    let mut result = 0u32;
    for (i, octet_str) in octets.iter().enumerate() {
        let octet = parse_octet(octet_str)?;
        result |= (octet as u32) << (24 - i * 8);
    }

    Ok(result)
}

fn parse_octet(octet: &str) -> Result<u8> {
    if octet.is_empty() || !octet.bytes().all(|b| b.is_ascii_digit()) {
        return Err(NetcalcError::InvalidFormat(octet.to_string()));
    }
    if octet.len() > 1 && octet.starts_with('0') {
        return Err(NetcalcError::InvalidFormat(octet.to_string()));
    }
    if octet.len() > 3 {
        return Err(NetcalcError::OctetOutOfRange(octet.to_string()));
    }

    let value: u16 = octet
        .parse()
        .map_err(|_| NetcalcError::InvalidFormat(octet.to_string()))?;
    u8::try_from(value).map_err(|_| NetcalcError::OctetOutOfRange(octet.to_string()))
}

/// Parse colon-hex IPv6 text, with `::` compression and an optional
/// dotted IPv4 tail in the last 32 bits
fn parse_ipv6(ip: &str) -> Result<u128> {
    if ip.contains('%') {
        return Err(NetcalcError::InvalidFormat(ip.to_string()));
    }

    let groups = match ip.find("::") {
        Some(idx) => {
            let head = &ip[..idx];
            let tail = &ip[idx + 2..];
            if tail.contains("::") {
                return Err(NetcalcError::InvalidFormat(ip.to_string()));
            }

            let head = parse_groups(ip, head, false)?;
            let tail = parse_groups(ip, tail, true)?;
            // `::` stands for at least one zero group
            if head.len() + tail.len() > 7 {
                return Err(NetcalcError::InvalidFormat(ip.to_string()));
            }

            let mut groups = head;
            groups.resize(8 - tail.len(), 0);
            groups.extend(tail);
            groups
        }
        None => {
            let groups = parse_groups(ip, ip, true)?;
            if groups.len() != 8 {
                return Err(NetcalcError::InvalidFormat(ip.to_string()));
            }
            groups
        }
    };

    Ok(groups
        .iter()
        .fold(0u128, |acc, &group| (acc << 16) | group as u128))
}

/// Parse one side of a (possibly compressed) IPv6 address into 16-bit groups
fn parse_groups(full: &str, part: &str, allow_ipv4_tail: bool) -> Result<Vec<u16>> {
    if part.is_empty() {
        return Ok(Vec::new());
    }

    let pieces: Vec<&str> = part.split(':').collect();
    let mut groups = Vec::with_capacity(8);

    for (i, piece) in pieces.iter().enumerate() {
        if piece.contains('.') {
            if !allow_ipv4_tail || i != pieces.len() - 1 {
                return Err(NetcalcError::InvalidFormat(piece.to_string()));
            }
            let v4 = parse_ipv4(piece)?;
            groups.push((v4 >> 16) as u16);
            groups.push(v4 as u16);
            continue;
        }

        if piece.is_empty() {
            return Err(NetcalcError::InvalidFormat(full.to_string()));
        }
        if piece.len() > 4 || !piece.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(NetcalcError::InvalidFormat(piece.to_string()));
        }
        let group = u16::from_str_radix(piece, 16)
            .map_err(|_| NetcalcError::InvalidFormat(piece.to_string()))?;
        groups.push(group);
    }

    Ok(groups)
}

fn parse_prefix(prefix: &str, family: IpFamily) -> Result<u8> {
    if let Some(magnitude) = prefix.strip_prefix('-') {
        if !magnitude.is_empty() && magnitude.bytes().all(|b| b.is_ascii_digit()) {
            return Err(NetcalcError::PrefixOutOfRange(prefix.to_string()));
        }
    }
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(NetcalcError::InvalidFormat(prefix.to_string()));
    }
    if prefix.len() > 1 && prefix.starts_with('0') {
        return Err(NetcalcError::InvalidFormat(prefix.to_string()));
    }

    let value: u32 = prefix
        .parse()
        .map_err(|_| NetcalcError::PrefixOutOfRange(prefix.to_string()))?;
    if value > family.bits() as u32 {
        return Err(NetcalcError::PrefixOutOfRange(prefix.to_string()));
    }

    Ok(value as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn parse_auto(text: &str) -> Result<Parsed> {
        parse(text, FamilyHint::Auto)
    }

    fn err_of(text: &str) -> NetcalcError {
        parse_auto(text).unwrap_err()
    }

    #[test]
    fn test_parse_plain_ipv4() {
        let parsed = parse_auto("192.168.1.1").unwrap();
        assert_eq!(parsed, Parsed::Address(ParsedAddress::v4(0xC0A80101)));
        assert!(!parsed.is_network());
    }

    #[test]
    fn test_parse_ipv4_cidr() {
        let parsed = parse_auto("10.0.0.0/24").unwrap();
        let net = parsed.into_network();
        assert_eq!(net.address().value(), 0x0A000000);
        assert_eq!(net.prefix_len(), 24);
    }

    #[test]
    fn test_parse_ipv4_bounds() {
        assert_eq!(parse_auto("0.0.0.0").unwrap().address().value(), 0);
        assert_eq!(
            parse_auto("255.255.255.255").unwrap().address().value(),
            0xFFFF_FFFF
        );
    }

    #[test]
    fn test_octet_out_of_range() {
        assert_eq!(
            err_of("999.999.999.999"),
            NetcalcError::OctetOutOfRange("999".to_string())
        );
        assert_eq!(
            err_of("10.0.0.256"),
            NetcalcError::OctetOutOfRange("256".to_string())
        );
        assert_eq!(err_of("1.2.3.1000").kind(), ErrorKind::OctetOutOfRange);
    }

    #[test]
    fn test_ipv4_invalid_format() {
        assert_eq!(
            err_of("192.168.1"),
            NetcalcError::InvalidFormat("192.168.1".to_string())
        );
        assert_eq!(err_of("1.2.3.4.5").kind(), ErrorKind::InvalidFormat);
        assert_eq!(err_of("1..2.3").kind(), ErrorKind::InvalidFormat);
        assert_eq!(
            err_of("192.168.01.1"),
            NetcalcError::InvalidFormat("01".to_string())
        );
        assert_eq!(err_of("1.2.3.4.").kind(), ErrorKind::InvalidFormat);
    }

    #[test]
    fn test_whitespace_rejected() {
        assert_eq!(err_of(" 10.0.0.1").kind(), ErrorKind::InvalidFormat);
        assert_eq!(err_of("10.0.0.1\n").kind(), ErrorKind::InvalidFormat);
        assert_eq!(err_of("10.0.0.0 /8").kind(), ErrorKind::InvalidFormat);
        assert_eq!(err_of("").kind(), ErrorKind::InvalidFormat);
    }

    #[test]
    fn test_ambiguous_family() {
        assert_eq!(
            err_of("hello"),
            NetcalcError::AmbiguousFamily("hello".to_string())
        );
        assert_eq!(err_of("1.2.3.x").kind(), ErrorKind::AmbiguousFamily);
        assert_eq!(err_of("12345").kind(), ErrorKind::AmbiguousFamily);
    }

    #[test]
    fn test_prefix_errors() {
        assert_eq!(
            err_of("10.0.0.0/33"),
            NetcalcError::PrefixOutOfRange("33".to_string())
        );
        assert_eq!(
            err_of("10.0.0.0/-1"),
            NetcalcError::PrefixOutOfRange("-1".to_string())
        );
        assert_eq!(err_of("10.0.0.0/99999999999").kind(), ErrorKind::PrefixOutOfRange);
        assert_eq!(
            err_of("10.0.0.0/abc"),
            NetcalcError::InvalidFormat("abc".to_string())
        );
        assert_eq!(err_of("10.0.0.0/").kind(), ErrorKind::InvalidFormat);
        assert_eq!(err_of("10.0.0.0/08").kind(), ErrorKind::InvalidFormat);
        assert_eq!(err_of("10.0.0.0/8/8").kind(), ErrorKind::InvalidFormat);
        assert_eq!(err_of("/8").kind(), ErrorKind::InvalidFormat);
        assert_eq!(err_of("2001:db8::/129").kind(), ErrorKind::PrefixOutOfRange);
    }

    #[test]
    fn test_prefix_bounds_accepted() {
        assert_eq!(parse_auto("0.0.0.0/0").unwrap().into_network().prefix_len(), 0);
        assert_eq!(parse_auto("1.2.3.4/32").unwrap().into_network().prefix_len(), 32);
        assert_eq!(parse_auto("::/128").unwrap().into_network().prefix_len(), 128);
    }

    #[test]
    fn test_parse_ipv6_forms() {
        assert_eq!(parse_auto("::").unwrap().address().value(), 0);
        assert_eq!(parse_auto("::1").unwrap().address().value(), 1);
        assert_eq!(
            parse_auto("2001:db8::1").unwrap().address().value(),
            0x2001_0db8_0000_0000_0000_0000_0000_0001
        );
        assert_eq!(
            parse_auto("fe80::").unwrap().address().value(),
            0xfe80_u128 << 112
        );
        assert_eq!(
            parse_auto("1:2:3:4:5:6:7:8").unwrap().address().value(),
            0x0001_0002_0003_0004_0005_0006_0007_0008
        );
        assert_eq!(
            parse_auto("2001:DB8:0:0:0:0:0:1").unwrap().address().value(),
            0x2001_0db8_0000_0000_0000_0000_0000_0001
        );
    }

    #[test]
    fn test_parse_ipv6_embedded_ipv4() {
        assert_eq!(
            parse_auto("::ffff:192.0.2.1").unwrap().address().value(),
            0xffff_c000_0201
        );
        assert_eq!(
            parse_auto("0:0:0:0:0:ffff:10.0.0.1").unwrap().address().value(),
            0xffff_0a00_0001
        );
        assert_eq!(
            err_of("::ffff:300.0.2.1"),
            NetcalcError::OctetOutOfRange("300".to_string())
        );
        assert_eq!(err_of("::1.2.3.4:ffff").kind(), ErrorKind::InvalidFormat);
    }

    #[test]
    fn test_parse_ipv6_errors() {
        assert_eq!(err_of("1::2::3").kind(), ErrorKind::InvalidFormat);
        assert_eq!(err_of(":::").kind(), ErrorKind::InvalidFormat);
        assert_eq!(err_of("1:2:3:4:5:6:7").kind(), ErrorKind::InvalidFormat);
        assert_eq!(err_of("1:2:3:4:5:6:7:8:9").kind(), ErrorKind::InvalidFormat);
        assert_eq!(err_of("1:2:3:4:5:6:7::8").kind(), ErrorKind::InvalidFormat);
        assert_eq!(
            err_of("2001:db8::12345"),
            NetcalcError::InvalidFormat("12345".to_string())
        );
        assert_eq!(
            err_of("2001:db8::zz"),
            NetcalcError::InvalidFormat("zz".to_string())
        );
        assert_eq!(err_of(":1:2:3:4:5:6:7").kind(), ErrorKind::InvalidFormat);
        assert_eq!(err_of("fe80::1%eth0").kind(), ErrorKind::InvalidFormat);
    }

    #[test]
    fn test_explicit_hint() {
        assert!(parse("10.0.0.1", FamilyHint::V4).is_ok());
        assert_eq!(
            parse("10.0.0.1", FamilyHint::V6).unwrap_err().kind(),
            ErrorKind::InvalidFormat
        );
        assert_eq!(
            parse("::1", FamilyHint::V4).unwrap_err().kind(),
            ErrorKind::InvalidFormat
        );
        assert_eq!(
            parse("::1/64", IpFamily::V6.into()).unwrap().family(),
            IpFamily::V6
        );
    }

    #[test]
    fn test_parse_is_idempotent() {
        for text in ["172.16.5.4/12", "2001:db8:abcd::42/48", "0.0.0.0"] {
            let first = parse_auto(text).unwrap();
            let second = parse_auto(text).unwrap();
            assert_eq!(first.address().value(), second.address().value());
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_display_round_trip() {
        let canonical = ["10.1.2.3/8", "2001:db8::1/64", "::ffff:192.0.2.1/128"];
        for text in canonical {
            let net = parse_auto(text).unwrap().into_network();
            assert_eq!(net.to_string(), text);
        }
    }
}
