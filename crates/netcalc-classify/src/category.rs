//! Address categories

use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;

/// Special-use category of an address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AddressCategory {
    /// 10.0.0.0/8, 172.16.0.0/12, 192.168.0.0/16
    PrivateRfc1918,
    /// 100.64.0.0/10 carrier-grade NAT space
    SharedAddressSpaceRfc6598,
    Loopback,
    LinkLocal,
    Multicast,
    /// Documentation, benchmarking, unspecified and other IANA special-use blocks
    Reserved,
    /// Published edge range of a CDN provider
    KnownCdnRange(Cow<'static, str>),
    /// No special-use range matched
    Public,
}

impl AddressCategory {
    /// CDN category for a provider known at compile time
    pub const fn cdn(provider: &'static str) -> Self {
        AddressCategory::KnownCdnRange(Cow::Borrowed(provider))
    }

    /// Stable external name of the category
    pub fn name(&self) -> &'static str {
        match self {
            AddressCategory::PrivateRfc1918 => "Private-RFC1918",
            AddressCategory::SharedAddressSpaceRfc6598 => "SharedAddressSpace-RFC6598",
            AddressCategory::Loopback => "Loopback",
            AddressCategory::LinkLocal => "LinkLocal",
            AddressCategory::Multicast => "Multicast",
            AddressCategory::Reserved => "Reserved",
            AddressCategory::KnownCdnRange(_) => "KnownCDNRange",
            AddressCategory::Public => "Public",
        }
    }

    /// CDN provider name, if this is a CDN range
    pub fn provider(&self) -> Option<&str> {
        match self {
            AddressCategory::KnownCdnRange(provider) => Some(provider.as_ref()),
            _ => None,
        }
    }

    pub fn is_cdn(&self) -> bool {
        matches!(self, AddressCategory::KnownCdnRange(_))
    }
}

impl fmt::Display for AddressCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressCategory::KnownCdnRange(provider) => {
                write!(f, "{} ({})", self.name(), provider)
            }
            _ => f.write_str(self.name()),
        }
    }
}

/// Serialized by name only; the provider is reported separately.
impl Serialize for AddressCategory {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(AddressCategory::PrivateRfc1918.name(), "Private-RFC1918");
        assert_eq!(
            AddressCategory::SharedAddressSpaceRfc6598.to_string(),
            "SharedAddressSpace-RFC6598"
        );
        assert_eq!(
            AddressCategory::cdn("Cloudflare").to_string(),
            "KnownCDNRange (Cloudflare)"
        );
    }

    #[test]
    fn test_provider() {
        assert_eq!(AddressCategory::cdn("Cloudflare").provider(), Some("Cloudflare"));
        assert_eq!(AddressCategory::Public.provider(), None);
        let owned = AddressCategory::KnownCdnRange(Cow::Owned("Fastly".to_string()));
        assert!(owned.is_cdn());
        assert_eq!(owned.provider(), Some("Fastly"));
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&AddressCategory::cdn("Cloudflare")).unwrap();
        assert_eq!(json, "\"KnownCDNRange\"");
        let json = serde_json::to_string(&AddressCategory::LinkLocal).unwrap();
        assert_eq!(json, "\"LinkLocal\"");
    }
}
