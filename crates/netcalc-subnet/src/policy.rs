//! Cloud reservation policies
//!
//! Each policy says how many addresses at the bottom and top of an IPv4
//! subnet are unusable:
//!
//! | Policy   | start | end |
//! |----------|-------|-----|
//! | Standard | 1     | 1   |
//! | AWS      | 4     | 1   |
//! | Azure    | 4     | 1   |
//! | OCI      | 2     | 1   |

use netcalc_core::{NetcalcError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Name of a reservation policy
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PolicyName {
    Standard,
    Aws,
    Azure,
    Oci,
    /// Caller-registered policy
    Custom(String),
}

impl PolicyName {
    pub fn as_str(&self) -> &str {
        match self {
            PolicyName::Standard => "Standard",
            PolicyName::Aws => "AWS",
            PolicyName::Azure => "Azure",
            PolicyName::Oci => "OCI",
            PolicyName::Custom(name) => name,
        }
    }

    /// Case-insensitive name comparison
    pub fn matches(&self, name: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(name)
    }
}

impl From<&str> for PolicyName {
    /// Built-in names are recognised case-insensitively; anything else is custom.
    fn from(name: &str) -> Self {
        [
            PolicyName::Standard,
            PolicyName::Aws,
            PolicyName::Azure,
            PolicyName::Oci,
        ]
        .into_iter()
        .find(|builtin| builtin.matches(name))
        .unwrap_or_else(|| PolicyName::Custom(name.to_string()))
    }
}

impl fmt::Display for PolicyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PolicyName {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PolicyName {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(PolicyName::from(name.as_str()))
    }
}

/// Addresses reserved at each end of an IPv4 subnet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloudReservationPolicy {
    pub name: PolicyName,
    /// Unusable addresses at the low end, network address included
    pub reserved_at_start: u32,
    /// Unusable addresses at the high end, broadcast address included
    pub reserved_at_end: u32,
}

impl CloudReservationPolicy {
    /// Network and broadcast only
    pub const STANDARD: CloudReservationPolicy = CloudReservationPolicy {
        name: PolicyName::Standard,
        reserved_at_start: 1,
        reserved_at_end: 1,
    };

    /// Network, VPC router, DNS, future use; broadcast
    pub const AWS: CloudReservationPolicy = CloudReservationPolicy {
        name: PolicyName::Aws,
        reserved_at_start: 4,
        reserved_at_end: 1,
    };

    /// Network, default gateway, two DNS; broadcast
    pub const AZURE: CloudReservationPolicy = CloudReservationPolicy {
        name: PolicyName::Azure,
        reserved_at_start: 4,
        reserved_at_end: 1,
    };

    /// Network, default gateway; broadcast
    pub const OCI: CloudReservationPolicy = CloudReservationPolicy {
        name: PolicyName::Oci,
        reserved_at_start: 2,
        reserved_at_end: 1,
    };

    /// Custom policy; each end reserves at least one address
    pub fn new(name: impl Into<String>, reserved_at_start: u32, reserved_at_end: u32) -> Self {
        Self {
            name: PolicyName::from(name.into().as_str()),
            reserved_at_start: reserved_at_start.max(1),
            reserved_at_end: reserved_at_end.max(1),
        }
    }

    /// Addresses reserved in total
    pub fn reserved_total(&self) -> u64 {
        self.reserved_at_start as u64 + self.reserved_at_end as u64
    }

    /// The built-in four, in table order
    pub fn builtin() -> [CloudReservationPolicy; 4] {
        [Self::STANDARD, Self::AWS, Self::AZURE, Self::OCI]
    }
}

/// Named set of reservation policies
///
/// A plain value owned by the caller; registering a policy never affects
/// other registries.
#[derive(Debug, Clone)]
pub struct PolicyRegistry {
    policies: Vec<CloudReservationPolicy>,
}

impl PolicyRegistry {
    /// Registry holding the built-in policies
    pub fn builtin() -> Self {
        Self {
            policies: CloudReservationPolicy::builtin().to_vec(),
        }
    }

    /// Registry with no policies at all
    pub fn empty() -> Self {
        Self {
            policies: Vec::new(),
        }
    }

    /// Add or replace a policy; returns the replaced one
    pub fn register(&mut self, policy: CloudReservationPolicy) -> Option<CloudReservationPolicy> {
        tracing::debug!(
            policy = %policy.name,
            start = policy.reserved_at_start,
            end = policy.reserved_at_end,
            "registering reservation policy"
        );
        match self
            .policies
            .iter_mut()
            .find(|p| p.name.matches(policy.name.as_str()))
        {
            Some(existing) => Some(std::mem::replace(existing, policy)),
            None => {
                self.policies.push(policy);
                None
            }
        }
    }

    /// Look up a policy by name (case-insensitive)
    pub fn get(&self, name: &str) -> Result<&CloudReservationPolicy> {
        self.policies
            .iter()
            .find(|p| p.name.matches(name))
            .ok_or_else(|| NetcalcError::UnknownPolicy(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CloudReservationPolicy> {
        self.policies.iter()
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netcalc_core::ErrorKind;

    #[test]
    fn test_builtin_table() {
        let counts: Vec<(String, u32, u32)> = CloudReservationPolicy::builtin()
            .iter()
            .map(|p| (p.name.to_string(), p.reserved_at_start, p.reserved_at_end))
            .collect();
        assert_eq!(
            counts,
            vec![
                ("Standard".to_string(), 1, 1),
                ("AWS".to_string(), 4, 1),
                ("Azure".to_string(), 4, 1),
                ("OCI".to_string(), 2, 1),
            ]
        );
    }

    #[test]
    fn test_policy_name_parsing() {
        assert_eq!(PolicyName::from("aws"), PolicyName::Aws);
        assert_eq!(PolicyName::from("AZURE"), PolicyName::Azure);
        assert_eq!(PolicyName::from("oci"), PolicyName::Oci);
        assert_eq!(PolicyName::from("standard"), PolicyName::Standard);
        assert_eq!(
            PolicyName::from("GCP"),
            PolicyName::Custom("GCP".to_string())
        );
    }

    #[test]
    fn test_policy_name_serde() {
        let json = serde_json::to_string(&PolicyName::Oci).unwrap();
        assert_eq!(json, "\"OCI\"");
        let name: PolicyName = serde_json::from_str("\"Aws\"").unwrap();
        assert_eq!(name, PolicyName::Aws);
    }

    #[test]
    fn test_registry_lookup() {
        let registry = PolicyRegistry::builtin();
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.get("azure").unwrap(), &CloudReservationPolicy::AZURE);
        let err = registry.get("GCP").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownPolicy);
    }

    #[test]
    fn test_registry_register_custom() {
        let mut registry = PolicyRegistry::builtin();
        assert!(registry
            .register(CloudReservationPolicy::new("GCP", 2, 2))
            .is_none());
        let gcp = registry.get("gcp").unwrap();
        assert_eq!(gcp.reserved_total(), 4);
        assert_eq!(registry.len(), 5);

        // Other registries are untouched
        assert!(PolicyRegistry::builtin().get("GCP").is_err());
    }

    #[test]
    fn test_registry_replace() {
        let mut registry = PolicyRegistry::builtin();
        let old = registry
            .register(CloudReservationPolicy::new("oci", 3, 2))
            .unwrap();
        assert_eq!(old, CloudReservationPolicy::OCI);
        assert_eq!(registry.get("OCI").unwrap().reserved_at_start, 3);
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_custom_policy_reserves_at_least_one() {
        let policy = CloudReservationPolicy::new("Lab", 0, 0);
        assert_eq!(policy.reserved_at_start, 1);
        assert_eq!(policy.reserved_at_end, 1);
    }

    #[test]
    fn test_empty_registry() {
        let registry = PolicyRegistry::empty();
        assert!(registry.is_empty());
        assert!(registry.get("Standard").is_err());
    }
}
