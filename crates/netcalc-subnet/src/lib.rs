//! Subnet partitioning under cloud reservation policies
//!
//! Computes network, broadcast and usable host range for a parsed network:
//! - IPv4 `/32` is a single host and `/31` a point-to-point link (RFC 3021);
//!   neither reserves anything
//! - shorter IPv4 prefixes apply the policy's start/end reservations
//! - IPv6 never reserves addresses and only accepts the Standard policy
//!
//! # Examples
//!
//! ```
//! use netcalc_subnet::{subnet_info, CloudReservationPolicy};
//!
//! let net = "10.0.0.0/24".parse().unwrap();
//! let info = subnet_info(&net, &CloudReservationPolicy::AZURE).unwrap();
//! assert_eq!(info.first_usable.to_string(), "10.0.0.4");
//! assert_eq!(info.usable_addresses.to_u64(), Some(251));
//! ```

use netcalc_core::{AddressCount, IpFamily, NetcalcError, ParsedAddress, ParsedNetwork, Result};
use serde::{Serialize, Serializer};

mod policy;

pub use policy::{CloudReservationPolicy, PolicyName, PolicyRegistry};

/// Placeholder for addresses that do not apply (e.g. broadcast of a /31)
pub const NOT_APPLICABLE: &str = "N/A";

const NOTE_HOST: &str = "Single host address";
const NOTE_POINT_TO_POINT: &str = "RFC 3021 point-to-point link (no broadcast)";
const NOTE_IPV6: &str = "IPv6 subnets do not have reserved addresses like IPv4";

/// Partition data for one network under one policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubnetInfo {
    pub network: ParsedAddress,
    /// `None` for IPv4 /31 and /32 and for all IPv6 networks
    #[serde(serialize_with = "address_or_na")]
    pub broadcast: Option<ParsedAddress>,
    pub first_usable: ParsedAddress,
    pub last_usable: ParsedAddress,
    pub total_addresses: AddressCount,
    pub usable_addresses: AddressCount,
    pub family: IpFamily,
    pub prefix_length: u8,
    pub netmask: ParsedAddress,
    pub wildcard_mask: ParsedAddress,
    /// Policy the reservations came from
    pub mode: PolicyName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<&'static str>,
}

fn address_or_na<S>(addr: &Option<ParsedAddress>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match addr {
        Some(addr) => serializer.collect_str(addr),
        None => serializer.serialize_str(NOT_APPLICABLE),
    }
}

/// Compute subnet information for `net` under `policy`
///
/// # Errors
///
/// - [`NetcalcError::InsufficientAddressSpace`] if the policy reserves as
///   many addresses as the IPv4 subnet holds (e.g. AWS on a /30)
/// - [`NetcalcError::UnsupportedPolicyForFamily`] for any policy other than
///   Standard on an IPv6 network
pub fn subnet_info(net: &ParsedNetwork, policy: &CloudReservationPolicy) -> Result<SubnetInfo> {
    let base = SubnetInfo {
        network: net.network(),
        broadcast: None,
        first_usable: net.network(),
        last_usable: net.last_address(),
        total_addresses: net.total_addresses(),
        usable_addresses: net.total_addresses(),
        family: net.family(),
        prefix_length: net.prefix_len(),
        netmask: net.netmask(),
        wildcard_mask: net.wildcard(),
        mode: policy.name.clone(),
        note: None,
    };

    let info = match (net.family(), net.prefix_len()) {
        (IpFamily::V6, _) => {
            if policy.name != PolicyName::Standard {
                return Err(NetcalcError::UnsupportedPolicyForFamily {
                    policy: policy.name.to_string(),
                    family: IpFamily::V6,
                });
            }
            SubnetInfo {
                note: Some(NOTE_IPV6),
                ..base
            }
        }
        (IpFamily::V4, 32) => SubnetInfo {
            note: Some(NOTE_HOST),
            ..base
        },
        (IpFamily::V4, 31) => SubnetInfo {
            note: Some(NOTE_POINT_TO_POINT),
            ..base
        },
        (IpFamily::V4, prefix_len) => reserve(base, net, policy, prefix_len)?,
    };

    tracing::debug!(
        network = %net,
        policy = %policy.name,
        usable = %info.usable_addresses,
        "computed subnet info"
    );
    Ok(info)
}

/// Apply the policy's start and end reservations to an IPv4 /30 or shorter
fn reserve(
    base: SubnetInfo,
    net: &ParsedNetwork,
    policy: &CloudReservationPolicy,
    prefix_len: u8,
) -> Result<SubnetInfo> {
    let start = policy.reserved_at_start as u128;
    let end = policy.reserved_at_end as u128;
    let total = base.total_addresses;
    let insufficient = || NetcalcError::InsufficientAddressSpace {
        policy: policy.name.to_string(),
        prefix_len,
        total,
        reserved: policy.reserved_total(),
    };

    let usable = total
        .checked_sub(start + end)
        .ok_or_else(insufficient)?;
    let first_usable = base.network.checked_add(start).ok_or_else(insufficient)?;
    let last_usable = net
        .last_address()
        .checked_sub(end)
        .ok_or_else(insufficient)?;

    Ok(SubnetInfo {
        broadcast: Some(net.last_address()),
        first_usable,
        last_usable,
        usable_addresses: usable,
        ..base
    })
}

/// Resolve `mode` in `registry` and compute subnet information
pub fn subnet_info_with(
    registry: &PolicyRegistry,
    net: &ParsedNetwork,
    mode: &str,
) -> Result<SubnetInfo> {
    let policy = registry.get(mode)?;
    subnet_info(net, policy)
}
