//! Address operations behind a single request/response boundary
//!
//! [`Engine`] owns a classification table and a policy registry and answers
//! five operations: validate, classify, subnet-info, check-private and
//! check-cdn. It holds no mutable state, so one engine can be shared by
//! any number of threads.
//!
//! # Examples
//!
//! ```
//! use netcalc_engine::{Engine, Operation, Request, Response};
//!
//! let engine = Engine::default();
//! let resp = engine
//!     .handle(&Request::new(Operation::SubnetInfo, "10.0.0.0/24"))
//!     .unwrap();
//! match resp {
//!     Response::SubnetInfo(info) => assert_eq!(info.first_usable.to_string(), "10.0.0.4"),
//!     _ => unreachable!(),
//! }
//! ```

use netcalc_cidr::Cidr;
use netcalc_classify::{AddressCategory, ClassificationTable, RangeEntry};
use netcalc_core::{parse, FamilyHint, IpFamily, NetcalcError, Parsed, Result};
use netcalc_subnet::{subnet_info, CloudReservationPolicy, PolicyName, PolicyRegistry, SubnetInfo};

mod request;

pub use request::{
    CdnMatch, CheckCdnResponse, CheckPrivateResponse, ClassifyResponse, InputType, Operation,
    Request, Response, ValidateResponse,
};

/// IPv6 never reserves addresses, so only Standard applies
static IPV6_POLICY: CloudReservationPolicy = CloudReservationPolicy::STANDARD;

/// Engine settings for library users
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Policy applied to IPv4 subnet-info when the request names none
    pub default_ipv4_mode: PolicyName,
    /// Rows added on top of the compiled-in table
    pub extra_ranges: Vec<RangeEntry>,
    /// Policies registered on top of the built-in four
    pub policies: Vec<CloudReservationPolicy>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_ipv4_mode: PolicyName::Azure,
            extra_ranges: Vec::new(),
            policies: Vec::new(),
        }
    }
}

/// Stateless address engine
#[derive(Debug, Clone)]
pub struct Engine {
    table: ClassificationTable,
    policies: PolicyRegistry,
    default_ipv4_mode: PolicyName,
}

impl Engine {
    /// Build an engine from `config`
    ///
    /// Fails with `UnknownPolicy` if the default IPv4 mode is not registered.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let engine = Self::build(config);
        engine.policies.get(engine.default_ipv4_mode.as_str())?;
        Ok(engine)
    }

    /// Assemble an engine without checking the default mode
    fn build(config: EngineConfig) -> Self {
        let mut policies = PolicyRegistry::builtin();
        for policy in config.policies {
            policies.register(policy);
        }

        let table = ClassificationTable::builder()
            .entries(config.extra_ranges)
            .build();

        tracing::debug!(
            ranges = table.len(),
            policies = policies.len(),
            default_mode = %config.default_ipv4_mode,
            "engine ready"
        );

        Self {
            table,
            policies,
            default_ipv4_mode: config.default_ipv4_mode,
        }
    }

    pub fn table(&self) -> &ClassificationTable {
        &self.table
    }

    pub fn policies(&self) -> &PolicyRegistry {
        &self.policies
    }

    pub fn default_ipv4_mode(&self) -> &PolicyName {
        &self.default_ipv4_mode
    }

    /// Dispatch a request to its operation
    ///
    /// `validate` never fails; the other operations fail with the parse or
    /// policy error that stopped them.
    pub fn handle(&self, request: &Request) -> Result<Response> {
        tracing::debug!(
            operation = %request.operation,
            address = %request.address,
            "handling request"
        );
        let address = request.address.as_str();
        Ok(match request.operation {
            Operation::Validate => Response::Validate(self.validate(address)),
            Operation::Classify => Response::Classify(self.classify(address)?),
            Operation::SubnetInfo => Response::SubnetInfo(
                self.subnet_info(address, request.cloud_mode.as_deref())?,
            ),
            Operation::CheckPrivate => Response::CheckPrivate(self.check_private(address)?),
            Operation::CheckCdn => Response::CheckCdn(self.check_cdn(address)?),
        })
    }

    /// Report whether `text` is a well-formed address or CIDR block
    pub fn validate(&self, text: &str) -> ValidateResponse {
        let parsed = match parse(text, FamilyHint::Auto) {
            Ok(parsed) => parsed,
            Err(e) => return ValidateResponse::invalid(text, e.kind(), e.to_string()),
        };

        match parsed {
            Parsed::Address(addr) => ValidateResponse {
                valid: true,
                address: addr.to_string(),
                reason: None,
                detail: None,
                input_type: Some(InputType::Address),
                family: Some(addr.family()),
                network_address: None,
                netmask: None,
                prefix_length: None,
                num_addresses: None,
            },
            Parsed::Network(net) => ValidateResponse {
                valid: true,
                address: text.to_string(),
                reason: None,
                detail: None,
                input_type: Some(InputType::Network),
                family: Some(net.family()),
                network_address: Some(net.network()),
                netmask: Some(net.netmask()),
                prefix_length: Some(net.prefix_len()),
                num_addresses: Some(net.total_addresses()),
            },
        }
    }

    /// Classify the address part of `text`; a prefix, if any, is ignored
    pub fn classify(&self, text: &str) -> Result<ClassifyResponse> {
        let addr = parse(text, FamilyHint::Auto)?.address();
        let entry = self.table.lookup(&addr);
        let category = entry
            .map(|e| e.category().clone())
            .unwrap_or(AddressCategory::Public);

        Ok(ClassifyResponse {
            address: addr,
            provider: category.provider().map(str::to_string),
            matched_range: entry.map(|e| *e.cidr()),
            category,
        })
    }

    /// Subnet information for `text` under `mode`
    ///
    /// Without a mode IPv4 uses the configured default and IPv6 uses Standard.
    /// A plain address is treated as a single-host network.
    pub fn subnet_info(&self, text: &str, mode: Option<&str>) -> Result<SubnetInfo> {
        let net = parse(text, FamilyHint::Auto)?.into_network();
        let policy = match (mode, net.family()) {
            (Some(mode), _) => self.policies.get(mode)?,
            (None, IpFamily::V4) => self.policies.get(self.default_ipv4_mode.as_str())?,
            (None, IpFamily::V6) => &IPV6_POLICY,
        };
        subnet_info(&net, policy)
    }

    /// RFC1918 and RFC6598 membership
    ///
    /// A block matches a range it lies inside or fully covers. IPv6 input
    /// fails with `UnsupportedFamily`.
    pub fn check_private(&self, text: &str) -> Result<CheckPrivateResponse> {
        let block = to_block(parse(text, FamilyHint::Auto)?);
        if block.family() != IpFamily::V4 {
            return Err(NetcalcError::UnsupportedFamily {
                operation: Operation::CheckPrivate.to_string(),
                supported: IpFamily::V4,
                family: block.family(),
            });
        }

        let rfc1918 = self
            .rows_touching(&block)
            .filter(|e| e.category() == &AddressCategory::PrivateRfc1918)
            .map(|e| *e.cidr())
            .min();
        let rfc6598 = self
            .rows_touching(&block)
            .filter(|e| e.category() == &AddressCategory::SharedAddressSpaceRfc6598)
            .map(|e| *e.cidr())
            .min();

        Ok(CheckPrivateResponse {
            address: text.to_string(),
            is_rfc1918: rfc1918.is_some(),
            is_rfc6598: rfc6598.is_some(),
            matched_rfc1918_range: rfc1918,
            matched_rfc6598_range: rfc6598,
        })
    }

    /// Known CDN ranges touching the address or block
    pub fn check_cdn(&self, text: &str) -> Result<CheckCdnResponse> {
        let block = to_block(parse(text, FamilyHint::Auto)?);

        let matched_ranges: Vec<CdnMatch> = self
            .rows_touching(&block)
            .filter_map(|e| {
                e.category().provider().map(|provider| CdnMatch {
                    provider: provider.to_string(),
                    range: *e.cidr(),
                })
            })
            .collect();

        Ok(CheckCdnResponse {
            address: text.to_string(),
            is_cdn: !matched_ranges.is_empty(),
            ip_version: block.family().version(),
            matched_ranges,
        })
    }

    /// Rows that are a subnet or supernet of `block`, most specific first
    fn rows_touching<'a>(&'a self, block: &'a Cidr) -> impl Iterator<Item = &'a RangeEntry> + 'a {
        self.table
            .entries(block.family())
            .iter()
            .filter(move |e| e.cidr().overlaps(block))
    }
}

impl Default for Engine {
    /// Built-in ranges and policies with Azure as the IPv4 default
    fn default() -> Self {
        Self::build(EngineConfig::default())
    }
}

/// A plain address becomes a full-width block
fn to_block(parsed: Parsed) -> Cidr {
    Cidr::from_network(&parsed.into_network())
}
