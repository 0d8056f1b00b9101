//! Request and response shapes
//!
//! Field names here are the wire format shared by the CLI JSON output and
//! the JSON-RPC server.

use netcalc_cidr::Cidr;
use netcalc_classify::AddressCategory;
use netcalc_core::{AddressCount, ErrorKind, IpFamily, ParsedAddress};
use netcalc_subnet::SubnetInfo;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operation requested by a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    Validate,
    Classify,
    SubnetInfo,
    CheckPrivate,
    CheckCdn,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Validate,
        Operation::Classify,
        Operation::SubnetInfo,
        Operation::CheckPrivate,
        Operation::CheckCdn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Validate => "validate",
            Operation::Classify => "classify",
            Operation::SubnetInfo => "subnet-info",
            Operation::CheckPrivate => "check-private",
            Operation::CheckCdn => "check-cdn",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inbound request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub operation: Operation,
    pub address: String,
    /// Policy name for subnet-info; other operations ignore it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_mode: Option<String>,
}

impl Request {
    pub fn new(operation: Operation, address: impl Into<String>) -> Self {
        Self {
            operation,
            address: address.into(),
            cloud_mode: None,
        }
    }

    pub fn with_cloud_mode(mut self, mode: impl Into<String>) -> Self {
        self.cloud_mode = Some(mode.into());
        self
    }
}

/// Whether validated text was a plain address or CIDR block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Address,
    Network,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Address => "address",
            InputType::Network => "network",
        }
    }
}

/// Result of `validate`; invalid input is a normal response, not an error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    /// Canonical form for plain addresses, the input otherwise
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub input_type: Option<InputType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<IpFamily>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_address: Option<ParsedAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub netmask: Option<ParsedAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_length: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_addresses: Option<AddressCount>,
}

impl ValidateResponse {
    pub(crate) fn invalid(input: &str, reason: ErrorKind, detail: String) -> Self {
        Self {
            valid: false,
            address: input.to_string(),
            reason: Some(reason),
            detail: Some(detail),
            input_type: None,
            family: None,
            network_address: None,
            netmask: None,
            prefix_length: None,
            num_addresses: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifyResponse {
    pub address: ParsedAddress,
    pub category: AddressCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_range: Option<Cidr>,
}

/// RFC1918 / RFC6598 membership of an IPv4 address or block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckPrivateResponse {
    pub address: String,
    pub is_rfc1918: bool,
    pub is_rfc6598: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_rfc1918_range: Option<Cidr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_rfc6598_range: Option<Cidr>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CdnMatch {
    pub provider: String,
    pub range: Cidr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckCdnResponse {
    pub address: String,
    pub is_cdn: bool,
    pub ip_version: u8,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub matched_ranges: Vec<CdnMatch>,
}

/// Outbound response, serialized without a variant tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Validate(ValidateResponse),
    Classify(ClassifyResponse),
    SubnetInfo(SubnetInfo),
    CheckPrivate(CheckPrivateResponse),
    CheckCdn(CheckCdnResponse),
}

impl Response {
    pub fn operation(&self) -> Operation {
        match self {
            Response::Validate(_) => Operation::Validate,
            Response::Classify(_) => Operation::Classify,
            Response::SubnetInfo(_) => Operation::SubnetInfo,
            Response::CheckPrivate(_) => Operation::CheckPrivate,
            Response::CheckCdn(_) => Operation::CheckCdn,
        }
    }
}
