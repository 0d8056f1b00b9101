//! End-to-end request handling and wire shapes

use netcalc_engine::{Engine, Operation, Request};
use serde_json::{json, Value};

fn run(request: Value) -> Value {
    let request: Request = serde_json::from_value(request).unwrap();
    let response = Engine::default().handle(&request).unwrap();
    serde_json::to_value(&response).unwrap()
}

#[test]
fn validate_valid_address() {
    let resp = run(json!({"operation": "validate", "address": "192.168.1.1"}));
    assert_eq!(resp["valid"], true);
    assert_eq!(resp["type"], "address");
    assert_eq!(resp["family"], "IPv4");
    assert!(resp.get("reason").is_none());
}

#[test]
fn validate_octet_out_of_range() {
    let resp = run(json!({"operation": "validate", "address": "999.999.999.999"}));
    assert_eq!(resp["valid"], false);
    assert_eq!(resp["reason"], "OctetOutOfRange");
    assert!(resp["detail"].as_str().unwrap().contains("999"));
}

#[test]
fn validate_network_fields() {
    let resp = run(json!({"operation": "validate", "address": "2001:db8::/32"}));
    assert_eq!(resp["type"], "network");
    assert_eq!(resp["family"], "IPv6");
    assert_eq!(resp["network_address"], "2001:db8::");
    assert_eq!(resp["prefix_length"], 32);
    assert_eq!(resp["num_addresses"], "79228162514264337593543950336");
}

#[test]
fn classify_private() {
    let resp = run(json!({"operation": "classify", "address": "10.0.0.5"}));
    assert_eq!(resp["address"], "10.0.0.5");
    assert_eq!(resp["category"], "Private-RFC1918");
    assert_eq!(resp["matched_range"], "10.0.0.0/8");
    assert!(resp.get("provider").is_none());
}

#[test]
fn classify_shared_address_space() {
    let resp = run(json!({"operation": "classify", "address": "100.64.0.1"}));
    assert_eq!(resp["category"], "SharedAddressSpace-RFC6598");
}

#[test]
fn classify_cdn_and_public() {
    let resp = run(json!({"operation": "classify", "address": "1.1.1.1"}));
    assert_eq!(resp["category"], "Public");
    assert!(resp.get("matched_range").is_none());

    let resp = run(json!({"operation": "classify", "address": "172.64.1.1"}));
    assert_eq!(resp["category"], "KnownCDNRange");
    assert_eq!(resp["provider"], "Cloudflare");
}

#[test]
fn subnet_info_azure_slash_24() {
    let resp = run(json!({
        "operation": "subnet-info",
        "address": "10.0.0.0/24",
        "cloud_mode": "Azure"
    }));
    assert_eq!(resp["network"], "10.0.0.0");
    assert_eq!(resp["broadcast"], "10.0.0.255");
    assert_eq!(resp["first_usable"], "10.0.0.4");
    assert_eq!(resp["last_usable"], "10.0.0.254");
    assert_eq!(resp["total_addresses"], 256);
    assert_eq!(resp["usable_addresses"], 251);
    assert_eq!(resp["mode"], "Azure");
    assert_eq!(resp["netmask"], "255.255.255.0");
    assert_eq!(resp["wildcard_mask"], "0.0.0.255");
}

#[test]
fn subnet_info_point_to_point() {
    let resp = run(json!({
        "operation": "subnet-info",
        "address": "192.168.1.0/31",
        "cloud_mode": "Standard"
    }));
    assert_eq!(resp["first_usable"], "192.168.1.0");
    assert_eq!(resp["last_usable"], "192.168.1.1");
    assert_eq!(resp["usable_addresses"], 2);
    assert_eq!(resp["broadcast"], "N/A");
}

#[test]
fn subnet_info_ipv6_defaults_to_standard() {
    let resp = run(json!({"operation": "subnet-info", "address": "2001:db8:abcd::/48"}));
    assert_eq!(resp["mode"], "Standard");
    assert_eq!(resp["broadcast"], "N/A");
    assert_eq!(resp["total_addresses"], "1208925819614629174706176");
    assert_eq!(resp["usable_addresses"], resp["total_addresses"]);
}

#[test]
fn check_private_shape() {
    let resp = run(json!({"operation": "check-private", "address": "192.168.10.0/24"}));
    assert_eq!(resp["address"], "192.168.10.0/24");
    assert_eq!(resp["is_rfc1918"], true);
    assert_eq!(resp["is_rfc6598"], false);
    assert_eq!(resp["matched_rfc1918_range"], "192.168.0.0/16");
    assert!(resp.get("matched_rfc6598_range").is_none());
}

#[test]
fn check_cdn_shape() {
    let resp = run(json!({"operation": "check-cdn", "address": "104.16.0.0/12"}));
    assert_eq!(resp["is_cdn"], true);
    assert_eq!(resp["ip_version"], 4);
    assert_eq!(
        resp["matched_ranges"],
        json!([
            {"provider": "Cloudflare", "range": "104.24.0.0/14"},
            {"provider": "Cloudflare", "range": "104.16.0.0/13"}
        ])
    );

    let resp = run(json!({"operation": "check-cdn", "address": "9.9.9.9"}));
    assert_eq!(resp["is_cdn"], false);
    assert!(resp.get("matched_ranges").is_none());
}

#[test]
fn errors_are_typed() {
    let engine = Engine::default();
    let cases = [
        (Request::new(Operation::Classify, "10.0.0.256"), "OctetOutOfRange"),
        (Request::new(Operation::SubnetInfo, "10.0.0.0/-1"), "PrefixOutOfRange"),
        (
            Request::new(Operation::SubnetInfo, "10.0.0.0/30").with_cloud_mode("AWS"),
            "InsufficientAddressSpace",
        ),
        (
            Request::new(Operation::SubnetInfo, "fe80::/64").with_cloud_mode("OCI"),
            "UnsupportedPolicyForFamily",
        ),
        (
            Request::new(Operation::SubnetInfo, "10.0.0.0/24").with_cloud_mode("GCP"),
            "UnknownPolicy",
        ),
        (
            Request::new(Operation::CheckPrivate, "fd00::1"),
            "UnsupportedFamily",
        ),
    ];
    for (request, kind) in cases {
        let err = engine.handle(&request).unwrap_err();
        assert_eq!(err.kind().to_string(), kind, "{:?}", request);
    }
}

#[test]
fn shared_engine_across_threads() {
    let engine = Engine::default();
    std::thread::scope(|s| {
        for i in 0..8u8 {
            let engine = &engine;
            s.spawn(move || {
                let addr = format!("10.{}.0.1", i);
                let resp = engine.classify(&addr).unwrap();
                assert_eq!(resp.category.name(), "Private-RFC1918");
            });
        }
    });
}
