//! Rendering of engine responses

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use netcalc_engine::{Operation, Response};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table output
    Human,
    /// JSON output (pretty-printed)
    Json,
    /// JSON output (compact)
    JsonCompact,
    /// CSV output
    Csv,
}

/// CSV header for an operation
pub fn columns(operation: Operation) -> &'static [&'static str] {
    match operation {
        Operation::Validate => &[
            "valid",
            "address",
            "reason",
            "detail",
            "type",
            "family",
            "network_address",
            "netmask",
            "prefix_length",
            "num_addresses",
        ],
        Operation::Classify => &["address", "category", "provider", "matched_range"],
        Operation::SubnetInfo => &[
            "network",
            "broadcast",
            "first_usable",
            "last_usable",
            "total_addresses",
            "usable_addresses",
            "family",
            "prefix_length",
            "netmask",
            "wildcard_mask",
            "mode",
            "note",
        ],
        Operation::CheckPrivate => &[
            "address",
            "is_rfc1918",
            "is_rfc6598",
            "matched_rfc1918_range",
            "matched_rfc6598_range",
        ],
        Operation::CheckCdn => &["address", "is_cdn", "ip_version", "matched_ranges"],
    }
}

fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map_or(String::new(), T::to_string)
}

/// CSV record matching [`columns`] for the response's operation
pub fn record(response: &Response) -> Vec<String> {
    match response {
        Response::Validate(r) => vec![
            r.valid.to_string(),
            r.address.clone(),
            opt(&r.reason),
            opt(&r.detail),
            r.input_type.map_or("", |t| t.as_str()).to_string(),
            opt(&r.family),
            opt(&r.network_address),
            opt(&r.netmask),
            opt(&r.prefix_length),
            opt(&r.num_addresses),
        ],
        Response::Classify(r) => vec![
            r.address.to_string(),
            r.category.name().to_string(),
            opt(&r.provider),
            opt(&r.matched_range),
        ],
        Response::SubnetInfo(r) => vec![
            r.network.to_string(),
            r.broadcast
                .map_or(netcalc_subnet::NOT_APPLICABLE.to_string(), |b| b.to_string()),
            r.first_usable.to_string(),
            r.last_usable.to_string(),
            r.total_addresses.to_string(),
            r.usable_addresses.to_string(),
            r.family.to_string(),
            r.prefix_length.to_string(),
            r.netmask.to_string(),
            r.wildcard_mask.to_string(),
            r.mode.to_string(),
            opt(&r.note),
        ],
        Response::CheckPrivate(r) => vec![
            r.address.clone(),
            r.is_rfc1918.to_string(),
            r.is_rfc6598.to_string(),
            opt(&r.matched_rfc1918_range),
            opt(&r.matched_rfc6598_range),
        ],
        Response::CheckCdn(r) => vec![
            r.address.clone(),
            r.is_cdn.to_string(),
            r.ip_version.to_string(),
            r.matched_ranges
                .iter()
                .map(|m| format!("{} {}", m.provider, m.range))
                .collect::<Vec<_>>()
                .join(";"),
        ],
    }
}

/// One-line summary used by batch human output
pub fn summary(response: &Response) -> String {
    match response {
        Response::Validate(r) if r.valid => "valid".green().to_string(),
        Response::Validate(r) => format!("invalid ({})", opt(&r.reason)).red().to_string(),
        Response::Classify(r) => r.category.to_string(),
        Response::SubnetInfo(r) => format!(
            "{} - {} ({} usable)",
            r.first_usable, r.last_usable, r.usable_addresses
        ),
        Response::CheckPrivate(r) => {
            format!("rfc1918={} rfc6598={}", r.is_rfc1918, r.is_rfc6598)
        }
        Response::CheckCdn(r) if r.is_cdn => {
            let providers: Vec<&str> = r.matched_ranges.iter().map(|m| m.provider.as_str()).collect();
            format!("cdn ({})", providers.join(", "))
        }
        Response::CheckCdn(_) => "not cdn".to_string(),
    }
}

pub fn print_result(response: &Response, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => print_human(response),
        OutputFormat::Json => print_json(response, true)?,
        OutputFormat::JsonCompact => print_json(response, false)?,
        OutputFormat::Csv => print_csv(response)?,
    }
    Ok(())
}

pub fn print_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<()> {
    if pretty {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", serde_json::to_string(value)?);
    }
    Ok(())
}

fn print_csv(response: &Response) -> Result<()> {
    write_csv(
        std::io::stdout(),
        columns(response.operation()),
        [record(response)],
    )
}

fn field(name: &str, value: impl std::fmt::Display) {
    println!("{:>22}: {}", name.bold(), value);
}

fn opt_field<T: std::fmt::Display>(name: &str, value: &Option<T>) {
    if let Some(value) = value {
        field(name, value);
    }
}

fn print_human(response: &Response) {
    let title = match response.operation() {
        Operation::Validate => "Validation Result",
        Operation::Classify => "Classification",
        Operation::SubnetInfo => "Subnet Information",
        Operation::CheckPrivate => "Private Range Check",
        Operation::CheckCdn => "CDN Range Check",
    };

    println!();
    println!("{}", title.bold().cyan());
    println!("{}", "─".repeat(50).dimmed());

    match response {
        Response::Validate(r) => {
            field("Address", &r.address);
            if r.valid {
                field("Valid", "yes".green());
            } else {
                field("Valid", "no".red());
            }
            opt_field("Reason", &r.reason);
            opt_field("Detail", &r.detail);
            if let Some(input_type) = r.input_type {
                field("Type", input_type.as_str());
            }
            opt_field("Family", &r.family);
            opt_field("Network", &r.network_address);
            opt_field("Netmask", &r.netmask);
            opt_field("Prefix length", &r.prefix_length);
            opt_field("Addresses", &r.num_addresses);
        }
        Response::Classify(r) => {
            field("Address", r.address);
            field("Category", r.category.name().green());
            opt_field("Provider", &r.provider);
            opt_field("Matched range", &r.matched_range);
        }
        Response::SubnetInfo(r) => {
            field("Network", format!("{}/{}", r.network, r.prefix_length));
            field("Family", r.family);
            field("Mode", r.mode.to_string().yellow());
            field("Netmask", r.netmask);
            field("Wildcard mask", r.wildcard_mask);
            field(
                "Broadcast",
                r.broadcast
                    .map_or(netcalc_subnet::NOT_APPLICABLE.to_string(), |b| b.to_string()),
            );
            field("First usable", r.first_usable.to_string().green());
            field("Last usable", r.last_usable.to_string().green());
            field("Total addresses", r.total_addresses);
            field("Usable addresses", r.usable_addresses.to_string().green());
            opt_field("Note", &r.note);
        }
        Response::CheckPrivate(r) => {
            field("Address", &r.address);
            field("RFC1918", yes_no(r.is_rfc1918));
            opt_field("RFC1918 range", &r.matched_rfc1918_range);
            field("RFC6598", yes_no(r.is_rfc6598));
            opt_field("RFC6598 range", &r.matched_rfc6598_range);
        }
        Response::CheckCdn(r) => {
            field("Address", &r.address);
            field("IP version", r.ip_version);
            field("Known CDN", yes_no(r.is_cdn));
            for m in &r.matched_ranges {
                field(&m.provider, m.range);
            }
        }
    }
    println!();
}

fn yes_no(flag: bool) -> colored::ColoredString {
    if flag {
        "yes".green()
    } else {
        "no".normal()
    }
}

/// Write rows as CSV to any writer
pub fn write_csv<W: Write>(
    writer: W,
    header: &[&str],
    rows: impl IntoIterator<Item = Vec<String>>,
) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(header)?;
    for row in rows {
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}
