use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use netcalc_classify::parse_cdn_ranges;
use netcalc_engine::{Engine, EngineConfig, Operation, Request, Response};
use netcalc_rpc::{RpcServer, StdioTransport};
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::prelude::*;

mod batch;
mod output;

use batch::{read_inputs, BatchProcessor, BatchResult};
use output::OutputFormat;

/// IPv4/IPv6 address validation, classification and subnet calculation
#[derive(Parser)]
#[command(name = "netcalc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value = "human", global = true)]
    output: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Cloud reservation policy for subnet-info (Standard, AWS, Azure, OCI)
    ///
    /// Without it IPv4 uses Azure and IPv6 uses Standard. IPv6 rejects any
    /// policy other than Standard.
    #[arg(short, long, env = "NETCALC_MODE", global = true)]
    mode: Option<String>,

    /// Extra CDN ranges, one `provider cidr` pair per line
    #[arg(long, env = "NETCALC_CDN_RANGES", value_name = "FILE", global = true)]
    cdn_ranges: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that an address or CIDR block is well-formed
    Validate(AddressArgs),
    /// Classify an address against special-use and CDN ranges
    Classify(AddressArgs),
    /// Compute network, broadcast and usable host range
    Subnet(NetworkArgs),
    /// Check an IPv4 address or block against RFC1918 and RFC6598
    CheckPrivate(AddressArgs),
    /// Check an address or block against known CDN ranges
    CheckCdn(AddressArgs),
    /// Batch process multiple inputs from file or stdin
    Batch(BatchArgs),
    /// Serve JSON-RPC 2.0 over stdin/stdout
    Serve(ServeArgs),
}

#[derive(Parser)]
struct AddressArgs {
    /// IPv4/IPv6 address, optionally in CIDR notation
    #[arg(value_name = "ADDRESS")]
    address: String,
}

#[derive(Parser)]
struct NetworkArgs {
    /// Network in CIDR notation (a plain address is a single host)
    #[arg(value_name = "NETWORK")]
    network: String,
}

#[derive(Parser)]
struct BatchArgs {
    /// Input file (use '-' for stdin)
    #[arg(short, long, value_name = "FILE")]
    file: Option<String>,

    /// Operation applied to every input
    #[arg(long, value_enum, default_value = "classify")]
    operation: OperationArg,

    /// Number of worker threads (default: CPU cores)
    #[arg(short, long)]
    workers: Option<usize>,
}

#[derive(Parser)]
struct ServeArgs {
    /// Use blocking stdio instead of the async runtime
    #[arg(long)]
    blocking: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OperationArg {
    Validate,
    Classify,
    SubnetInfo,
    CheckPrivate,
    CheckCdn,
}

impl From<OperationArg> for Operation {
    fn from(arg: OperationArg) -> Self {
        match arg {
            OperationArg::Validate => Operation::Validate,
            OperationArg::Classify => Operation::Classify,
            OperationArg::SubnetInfo => Operation::SubnetInfo,
            OperationArg::CheckPrivate => Operation::CheckPrivate,
            OperationArg::CheckCdn => Operation::CheckCdn,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let engine = build_engine(&cli)?;

    let format = cli.output;
    let mode = cli.mode.as_deref();
    match cli.command {
        Commands::Validate(args) => {
            handle_single(&engine, Operation::Validate, args.address, mode, format)?
        }
        Commands::Classify(args) => {
            handle_single(&engine, Operation::Classify, args.address, mode, format)?
        }
        Commands::Subnet(args) => {
            handle_single(&engine, Operation::SubnetInfo, args.network, mode, format)?
        }
        Commands::CheckPrivate(args) => {
            handle_single(&engine, Operation::CheckPrivate, args.address, mode, format)?
        }
        Commands::CheckCdn(args) => {
            handle_single(&engine, Operation::CheckCdn, args.address, mode, format)?
        }
        Commands::Batch(args) => handle_batch(&engine, args, mode, format)?,
        Commands::Serve(args) => handle_serve(engine, args)?,
    }

    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn engine_config(cli: &Cli) -> Result<EngineConfig> {
    let extra_ranges = match &cli.cdn_ranges {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading CDN ranges from {}", path.display()))?;
            parse_cdn_ranges(&text)
                .with_context(|| format!("parsing CDN ranges in {}", path.display()))?
        }
        None => Vec::new(),
    };

    Ok(EngineConfig {
        extra_ranges,
        ..EngineConfig::default()
    })
}

fn build_engine(cli: &Cli) -> Result<Engine> {
    let config = engine_config(cli)?;
    if cli.verbose {
        eprintln!(
            "{} Mode: {}, extra CDN ranges: {}",
            "›".blue(),
            cli.mode.as_deref().unwrap_or("default"),
            config.extra_ranges.len()
        );
    }
    let engine = Engine::new(config).context("invalid configuration")?;

    // Fail before reading any input when the mode is misspelled
    if let Some(mode) = &cli.mode {
        engine
            .policies()
            .get(mode)
            .with_context(|| format!("invalid --mode {}", mode))?;
    }
    Ok(engine)
}

/// Build the request for one input; `mode` only matters to subnet-info
fn request(operation: Operation, address: impl Into<String>, mode: Option<&str>) -> Request {
    let request = Request::new(operation, address);
    match mode {
        Some(mode) => request.with_cloud_mode(mode),
        None => request,
    }
}

fn run_single(
    engine: &Engine,
    operation: Operation,
    address: &str,
    mode: Option<&str>,
) -> netcalc_core::Result<Response> {
    engine.handle(&request(operation, address, mode))
}

fn handle_single(
    engine: &Engine,
    operation: Operation,
    address: String,
    mode: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let response = run_single(engine, operation, &address, mode)
        .with_context(|| format!("{} failed for {}", operation, address))?;
    output::print_result(&response, format)
}

fn handle_batch(
    engine: &Engine,
    args: BatchArgs,
    mode: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let inputs = match args.file.as_deref() {
        None | Some("-") => read_inputs(std::io::stdin().lock())?,
        Some(path) => {
            let file = std::fs::File::open(path).with_context(|| format!("opening {}", path))?;
            read_inputs(BufReader::new(file))?
        }
    };

    let operation = Operation::from(args.operation);
    let processor = BatchProcessor::new(engine, args.workers)?;
    tracing::debug!(
        inputs = inputs.len(),
        workers = processor.thread_count(),
        %operation,
        "starting batch"
    );

    let results = processor.process(inputs, operation, mode);
    print_batch(&results, operation, format)
}

fn print_batch(results: &[BatchResult], operation: Operation, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => {
            for r in results {
                match &r.result {
                    Ok(response) => println!("{} {}", r.input.bold(), output::summary(response)),
                    Err(e) => println!("{} {}", r.input.bold(), e.to_string().red()),
                }
            }
        }
        OutputFormat::Json => output::print_json(results, true)?,
        // JSON Lines
        OutputFormat::JsonCompact => {
            for r in results {
                output::print_json(r, false)?;
            }
        }
        OutputFormat::Csv => {
            let mut header = vec!["input"];
            header.extend_from_slice(output::columns(operation));
            header.push("error");

            let width = output::columns(operation).len();
            let rows = results.iter().map(|r| {
                let mut row = vec![r.input.clone()];
                match &r.result {
                    Ok(response) => {
                        row.extend(output::record(response));
                        row.push(String::new());
                    }
                    Err(e) => {
                        row.extend(std::iter::repeat(String::new()).take(width));
                        row.push(e.to_string());
                    }
                }
                row
            });
            output::write_csv(std::io::stdout(), &header, rows)?;
        }
    }

    let failed = results.iter().filter(|r| r.result.is_err()).count();
    if failed > 0 {
        tracing::warn!(failed, total = results.len(), "some inputs failed");
    }
    Ok(())
}

fn handle_serve(engine: Engine, args: ServeArgs) -> Result<()> {
    tracing::info!(blocking = args.blocking, "starting JSON-RPC server on stdio");
    let transport = StdioTransport::new(Arc::new(RpcServer::new(engine)));

    if args.blocking {
        transport.run_blocking()?;
    } else {
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(transport.run_async())?;
    }
    Ok(())
}
