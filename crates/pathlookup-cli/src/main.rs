use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use pathlookup_cli::output::OutputFormat;
use pathlookup_lib::request::DEFAULT_TTL;

mod commands;

use commands::lookup::{handle_lookup, LookupCommandArgs};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Display one IP Fabric Pathlookup path with its security decisions"
)]
struct Cli {
    /// Source IPv4 address or subnet.
    #[arg(short = 's', long = "source-ip", alias = "source_ip")]
    source_ip: String,

    /// Destination IPv4 address or subnet.
    #[arg(short = 'd', long = "destination-ip", alias = "destination_ip")]
    destination_ip: String,

    /// Protocol: tcp, udp or icmp.
    #[arg(short = 'p', long, default_value = "icmp")]
    protocol: String,

    /// Destination port(s) for tcp/udp, e.g. `443` or `80,8000-8080`.
    #[arg(long = "destination-port", aliases = ["destination_port", "dp"])]
    destination_port: Option<String>,

    /// Source port(s) for tcp/udp [default: 1024].
    #[arg(long = "source-port", aliases = ["source_port", "sp"])]
    source_port: Option<String>,

    /// Packet time to live (0-255).
    #[arg(long, default_value_t = DEFAULT_TTL)]
    ttl: u16,

    /// IP fragment offset (0-8191).
    #[arg(long = "fragment-offset", aliases = ["fragment_offset", "fo"], default_value_t = 0)]
    fragment_offset: u16,

    /// Stop the trace at the first security decision.
    #[arg(long = "secure-path", aliases = ["secure_path", "security", "sec"])]
    secure_path: bool,

    /// Hide link-layer hops that carry no security decision.
    #[arg(long = "l2-exclusion", aliases = ["l2_exclusion", "l2"])]
    l2_exclusion: bool,

    /// Pivot IPv4 address used to locate where the source enters the fabric.
    #[arg(long)]
    pivot: Option<String>,

    /// Render the hops as a table.
    #[arg(short = 't', long)]
    table: bool,

    /// Render the report as JSON.
    #[arg(long, conflicts_with = "table")]
    json: bool,

    /// Also list every edge of the returned graph.
    #[arg(long = "all-edges")]
    all_edges: bool,

    /// Show trace events and enable debug logging.
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Read a captured Pathlookup response instead of querying the platform.
    #[arg(short = 'f', long)]
    file: Option<PathBuf>,

    /// Credential profile: reads IPF_URL_<PROFILE> and IPF_TOKEN_<PROFILE>.
    #[arg(long)]
    profile: Option<String>,

    /// Snapshot id (overrides IPF_SNAPSHOT_ID).
    #[arg(long)]
    snapshot: Option<String>,
}

impl Cli {
    fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else if self.table {
            OutputFormat::Table
        } else {
            OutputFormat::Narrative
        }
    }

    fn into_lookup_args(self) -> LookupCommandArgs {
        let format = self.output_format();
        LookupCommandArgs {
            source: self.source_ip,
            destination: self.destination_ip,
            protocol: self.protocol,
            source_port: self.source_port,
            destination_port: self.destination_port,
            ttl: self.ttl,
            fragment_offset: self.fragment_offset,
            secured_path: self.secure_path,
            l2_exclusion: self.l2_exclusion,
            pivot: self.pivot,
            file: self.file,
            format,
            verbose: self.verbose,
            all_edges: self.all_edges,
            profile: self.profile,
            snapshot: self.snapshot,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let env_file = load_env_file()?;
    init_tracing(cli.verbose);
    if let Some(path) = env_file {
        debug!(path = %path.display(), "loaded environment file");
    }
    handle_lookup(&cli.into_lookup_args())
}

/// Values from the nearest `.env` take precedence over the process
/// environment. A missing file is not an error.
fn load_env_file() -> Result<Option<PathBuf>> {
    match dotenvy::dotenv_override() {
        Ok(path) => Ok(Some(path)),
        Err(err) if err.not_found() => Ok(None),
        Err(err) => Err(err).context("failed to load .env file"),
    }
}

/// Logs go to stderr so stdout carries only the report.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
