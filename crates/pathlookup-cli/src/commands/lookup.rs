//! Lookup command handler: validate, fetch, analyse, render.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use pathlookup_cli::output::{render, render_no_path, OutputFormat, RenderOptions};
use pathlookup_lib::{
    run_lookup, FileSource, LookupArgs, PathLookupRequest, PathLookupService, PathReport,
    PlatformClient, PlatformConfig, Protocol, ReportOptions,
};

/// Arguments for the lookup command.
#[derive(Debug, Clone)]
pub struct LookupCommandArgs {
    pub source: String,
    pub destination: String,
    /// Raw protocol name, parsed case-insensitively.
    pub protocol: String,
    pub source_port: Option<String>,
    pub destination_port: Option<String>,
    pub ttl: u16,
    pub fragment_offset: u16,
    pub secured_path: bool,
    pub l2_exclusion: bool,
    pub pivot: Option<String>,
    pub file: Option<PathBuf>,
    pub format: OutputFormat,
    pub verbose: bool,
    pub all_edges: bool,
    /// Suffix selecting `IPF_URL_<PROFILE>` / `IPF_TOKEN_<PROFILE>`.
    pub profile: Option<String>,
    pub snapshot: Option<String>,
}

impl LookupCommandArgs {
    /// Convert CLI args to library lookup arguments.
    pub fn to_lookup_args(&self) -> pathlookup_lib::Result<LookupArgs> {
        Ok(LookupArgs {
            source: self.source.clone(),
            destination: self.destination.clone(),
            protocol: self.protocol.parse::<Protocol>()?,
            source_port: self.source_port.clone(),
            destination_port: self.destination_port.clone(),
            ttl: self.ttl,
            fragment_offset: self.fragment_offset,
            secured_path: self.secured_path,
            pivot: self.pivot.clone(),
            file: self.file.clone(),
        })
    }

    fn report_options(&self) -> ReportOptions {
        ReportOptions {
            l2_exclusion: self.l2_exclusion,
            all_edges: self.all_edges,
        }
    }
}

/// Run one lookup and print the report to stdout.
pub fn handle_lookup(args: &LookupCommandArgs) -> Result<()> {
    // Validation comes first so bad input never builds a client.
    let request = args
        .to_lookup_args()
        .and_then(|raw| raw.validate())
        .context("invalid lookup arguments")?;

    let service = build_service(args, &request)?;
    let outcome = run_lookup(service.as_ref(), &request).context("pathlookup failed")?;
    let report = PathReport::build(&request, &outcome, args.report_options());

    let options = RenderOptions::detect(args.verbose);
    let rendered = if report.nothing_to_display() && args.format != OutputFormat::Json {
        render_no_path(&report, &options)
    } else {
        render(&report, args.format, &options).context("failed to serialize the report")?
    };

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(rendered.as_bytes())
        .context("failed to write the report")?;
    stdout.flush().context("failed to write the report")?;
    Ok(())
}

/// A captured file wins over the network; only without one is the platform
/// configuration read.
fn build_service(
    args: &LookupCommandArgs,
    request: &PathLookupRequest,
) -> Result<Box<dyn PathLookupService>> {
    if let Some(path) = &request.file {
        debug!(path = %path.display(), "using captured pathlookup file");
        return Ok(Box::new(FileSource::new(path)));
    }

    let config = PlatformConfig::from_env(args.profile.as_deref())
        .context("failed to read the platform configuration")?
        .with_snapshot(args.snapshot.as_deref());
    debug!(config = ?config, "using platform");
    let client = PlatformClient::new(config).context("failed to build the platform client")?;
    Ok(Box::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> LookupCommandArgs {
        LookupCommandArgs {
            source: "10.0.0.1".to_string(),
            destination: "10.0.1.1".to_string(),
            protocol: "TCP".to_string(),
            source_port: None,
            destination_port: Some("443".to_string()),
            ttl: 128,
            fragment_offset: 0,
            secured_path: false,
            l2_exclusion: true,
            pivot: None,
            file: None,
            format: OutputFormat::Table,
            verbose: false,
            all_edges: false,
            profile: None,
            snapshot: None,
        }
    }

    #[test]
    fn protocol_is_parsed_case_insensitively() {
        let raw = args().to_lookup_args().unwrap();
        assert_eq!(raw.protocol, Protocol::Tcp);
        assert_eq!(raw.destination_port.as_deref(), Some("443"));
    }

    #[test]
    fn unknown_protocol_is_invalid_input() {
        let mut args = args();
        args.protocol = "sctp".to_string();
        assert!(args.to_lookup_args().unwrap_err().is_invalid_input());
    }

    #[test]
    fn file_request_needs_no_platform_configuration() {
        let mut args = args();
        args.file = Some(PathBuf::from("capture.json"));
        args.profile = Some("profile-that-is-never-set".to_string());
        let request = args.to_lookup_args().unwrap().validate().unwrap();
        assert!(build_service(&args, &request).is_ok());
    }

    #[test]
    fn report_options_follow_flags() {
        let options = args().report_options();
        assert!(options.l2_exclusion);
        assert!(!options.all_edges);
    }
}
