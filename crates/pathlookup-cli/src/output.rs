//! Output formatting for Pathlookup reports.
//!
//! Every renderer returns the finished text so the command decides where it
//! goes and tests can inspect it. The header and event summary are shared by
//! the narrative and table formats.

use std::fmt::Write as _;

use pathlookup_lib::report::{EventSummary, FlowSummary};
use pathlookup_lib::{PathReport, PivotResolution, Severity, Verdict};

use crate::terminal::{supports_unicode, ColorPalette};

pub mod narrative;
pub mod table;

pub use narrative::render_narrative;
pub use table::render_table;

/// Printed instead of a report when the platform returned no edges.
pub const NO_PATH_MESSAGE: &str = "EXIT -> no Path available";

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Narrative,
    Table,
    Json,
}

/// Presentation settings shared by the text renderers.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub verbose: bool,
    pub palette: ColorPalette,
    pub unicode: bool,
}

impl RenderOptions {
    /// Options matching the current terminal.
    pub fn detect(verbose: bool) -> Self {
        Self {
            verbose,
            palette: ColorPalette::detect(),
            unicode: supports_unicode(),
        }
    }

    /// Uncolored ASCII output, independent of the environment.
    pub fn plain(verbose: bool) -> Self {
        Self {
            verbose,
            palette: ColorPalette::plain(),
            unicode: false,
        }
    }
}

/// Render `report` in `format`.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render(
    report: &PathReport,
    format: OutputFormat,
    options: &RenderOptions,
) -> serde_json::Result<String> {
    match format {
        OutputFormat::Narrative => Ok(render_narrative(report, options)),
        OutputFormat::Table => Ok(render_table(report, options)),
        OutputFormat::Json => render_json(report),
    }
}

/// Header and event summary, then the no-path message.
pub fn render_no_path(report: &PathReport, options: &RenderOptions) -> String {
    let mut out = String::new();
    write_header(&mut out, &report.flow, options);
    write_summary(&mut out, &report.summary, options);
    let _ = writeln!(out);
    let _ = writeln!(out, "{NO_PATH_MESSAGE}");
    out
}

/// Render the report as pretty-printed JSON.
pub fn render_json(report: &PathReport) -> serde_json::Result<String> {
    let mut out = serde_json::to_string_pretty(report)?;
    out.push('\n');
    Ok(out)
}

/// Title, flow line and (verbose) packet details.
pub(crate) fn write_header(out: &mut String, flow: &FlowSummary, options: &RenderOptions) {
    let p = &options.palette;
    let _ = writeln!(out, "{}Pathlookup Analysis{}", p.white_bold, p.reset);

    let source = with_port(&flow.source, flow.source_port.as_deref());
    let destination = with_port(&flow.destination, flow.destination_port.as_deref());
    let security = if flow.secured_path { "Stop" } else { "Continue" };
    let mut line = format!(
        "{source} --> {destination} | {} | Security: {security}",
        flow.protocol
    );
    if let Some(pivot) = &flow.pivot {
        let _ = write!(line, " | Pivot: {pivot}");
    }
    let _ = writeln!(out, "{line}");

    if options.verbose {
        let _ = writeln!(
            out,
            "{}ttl: {} | fragment offset: {}{}",
            p.gray, flow.ttl, flow.fragment_offset, p.reset
        );
    }
}

fn with_port(address: &str, port: Option<&str>) -> String {
    match port {
        Some(port) => format!("{address}:{port}"),
        None => address.to_string(),
    }
}

/// Non-zero topic counts, then global events.
pub(crate) fn write_summary(out: &mut String, summary: &EventSummary, options: &RenderOptions) {
    let p = &options.palette;
    let _ = writeln!(out);
    let _ = writeln!(out, "{}Event summary{}", p.white_bold, p.reset);

    if summary.topics.is_empty() {
        let _ = writeln!(out, "  No summary information for this path");
    }
    for topic in &summary.topics {
        let counts = topic
            .counts
            .iter()
            .map(|count| {
                format!(
                    "{}{}{}: {}",
                    p.severity(count.severity),
                    count.severity.label(),
                    p.reset,
                    count.count
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "  {}: {counts}", topic.name);
    }

    for event in &summary.global {
        let _ = writeln!(
            out,
            "  {}{}{}",
            p.severity(event.severity),
            event.line(),
            p.reset
        );
    }
}

/// Outcome of the pivot lookup, when one was requested.
pub(crate) fn write_pivot(out: &mut String, pivot: &PivotResolution, options: &RenderOptions) {
    let p = &options.palette;
    match pivot {
        PivotResolution::NotRequested => {}
        PivotResolution::EntryPoint(entry) => {
            let sn = if entry.sn.is_empty() { "-" } else { &entry.sn };
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "{}INFO{} source enters the fabric at {} {} (sn {sn})",
                p.blue, p.reset, entry.hostname, entry.iface
            );
        }
        PivotResolution::NoTransit => {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "{}WARNING{} the pivot path never leaves the fabric; the pivot was not used",
                p.orange, p.reset
            );
        }
    }
}

/// Final verdict line.
pub(crate) fn write_verdict(out: &mut String, report: &PathReport, options: &RenderOptions) {
    let p = &options.palette;
    let tag = match report.verdict {
        Verdict::Allowed => p.tag_allowed,
        Verdict::Denied => p.tag_denied,
        Verdict::NoPath => p.gray,
    };
    let _ = writeln!(out);
    let _ = writeln!(out, "Verdict: {tag}{}{}", report.verdict, p.reset);
}

/// `✅ Green` with Unicode, `Green` otherwise.
pub(crate) fn severity_badge(severity: Severity, options: &RenderOptions) -> String {
    let p = &options.palette;
    if options.unicode {
        format!(
            "{} {}{}{}",
            severity.icon(),
            p.severity(severity),
            severity.label(),
            p.reset
        )
    } else {
        format!("{}{}{}", p.severity(severity), severity.label(), p.reset)
    }
}
