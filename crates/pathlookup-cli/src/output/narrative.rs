//! Narrative renderer: one described entry per hop.

use std::fmt::Write as _;

use pathlookup_lib::{EdgeListing, Hop, PathOutcome, PathReport};

use super::{severity_badge, write_header, write_pivot, write_summary, write_verdict, RenderOptions};

/// Render the report as a hop-by-hop description.
pub fn render_narrative(report: &PathReport, options: &RenderOptions) -> String {
    let p = &options.palette;
    let mut out = String::new();
    write_header(&mut out, &report.flow, options);
    write_summary(&mut out, &report.summary, options);
    write_pivot(&mut out, &report.pivot, options);

    let _ = writeln!(out);
    let _ = writeln!(out, "{}Path{}", p.white_bold, p.reset);
    if !report.path_available {
        let _ = writeln!(out, "  No path returned by the platform");
    }
    for (position, hop) in report.hops.iter().enumerate() {
        write_hop(&mut out, position + 1, hop, options);
    }
    if let Some(outcome) = report.outcome {
        let text = match outcome {
            PathOutcome::Dropped => "flow dropped",
            PathOutcome::Accepted => "flow accepted",
        };
        let _ = writeln!(out, "  -> {text}");
    }
    if report.hidden_link_layer_hops > 0 {
        let plural = if report.hidden_link_layer_hops == 1 { "" } else { "s" };
        let _ = writeln!(
            out,
            "  {}({} link-layer hop{plural} hidden by l2 exclusion){}",
            p.gray, report.hidden_link_layer_hops, p.reset
        );
    }

    write_verdict(&mut out, report, options);
    if let Some(edges) = &report.edges {
        write_edges(&mut out, edges, options);
    }
    out
}

fn write_hop(out: &mut String, number: usize, hop: &Hop, options: &RenderOptions) {
    let p = &options.palette;
    let _ = write!(
        out,
        "  {number}. {}{}{} in: {} out: {} [{}]",
        p.white_bold, hop.device, p.reset, hop.ingress, hop.egress, hop.protocol
    );
    if let Some(decision) = &hop.security {
        let _ = write!(
            out,
            " {} {}",
            severity_badge(decision.severity, options),
            decision.policy
        );
        if let Some(zones) = &decision.zones {
            let _ = write!(out, " ({zones})");
        }
    }
    out.push('\n');

    if options.verbose {
        for event in &hop.events {
            let _ = write!(out, "       {}{}: {}", p.gray, event.chain, event.kind);
            if let Some(header) = &event.header_type {
                let _ = write!(out, " ({header})");
            }
            let _ = writeln!(out, "{}", p.reset);
        }
    }
}

/// Every edge of the graph, alternative egresses marked with a branch glyph.
pub(crate) fn write_edges(out: &mut String, edges: &[EdgeListing], options: &RenderOptions) {
    let p = &options.palette;
    let branch = if options.unicode { "└" } else { "`-" };
    let _ = writeln!(out);
    let _ = writeln!(out, "{}All edges{}", p.white_bold, p.reset);
    for edge in edges {
        if edge.branch {
            let _ = writeln!(out, "  {}{branch}{} {}", p.gray, p.reset, edge.text);
        } else {
            let _ = writeln!(out, "  {}", edge.text);
        }
    }
}
