//! Table renderer: one bordered row per displayed hop.

use std::fmt::Write as _;

use pathlookup_lib::{Hop, PathReport};

use super::narrative::write_edges;
use super::{severity_badge, write_header, write_pivot, write_summary, write_verdict, RenderOptions};
use crate::terminal::visible_width;

const COLUMNS: [&str; 7] = [
    "Ingress Interface",
    "Device",
    "Egress Interface",
    "Protocol",
    "Security",
    "Rule Chain",
    "ZoneFW",
];

/// Border glyphs for one drawing style.
struct Borders {
    top: [&'static str; 3],
    middle: [&'static str; 3],
    bottom: [&'static str; 3],
    horizontal: &'static str,
    vertical: &'static str,
}

const UNICODE_BORDERS: Borders = Borders {
    top: ["┌", "┬", "┐"],
    middle: ["├", "┼", "┤"],
    bottom: ["└", "┴", "┘"],
    horizontal: "─",
    vertical: "│",
};

const ASCII_BORDERS: Borders = Borders {
    top: ["+", "+", "+"],
    middle: ["+", "+", "+"],
    bottom: ["+", "+", "+"],
    horizontal: "-",
    vertical: "|",
};

/// Render the report with the hops as a table.
pub fn render_table(report: &PathReport, options: &RenderOptions) -> String {
    let mut out = String::new();
    write_header(&mut out, &report.flow, options);
    write_summary(&mut out, &report.summary, options);
    write_pivot(&mut out, &report.pivot, options);

    let rows: Vec<[String; 7]> = report.hops.iter().map(|hop| hop_cells(hop, options)).collect();
    let _ = writeln!(out);
    out.push_str(&build_table(&rows, options));

    write_verdict(&mut out, report, options);
    if let Some(edges) = &report.edges {
        write_edges(&mut out, edges, options);
    }
    out
}

fn hop_cells(hop: &Hop, options: &RenderOptions) -> [String; 7] {
    let p = &options.palette;
    let (security, policy, zones) = match &hop.security {
        Some(decision) => (
            severity_badge(decision.severity, options),
            decision.policy.clone(),
            decision.zones.clone().unwrap_or_default(),
        ),
        None => (String::new(), String::new(), String::new()),
    };
    [
        hop.ingress.clone(),
        format!("{}{}{}", p.cyan, hop.device, p.reset),
        hop.egress.clone(),
        format!("{}{}{}", p.green, hop.protocol, p.reset),
        security,
        policy,
        zones,
    ]
}

/// Lay out `rows` under the column headings.
pub(crate) fn build_table(rows: &[[String; 7]], options: &RenderOptions) -> String {
    let borders = if options.unicode {
        &UNICODE_BORDERS
    } else {
        &ASCII_BORDERS
    };

    let mut widths: [usize; 7] = COLUMNS.map(str::len);
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(visible_width(cell));
        }
    }

    let rule = |glyphs: [&str; 3]| {
        let segments: Vec<String> = widths
            .iter()
            .map(|width| borders.horizontal.repeat(width + 2))
            .collect();
        format!("{}{}{}\n", glyphs[0], segments.join(glyphs[1]), glyphs[2])
    };
    let line = |cells: &[String]| {
        let mut text = String::from(borders.vertical);
        for (cell, width) in cells.iter().zip(widths) {
            let padding = width - visible_width(cell);
            let _ = write!(text, " {cell}{} {}", " ".repeat(padding), borders.vertical);
        }
        text.push('\n');
        text
    };

    let heading: Vec<String> = COLUMNS.iter().map(|c| c.to_string()).collect();
    let mut out = rule(borders.top);
    out.push_str(&line(heading.as_slice()));
    out.push_str(&rule(borders.middle));
    for row in rows {
        out.push_str(&line(row.as_slice()));
    }
    out.push_str(&rule(borders.bottom));
    out
}
