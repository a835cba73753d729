//! Presentation-ready summary of one lookup.
//!
//! A [`PathReport`] is built once from the request and the fetched result and
//! holds everything the renderers print, so rendering is a pure function of
//! the report.

use serde::Serialize;

use crate::analysis::{analyze_path, Hop, Verdict};
use crate::lookup::LookupOutcome;
use crate::model::{EventsSummary, Severity};
use crate::path::{follow_first_path, list_all_edges, EdgeListing, PathOutcome};
use crate::pivot::PivotResolution;
use crate::request::{PathLookupRequest, Protocol};

/// Display toggles that change the report's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReportOptions {
    pub l2_exclusion: bool,
    pub all_edges: bool,
}

/// The flow that was looked up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowSummary {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_port: Option<String>,
    pub destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_port: Option<String>,
    pub protocol: Protocol,
    pub secured_path: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pivot: Option<String>,
    pub ttl: u8,
    pub fragment_offset: u16,
}

impl FlowSummary {
    fn from_request(request: &PathLookupRequest) -> Self {
        let (source_port, destination_port) = match &request.ports {
            Some(ports) => (
                Some(ports.source.to_string()),
                Some(ports.destination.to_string()),
            ),
            None => (None, None),
        };
        Self {
            source: request.source.to_string(),
            source_port,
            destination: request.destination.to_string(),
            destination_port,
            protocol: request.protocol,
            secured_path: request.secured_path,
            pivot: request.pivot.map(|pivot| pivot.to_string()),
            ttl: request.ttl,
            fragment_offset: request.fragment_offset,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeverityCount {
    pub severity: Severity,
    pub count: u64,
}

/// Non-zero severity counts of one summary topic (ACL, NAT44, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicSummary {
    pub name: String,
    pub counts: Vec<SeverityCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlobalSummary {
    pub name: String,
    pub details: Vec<String>,
    pub severity: Severity,
}

impl GlobalSummary {
    /// `name | detail | ... | severity`
    pub fn line(&self) -> String {
        let mut parts = Vec::with_capacity(self.details.len() + 2);
        parts.push(self.name.clone());
        parts.extend(self.details.iter().cloned());
        parts.push(self.severity.code().to_string());
        parts.join(" | ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventSummary {
    /// Only topics with at least one non-zero count.
    pub topics: Vec<TopicSummary>,
    pub global: Vec<GlobalSummary>,
}

impl EventSummary {
    fn from_events(events: &EventsSummary) -> Self {
        let topics = events
            .topics
            .iter()
            .filter_map(|(name, counts)| {
                let counts: Vec<SeverityCount> = Severity::SCALE
                    .iter()
                    .filter_map(|severity| {
                        let count = counts
                            .get(&severity.code().to_string())
                            .copied()
                            .unwrap_or(0);
                        (count != 0).then_some(SeverityCount {
                            severity: *severity,
                            count,
                        })
                    })
                    .collect();
                (!counts.is_empty()).then(|| TopicSummary {
                    name: name.to_string(),
                    counts,
                })
            })
            .collect();

        let global = events
            .global
            .iter()
            .map(|event| GlobalSummary {
                name: event.name.clone(),
                details: event.details.clone(),
                severity: Severity::from_code(event.severity),
            })
            .collect();

        Self { topics, global }
    }
}

/// Everything shown for one lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathReport {
    pub flow: FlowSummary,
    pub summary: EventSummary,
    pub pivot: PivotResolution,
    /// `false` when the platform returned no edges at all.
    pub path_available: bool,
    /// Hops to display, with link-layer hops removed under l2 exclusion.
    pub hops: Vec<Hop>,
    pub hidden_link_layer_hops: usize,
    pub l2_exclusion: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<PathOutcome>,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edges: Option<Vec<EdgeListing>>,
}

impl PathReport {
    pub fn build(
        request: &PathLookupRequest,
        outcome: &LookupOutcome,
        options: ReportOptions,
    ) -> Self {
        let edges = outcome.result.edges();
        let path = follow_first_path(edges);
        let analysis = analyze_path(&path, outcome.result.decisions(), &outcome.zone_firewall);

        let (visible, hidden) = analysis.visible_hops(options.l2_exclusion);
        let hops = visible.into_iter().cloned().collect();

        Self {
            flow: FlowSummary::from_request(request),
            summary: EventSummary::from_events(&outcome.result.pathlookup.events_summary),
            pivot: outcome.pivot.clone(),
            path_available: !edges.is_empty(),
            hops,
            hidden_link_layer_hops: hidden,
            l2_exclusion: options.l2_exclusion,
            outcome: analysis.outcome,
            verdict: analysis.verdict,
            edges: options.all_edges.then(|| list_all_edges(edges)),
        }
    }

    /// No edges and no pivot: there is nothing to walk or explain.
    pub fn nothing_to_display(&self) -> bool {
        !self.path_available && self.pivot == PivotResolution::NotRequested
    }
}
