//! Turn a walked path into display hops with protocol, security decision and
//! overall verdict.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tracing::warn;

use crate::model::{find_zones, DeviceDecisions, Severity, TraceStep, ZoneFirewallInterface};
use crate::path::{vdevice_prefix, EdgeId, EdgeTarget, Endpoint, PathOutcome};

/// Header types checked in priority order when labelling a hop's protocol.
const HEADER_TYPES: [&str; 7] = ["vxlan", "capwap", "gre", "esp", "mpls", "ip", "fp"];
/// Protocols considered link-layer for the l2 exclusion filter.
const LINK_LAYER_PROTOCOLS: [&str; 2] = ["l2", "fp"];
const SWITCHING_CHAIN: &str = "switching-nexthop";
const NO_PROTOCOL: &str = "n/a";

/// Security rule matched on a hop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityDecision {
    pub severity: Severity,
    pub policy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zones: Option<String>,
}

impl SecurityDecision {
    pub fn is_deny(&self) -> bool {
        self.severity == Severity::Red
    }
}

/// One event from a hop's traces, kept for verbose output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HopEvent {
    pub chain: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_type: Option<String>,
}

/// A device on the displayed path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hop {
    pub index: usize,
    pub ingress: String,
    pub device: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    pub egress: String,
    pub protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<SecurityDecision>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<HopEvent>,
}

impl Hop {
    /// Switching hops that carry no security decision.
    pub fn is_link_layer(&self) -> bool {
        LINK_LAYER_PROTOCOLS.contains(&self.protocol.as_str()) && self.security.is_none()
    }
}

/// Overall outcome of the displayed path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Allowed,
    Denied,
    NoPath,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Allowed => "allowed",
            Verdict::Denied => "denied",
            Verdict::NoPath => "no path",
        })
    }
}

/// Hops of one path plus how it ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathAnalysis {
    pub hops: Vec<Hop>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<PathOutcome>,
    pub verdict: Verdict,
}

impl PathAnalysis {
    /// Hops to display, and how many link-layer hops were hidden.
    pub fn visible_hops(&self, l2_exclusion: bool) -> (Vec<&Hop>, usize) {
        if !l2_exclusion {
            return (self.hops.iter().collect(), 0);
        }
        let visible: Vec<&Hop> = self.hops.iter().filter(|hop| !hop.is_link_layer()).collect();
        let hidden = self.hops.len() - visible.len();
        (visible, hidden)
    }
}

/// Build display hops for `path`.
///
/// The first row is the source device of the first edge; every edge then
/// contributes its target device, whose egress is the source interface of the
/// following edge. A `dropped`/`accepted` target ends the hop list.
pub fn analyze_path(
    path: &[String],
    decisions: &HashMap<String, DeviceDecisions>,
    zone_firewall: &[ZoneFirewallInterface],
) -> PathAnalysis {
    let mut hops = Vec::new();
    let mut outcome = None;
    let parsed: Vec<EdgeId> = path.iter().map(|id| EdgeId::parse(id)).collect();

    for (row, (edge_id, edge)) in path.iter().zip(&parsed).enumerate() {
        if row == 0 {
            let device_id = edge
                .source
                .device_id
                .clone()
                .or_else(|| vdevice_prefix(edge_id));
            let egress = edge.source.interface_or_dash().to_string();
            hops.push(build_hop(
                hops.len(),
                "-".to_string(),
                &edge.source,
                device_id,
                egress,
                edge_id,
                decisions,
                zone_firewall,
            ));
        }

        match &edge.target {
            Some(EdgeTarget::Terminal(end)) => {
                outcome = Some(*end);
                break;
            }
            Some(EdgeTarget::Device(target)) => {
                let egress = match parsed.get(row + 1) {
                    Some(next) => {
                        if next.source.name != target.name {
                            warn!(
                                expected = %target.name,
                                found = %next.source.name,
                                "consecutive edges do not share a device"
                            );
                        }
                        next.source.interface_or_dash().to_string()
                    }
                    None => "-".to_string(),
                };
                hops.push(build_hop(
                    hops.len(),
                    target.interface_or_dash().to_string(),
                    target,
                    target.device_id.clone(),
                    egress,
                    edge_id,
                    decisions,
                    zone_firewall,
                ));
            }
            None => {}
        }
    }

    let verdict = if path.is_empty() {
        Verdict::NoPath
    } else if outcome == Some(PathOutcome::Dropped)
        || hops
            .iter()
            .any(|hop| hop.security.as_ref().is_some_and(SecurityDecision::is_deny))
    {
        Verdict::Denied
    } else {
        Verdict::Allowed
    };

    PathAnalysis {
        hops,
        outcome,
        verdict,
    }
}

#[allow(clippy::too_many_arguments)]
fn build_hop(
    index: usize,
    ingress: String,
    endpoint: &Endpoint,
    device_id: Option<String>,
    egress: String,
    edge_id: &str,
    decisions: &HashMap<String, DeviceDecisions>,
    zone_firewall: &[ZoneFirewallInterface],
) -> Hop {
    let steps = device_id
        .as_deref()
        .map(|id| trace_steps(decisions, id, edge_id))
        .unwrap_or_default();

    let protocol = if device_id.is_some() {
        detect_protocol(&steps)
    } else {
        "-".to_string()
    };

    let security = steps
        .iter()
        .flat_map(|step| step.events.iter())
        .find(|event| event.is_security())
        .map(|event| SecurityDecision {
            severity: event
                .severity_info
                .map(|info| Severity::from_code(info.severity))
                .unwrap_or(Severity::Unknown(-1)),
            policy: event
                .deciding_policy_name
                .clone()
                .unwrap_or_else(|| "-".to_string()),
            zones: find_zones(zone_firewall, &endpoint.name, &egress),
        });

    let events = steps
        .iter()
        .flat_map(|step| {
            step.events.iter().map(move |event| HopEvent {
                chain: step.chain.clone(),
                kind: event.kind.clone(),
                header_type: event.header_type.clone(),
            })
        })
        .collect();

    Hop {
        index,
        ingress,
        device: endpoint.name.clone(),
        device_id,
        egress,
        protocol,
        security,
        events,
    }
}

/// Trace steps of `device_id` for the packet carried by `edge_id`: traces
/// that start from it, else traces that produce it.
fn trace_steps<'a>(
    decisions: &'a HashMap<String, DeviceDecisions>,
    device_id: &str,
    edge_id: &str,
) -> Vec<&'a TraceStep> {
    let Some(device) = decisions.get(device_id) else {
        return Vec::new();
    };

    let matching = |pick: fn(&crate::model::Trace) -> Option<&str>| {
        device
            .traces
            .iter()
            .filter(|trace| pick(trace) == Some(edge_id))
            .flat_map(|trace| trace.trace.iter())
            .collect::<Vec<_>>()
    };

    let by_source = matching(|trace| trace.source_packet_id.as_deref());
    if !by_source.is_empty() {
        return by_source;
    }
    matching(|trace| trace.target_packet_id.as_deref())
}

fn detect_protocol(steps: &[&TraceStep]) -> String {
    if steps.iter().any(|step| step.chain == SWITCHING_CHAIN) {
        return "l2".to_string();
    }
    let headers: Vec<&str> = steps
        .iter()
        .flat_map(|step| step.events.iter())
        .filter_map(|event| event.header_type.as_deref())
        .collect();
    HEADER_TYPES
        .iter()
        .find(|header| headers.contains(header))
        .map_or_else(|| NO_PROTOCOL.to_string(), |header| header.to_string())
}
