//! Edge id parsing and path walking over the Pathlookup edge graph.
//!
//! Edge ids look like `vDevice/1!core-01@Gi0/1--vDevice/2!fw-01@eth1--#0`:
//! components separated by `--`, the first two being endpoints of the form
//! `<deviceId>!<hostname>@<interface>`.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::model::Edge;

const COMPONENT_SEPARATOR: &str = "--";
const MULTIPLE_EGRESS_SUFFIX: &str = "multiple-egress";
const TRANSIT_MARKER: &str = "--transit";
const VDEVICE_PREFIX: &str = "vDevice/";

/// Where a flow ends when it leaves the modelled devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PathOutcome {
    Dropped,
    Accepted,
}

impl PathOutcome {
    fn from_component(component: &str) -> Option<Self> {
        match component {
            "dropped" => Some(PathOutcome::Dropped),
            "accepted" => Some(PathOutcome::Accepted),
            _ => None,
        }
    }
}

/// A device interface named by one component of an edge id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub device_id: Option<String>,
    pub name: String,
    pub interface: Option<String>,
}

impl Endpoint {
    pub fn parse(component: &str) -> Self {
        let (device_id, rest) = split_device_id(component);
        let (name, interface) = match rest.split_once('@') {
            Some((name, interface)) => (name.to_string(), Some(interface.to_string())),
            None => (rest.to_string(), None),
        };
        Self {
            device_id,
            name,
            interface,
        }
    }

    /// Interface name, or `-` when the component carries none.
    pub fn interface_or_dash(&self) -> &str {
        self.interface.as_deref().unwrap_or("-")
    }
}

/// Split `vDevice/1!core-01@Gi0/1` into the device id and the remainder.
fn split_device_id(component: &str) -> (Option<String>, &str) {
    match component.split_once('!') {
        Some((id, rest)) => (Some(id.to_string()), rest),
        None => (None, component),
    }
}

/// Hostname portion of an endpoint component (no device id, no interface).
pub fn hostname_of(component: &str) -> &str {
    let (_, rest) = split_device_id(component);
    rest.split_once('@').map_or(rest, |(name, _)| name)
}

/// The far side of an edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeTarget {
    Device(Endpoint),
    Terminal(PathOutcome),
}

/// A parsed edge id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeId {
    pub source: Endpoint,
    pub target: Option<EdgeTarget>,
}

impl EdgeId {
    pub fn parse(raw: &str) -> Self {
        let mut components = raw.split(COMPONENT_SEPARATOR);
        let source = Endpoint::parse(components.next().unwrap_or_default());
        let target = components.next().map(|component| {
            PathOutcome::from_component(component)
                .map(EdgeTarget::Terminal)
                .unwrap_or_else(|| EdgeTarget::Device(Endpoint::parse(component)))
        });
        Self { source, target }
    }
}

/// `true` for edges leaving the fabric towards an unmodelled host.
pub fn is_transit(edge_id: &str) -> bool {
    edge_id.contains(TRANSIT_MARKER)
}

/// The `vDevice/<n>` prefix of an edge id, used when the first endpoint has
/// no explicit device id.
pub fn vdevice_prefix(edge_id: &str) -> Option<String> {
    let start = edge_id.find(VDEVICE_PREFIX)?;
    let digits: String = edge_id[start + VDEVICE_PREFIX.len()..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    if digits.is_empty() {
        None
    } else {
        Some(format!("{VDEVICE_PREFIX}{digits}"))
    }
}

/// Walk the graph from its first edge, always taking the first successor.
///
/// A successor missing from the edge map ends the walk; it is still added,
/// with its hostname restored from the previous edge (see
/// [`restore_hostname`]). An edge visited twice also ends the walk.
pub fn follow_first_path(edges: &IndexMap<String, Edge>) -> Vec<String> {
    let Some((_, first)) = edges.first() else {
        return Vec::new();
    };

    let mut path = vec![first.id.clone()];
    let mut seen = HashSet::from([first.id.clone()]);
    let mut current = first;

    while let Some(next_id) = current.next_edge_ids.first() {
        match edges.get(next_id) {
            Some(next) => {
                if !seen.insert(next.id.clone()) {
                    warn!(edge = %next.id, "edge graph loops back; stopping path walk");
                    break;
                }
                path.push(next.id.clone());
                current = next;
            }
            None => {
                let restored = restore_hostname(current, next_id);
                debug!(edge = %restored, "successor not in edge map; ending path walk");
                path.push(restored);
                break;
            }
        }
    }

    path
}

/// Successor ids outside the edge map may lack the hostname
/// (`vDevice/3@eth2--dropped--#0`). Copy it from the previous edge id, which
/// names the same device as its target.
pub fn restore_hostname(previous: &Edge, next_id: &str) -> String {
    if next_id.contains('!') {
        return next_id.to_string();
    }
    let device_id = next_id.split('@').next().unwrap_or_default();
    if device_id.is_empty() {
        return next_id.to_string();
    }
    let marker = format!("{device_id}!");
    let hostname = previous
        .id
        .split_once(&marker)
        .map(|(_, rest)| rest.split('@').next().unwrap_or_default());

    match hostname {
        Some(hostname) if !hostname.is_empty() => {
            next_id.replacen(device_id, &format!("{device_id}!{hostname}"), 1)
        }
        _ => next_id.to_string(),
    }
}

/// One line of the all-edges listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeListing {
    pub text: String,
    /// Alternative egress of the device listed just above.
    pub branch: bool,
}

/// List every edge reachable in the graph once, in walk order, marking the
/// successors of edges with several egress options.
pub fn list_all_edges(edges: &IndexMap<String, Edge>) -> Vec<EdgeListing> {
    let Some((_, first)) = edges.first() else {
        return Vec::new();
    };

    let mut ids = vec![first.id.clone()];
    for edge in edges.values() {
        match edge.next_edge_ids.as_slice() {
            [] => {}
            [single] => ids.push(single.clone()),
            several => ids.extend(
                several
                    .iter()
                    .map(|id| format!("{id}{COMPONENT_SEPARATOR}{MULTIPLE_EGRESS_SUFFIX}")),
            ),
        }
    }

    let mut seen = HashSet::new();
    let mut listing = Vec::new();
    let mut previous_device = String::new();
    for id in ids {
        let text = id
            .split(COMPONENT_SEPARATOR)
            .map(|component| split_device_id(component).1)
            .collect::<Vec<_>>()
            .join(COMPONENT_SEPARATOR);
        if !seen.insert(text.clone()) {
            continue;
        }
        let device = text.split('@').next().unwrap_or_default().to_string();
        let branch = device == previous_device && text.ends_with(MULTIPLE_EGRESS_SUFFIX);
        previous_device = device;
        listing.push(EdgeListing { text, branch });
    }
    listing
}
