//! Pivot handling: find where the source address enters the fabric by looking
//! up the path from a pivot address towards the source.

use serde::Serialize;

use crate::model::PathLookupResult;
use crate::path::{hostname_of, is_transit};

/// Device interface where a flow enters the fabric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryPoint {
    pub sn: String,
    pub iface: String,
    pub hostname: String,
}

/// What the pivot lookup told us about the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PivotResolution {
    /// No pivot was requested.
    NotRequested,
    /// The source connects at this entry point.
    EntryPoint(EntryPoint),
    /// The pivot path never transits towards the source; the main lookup
    /// falls back to automatic first-hop selection.
    NoTransit,
}

/// Extract the entry point from a pivot lookup: the first edge in document
/// order that transits out of the fabric.
pub fn entry_point_from_pivot(result: &PathLookupResult) -> Option<EntryPoint> {
    let graph = &result.graph_result.graph_data;
    let (key, edge) = graph.edges.iter().find(|(key, _)| is_transit(key))?;

    let endpoint = key.split('@').next().unwrap_or_default();
    let hostname = hostname_of(endpoint).to_string();
    let sn = edge
        .source
        .as_deref()
        .and_then(|device| graph.nodes.get(device))
        .and_then(|node| node.sn.clone())
        .unwrap_or_default();

    Some(EntryPoint {
        sn,
        iface: edge.source_iface_name.clone().unwrap_or_default(),
        hostname,
    })
}
