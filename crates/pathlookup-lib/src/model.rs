//! Serde model of the Pathlookup response document.
//!
//! The platform owns this schema; only the fields the renderer reads are
//! modelled and everything else is ignored. Edge and topic maps keep document
//! order because the first edge is the start of the path.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Error, Result};

/// Map a decode failure to parse (not JSON) or malformed (wrong shape).
pub(crate) fn decode_error(origin: &str, err: serde_json::Error) -> Error {
    if err.is_data() {
        Error::MalformedResponse {
            message: format!("{origin}: {err}"),
        }
    } else {
        Error::InputParse {
            origin: origin.to_string(),
            source: err,
        }
    }
}

/// Root of a Pathlookup response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathLookupResult {
    pub graph_result: GraphResult,
    pub pathlookup: PathLookup,
}

impl PathLookupResult {
    /// Parse a document, distinguishing invalid JSON from a wrong shape.
    ///
    /// Decodes straight from text: going through `serde_json::Value` would
    /// sort the edge map and lose the path start.
    pub fn parse(origin: &str, text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|err| decode_error(origin, err))
    }

    pub fn edges(&self) -> &IndexMap<String, Edge> {
        &self.graph_result.graph_data.edges
    }

    pub fn decisions(&self) -> &HashMap<String, DeviceDecisions> {
        &self.pathlookup.decisions
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphResult {
    pub graph_data: GraphData,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GraphData {
    pub edges: IndexMap<String, Edge>,
    #[serde(default)]
    pub nodes: HashMap<String, Node>,
}

/// A directed edge between two device interfaces.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    #[serde(default)]
    pub next_edge_ids: Vec<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub source_iface_name: Option<String>,
    #[serde(default)]
    pub target_iface_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub sn: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathLookup {
    pub decisions: HashMap<String, DeviceDecisions>,
    pub events_summary: EventsSummary,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct DeviceDecisions {
    #[serde(default)]
    pub traces: Vec<Trace>,
}

/// One forwarding decision of a device: the packet in, the packet out, and
/// the chain of processing steps in between.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trace {
    #[serde(default)]
    pub source_packet_id: Option<String>,
    #[serde(default)]
    pub target_packet_id: Option<String>,
    #[serde(default)]
    pub trace: Vec<TraceStep>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TraceStep {
    #[serde(default)]
    pub chain: String,
    #[serde(default)]
    pub events: Vec<TraceEvent>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceEvent {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub header_type: Option<String>,
    #[serde(default)]
    pub severity_info: Option<SeverityInfo>,
    #[serde(default)]
    pub deciding_policy_name: Option<String>,
}

impl TraceEvent {
    pub fn is_security(&self) -> bool {
        self.kind.contains("security")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SeverityInfo {
    pub severity: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventsSummary {
    pub topics: IndexMap<String, HashMap<String, u64>>,
    #[serde(default)]
    pub global: Vec<GlobalEvent>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GlobalEvent {
    pub name: String,
    #[serde(default)]
    pub details: Vec<String>,
    pub severity: i64,
}

/// Severity scale used by the platform for events and topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Green,
    Blue,
    Amber,
    Red,
    Unknown(i64),
}

impl Severity {
    /// Known severities in ascending order.
    pub const SCALE: [Severity; 4] = [
        Severity::Green,
        Severity::Blue,
        Severity::Amber,
        Severity::Red,
    ];

    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Severity::Green,
            10 => Severity::Blue,
            20 => Severity::Amber,
            30 => Severity::Red,
            other => Severity::Unknown(other),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Severity::Green => 0,
            Severity::Blue => 10,
            Severity::Amber => 20,
            Severity::Red => 30,
            Severity::Unknown(code) => code,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Green => "Green",
            Severity::Blue => "Blue",
            Severity::Amber => "Amber",
            Severity::Red => "Red",
            Severity::Unknown(_) => "Unknown",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Severity::Green => "✅",
            Severity::Blue => "🔵",
            Severity::Amber => "🟠",
            Severity::Red => "❌",
            Severity::Unknown(_) => "❓",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label().to_ascii_lowercase())
    }
}

/// A row of the platform's zone-firewall interface table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneFirewallInterface {
    pub hostname: String,
    pub int_name: String,
    #[serde(default)]
    pub zone: Vec<String>,
}

/// Zones bound to `interface` on `device`, joined with `/`.
pub fn find_zones(
    interfaces: &[ZoneFirewallInterface],
    device: &str,
    interface: &str,
) -> Option<String> {
    interfaces
        .iter()
        .find(|row| row.hostname == device && row.int_name == interface)
        .map(|row| row.zone.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(edges: &str) -> String {
        format!(
            r#"{{
                "graphResult": {{"graphData": {{"edges": {edges}, "nodes": {{}}}}}},
                "pathlookup": {{
                    "decisions": {{}},
                    "eventsSummary": {{"topics": {{}}, "global": []}}
                }}
            }}"#
        )
    }

    #[test]
    fn parse_distinguishes_bad_json_from_bad_shape() {
        let err = PathLookupResult::parse("capture.json", "{not json").unwrap_err();
        assert!(matches!(err, Error::InputParse { .. }));

        let err = PathLookupResult::parse("capture.json", r#"{"graphResult": {}}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { .. }));
    }

    #[test]
    fn parse_keeps_edge_order() {
        let text = document(
            r#"{
                "z-start": {"id": "z-start", "nextEdgeIds": ["a-next"]},
                "a-next": {"id": "a-next"}
            }"#,
        );
        let result = PathLookupResult::parse("capture.json", &text).unwrap();
        let keys: Vec<&str> = result.edges().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z-start", "a-next"]);
    }

    #[test]
    fn duplicate_edge_keys_keep_the_last_value() {
        let text = document(
            r#"{
                "a": {"id": "a", "nextEdgeIds": ["stale"]},
                "b": {"id": "b"},
                "a": {"id": "a", "nextEdgeIds": ["b"]}
            }"#,
        );
        let result = PathLookupResult::parse("capture.json", &text).unwrap();
        assert_eq!(result.edges().len(), 2);
        assert_eq!(result.edges().first().map(|(key, _)| key.as_str()), Some("a"));
        assert_eq!(result.edges()["a"].next_edge_ids, vec!["b".to_string()]);
    }

    #[test]
    fn severity_codes_map_to_scale() {
        assert_eq!(Severity::from_code(0), Severity::Green);
        assert_eq!(Severity::from_code(30), Severity::Red);
        assert_eq!(Severity::from_code(42), Severity::Unknown(42));
        assert_eq!(Severity::Amber.code(), 20);
    }

    #[test]
    fn find_zones_matches_device_and_interface() {
        let rows = vec![ZoneFirewallInterface {
            hostname: "fw-01".to_string(),
            int_name: "eth1".to_string(),
            zone: vec!["inside".to_string(), "trust".to_string()],
        }];
        assert_eq!(find_zones(&rows, "fw-01", "eth1").as_deref(), Some("inside/trust"));
        assert_eq!(find_zones(&rows, "fw-01", "eth2"), None);
    }
}
