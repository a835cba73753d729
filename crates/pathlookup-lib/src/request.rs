//! Lookup arguments, their validation, and the unicast parameters sent to the
//! platform.
//!
//! Callers collect raw strings in [`LookupArgs`] and turn them into a
//! [`PathLookupRequest`] with [`LookupArgs::validate`]. Every problem is
//! reported as [`Error::InvalidInput`] before any client is built, so an
//! invalid request can never reach the network.

use std::fmt;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::str::FromStr;

use ipnetwork::Ipv4Network;
use serde::{Serialize, Serializer};
use tracing::warn;

use crate::error::{Error, Result};
use crate::pivot::EntryPoint;

/// Default TTL for synthetic packets.
pub const DEFAULT_TTL: u16 = 128;
/// Default source port for TCP/UDP flows.
pub const DEFAULT_SOURCE_PORT: &str = "1024";
/// Largest valid IPv4 fragment offset (13 bits).
pub const MAX_FRAGMENT_OFFSET: u16 = 8191;

/// IP protocol carried by the synthetic flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
    #[default]
    Icmp,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Icmp => "icmp",
        }
    }

    /// Whether source and destination ports apply to this protocol.
    pub fn uses_ports(self) -> bool {
        matches!(self, Protocol::Tcp | Protocol::Udp)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            "icmp" => Ok(Protocol::Icmp),
            other => Err(Error::invalid_input(
                "protocol",
                format!("'{other}' is not one of tcp, udp, icmp"),
            )),
        }
    }
}

/// An IPv4 host address or network, as accepted by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpTarget(Ipv4Network);

impl IpTarget {
    /// Parse an address (`10.0.0.1`) or a network (`10.0.0.0/24`).
    ///
    /// Networks with host bits set (`10.0.0.1/24`) are rejected.
    pub fn parse(field: &str, raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_input(field, "an IPv4 address is required"));
        }
        let invalid = |detail: String| {
            Error::invalid_input(
                field,
                format!("'{trimmed}' is not a valid IPv4 address: {detail}"),
            )
        };
        // Ipv4Network's own parser accepts abbreviated forms like `10.0.0`;
        // the address part must be a full dotted quad.
        let (address, prefix) = match trimmed.split_once('/') {
            Some((address, prefix)) => (
                address,
                prefix
                    .parse::<u8>()
                    .map_err(|err| invalid(format!("bad prefix length: {err}")))?,
            ),
            None => (trimmed, 32),
        };
        let address = address
            .parse::<Ipv4Addr>()
            .map_err(|err| invalid(err.to_string()))?;
        let network = Ipv4Network::new(address, prefix).map_err(|err| invalid(err.to_string()))?;
        if network.ip() != network.network() {
            return Err(Error::invalid_input(
                field,
                format!("'{trimmed}' has host bits set"),
            ));
        }
        Ok(Self(network))
    }

    /// `true` when the target covers more than a single host.
    pub fn is_subnet(&self) -> bool {
        self.0.prefix() < 32
    }

    pub fn network(&self) -> Ipv4Network {
        self.0
    }
}

impl fmt::Display for IpTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_subnet() {
            write!(f, "{}/{}", self.0.ip(), self.0.prefix())
        } else {
            write!(f, "{}", self.0.ip())
        }
    }
}

impl Serialize for IpTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A single port or an inclusive range of ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortRange {
    Single(u16),
    Range(u16, u16),
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortRange::Single(port) => write!(f, "{port}"),
            PortRange::Range(low, high) => write!(f, "{low}-{high}"),
        }
    }
}

/// Comma-separated list of ports and ranges, e.g. `80,443,8000-8080`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSpec(Vec<PortRange>);

impl PortSpec {
    pub fn parse(field: &str, raw: &str) -> Result<Self> {
        let mut ranges = Vec::new();
        for token in raw.split(',').map(str::trim) {
            if token.is_empty() {
                return Err(Error::invalid_input(
                    field,
                    format!("'{raw}' contains an empty port entry"),
                ));
            }
            let range = match token.split_once('-') {
                Some((low, high)) => {
                    let low = parse_port(field, low)?;
                    let high = parse_port(field, high)?;
                    if low > high {
                        return Err(Error::invalid_input(
                            field,
                            format!("range '{token}' is reversed"),
                        ));
                    }
                    PortRange::Range(low, high)
                }
                None => PortRange::Single(parse_port(field, token)?),
            };
            ranges.push(range);
        }
        Ok(Self(ranges))
    }

    pub fn ranges(&self) -> &[PortRange] {
        &self.0
    }
}

fn parse_port(field: &str, raw: &str) -> Result<u16> {
    raw.trim().parse::<u16>().map_err(|_| {
        Error::invalid_input(field, format!("'{raw}' is not a port between 0 and 65535"))
    })
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|range| range.to_string())
            .collect::<Vec<_>>()
            .join(",");
        f.write_str(&joined)
    }
}

impl Serialize for PortSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Raw lookup arguments as collected from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupArgs {
    pub source: String,
    pub destination: String,
    pub protocol: Protocol,
    pub source_port: Option<String>,
    pub destination_port: Option<String>,
    pub ttl: u16,
    pub fragment_offset: u16,
    pub secured_path: bool,
    pub pivot: Option<String>,
    pub file: Option<PathBuf>,
}

impl Default for LookupArgs {
    fn default() -> Self {
        Self {
            source: String::new(),
            destination: String::new(),
            protocol: Protocol::default(),
            source_port: None,
            destination_port: None,
            ttl: DEFAULT_TTL,
            fragment_offset: 0,
            secured_path: false,
            pivot: None,
            file: None,
        }
    }
}

impl LookupArgs {
    /// Validate the raw arguments into a request.
    pub fn validate(&self) -> Result<PathLookupRequest> {
        let source = IpTarget::parse("source IP", &self.source)?;
        let destination = IpTarget::parse("destination IP", &self.destination)?;
        let pivot = self
            .pivot
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| IpTarget::parse("pivot IP", raw))
            .transpose()?;

        if pivot.is_some() && self.file.is_some() {
            return Err(Error::invalid_input(
                "pivot IP",
                "--pivot needs a live lookup and cannot be combined with --file",
            ));
        }

        let ttl = u8::try_from(self.ttl).map_err(|_| {
            Error::invalid_input("ttl", format!("{} is not between 0 and 255", self.ttl))
        })?;
        if self.fragment_offset > MAX_FRAGMENT_OFFSET {
            return Err(Error::invalid_input(
                "fragment offset",
                format!(
                    "{} is not between 0 and {MAX_FRAGMENT_OFFSET}",
                    self.fragment_offset
                ),
            ));
        }

        let ports = if self.protocol.uses_ports() {
            let destination = self.destination_port.as_deref().ok_or_else(|| {
                Error::invalid_input(
                    "destination port",
                    format!("a destination port is required for {}", self.protocol),
                )
            })?;
            let source = self.source_port.as_deref().unwrap_or(DEFAULT_SOURCE_PORT);
            Some(FlowPorts {
                source: PortSpec::parse("source port", source)?,
                destination: PortSpec::parse("destination port", destination)?,
            })
        } else {
            if self.source_port.is_some() || self.destination_port.is_some() {
                warn!(
                    protocol = %self.protocol,
                    "ports are ignored for this protocol"
                );
            }
            None
        };

        Ok(PathLookupRequest {
            source,
            destination,
            protocol: self.protocol,
            ports,
            ttl,
            fragment_offset: self.fragment_offset,
            secured_path: self.secured_path,
            pivot,
            file: self.file.clone(),
        })
    }
}

/// Source and destination ports of a TCP/UDP flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowPorts {
    pub source: PortSpec,
    pub destination: PortSpec,
}

/// A validated path lookup request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathLookupRequest {
    pub source: IpTarget,
    pub destination: IpTarget,
    pub protocol: Protocol,
    /// `None` for ICMP.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ports: Option<FlowPorts>,
    pub ttl: u8,
    pub fragment_offset: u16,
    pub secured_path: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pivot: Option<IpTarget>,
    #[serde(skip)]
    pub file: Option<PathBuf>,
}

impl PathLookupRequest {
    /// The lookup used to find where the source connects: pivot towards
    /// source, same flow, security path disabled.
    pub fn pivot_request(&self) -> Option<PathLookupRequest> {
        let pivot = self.pivot?;
        Some(PathLookupRequest {
            source: pivot,
            destination: self.source,
            secured_path: false,
            pivot: None,
            file: None,
            ..self.clone()
        })
    }

    /// Build the platform's unicast parameters for this request.
    pub fn unicast(&self, first_hop: FirstHopAlgorithm) -> UnicastParameters {
        let l4_options = match (self.protocol, &self.ports) {
            (Protocol::Tcp, Some(ports)) => L4Options::Tcp {
                src_ports: ports.source.to_string(),
                dst_ports: ports.destination.to_string(),
                flags: Vec::new(),
            },
            (Protocol::Udp, Some(ports)) => L4Options::Udp {
                src_ports: ports.source.to_string(),
                dst_ports: ports.destination.to_string(),
            },
            _ => L4Options::Icmp {
                icmp_type: ICMP_ECHO_REQUEST,
                code: 0,
            },
        };

        UnicastParameters {
            kind: "pathLookup",
            path_lookup_type: "unicast",
            protocol: self.protocol,
            network_mode: self.source.is_subnet() || self.destination.is_subnet(),
            secured_path: self.secured_path,
            enable_regions: false,
            src_regions: ".*",
            dst_regions: ".*",
            l4_options,
            ttl: self.ttl,
            fragment_offset: self.fragment_offset,
            other_options: OtherOptions {
                applications: ".*",
                tracked: false,
            },
            first_hop_algorithm: first_hop,
            starting_point: self.source.to_string(),
            destination_point: self.destination.to_string(),
        }
    }
}

const ICMP_ECHO_REQUEST: u8 = 8;

/// How the platform picks the first hop of the simulated flow.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FirstHopAlgorithm {
    #[default]
    Automatic,
    UserDefined {
        #[serde(rename = "entryPoints")]
        entry_points: Vec<EntryPoint>,
    },
}

/// Layer-4 options of the unicast request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum L4Options {
    #[serde(rename_all = "camelCase")]
    Tcp {
        src_ports: String,
        dst_ports: String,
        flags: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    Udp { src_ports: String, dst_ports: String },
    Icmp {
        #[serde(rename = "type")]
        icmp_type: u8,
        code: u8,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OtherOptions {
    pub applications: &'static str,
    pub tracked: bool,
}

/// Body of the `parameters` field of a unicast graph request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnicastParameters {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub path_lookup_type: &'static str,
    pub protocol: Protocol,
    pub network_mode: bool,
    pub secured_path: bool,
    pub enable_regions: bool,
    pub src_regions: &'static str,
    pub dst_regions: &'static str,
    pub l4_options: L4Options,
    pub ttl: u8,
    pub fragment_offset: u16,
    pub other_options: OtherOptions,
    pub first_hop_algorithm: FirstHopAlgorithm,
    pub starting_point: String,
    pub destination_point: String,
}
