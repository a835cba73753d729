// Test utilities used across `pathlookup-cli` unit tests.
// Kept under `#[cfg(test)]` so it is not part of the public crate API.
use pathlookup_lib::analysis::HopEvent;
use pathlookup_lib::report::{EventSummary, FlowSummary};
use pathlookup_lib::{
    Hop, PathOutcome, PathReport, PivotResolution, Protocol, SecurityDecision, Severity, Verdict,
};

/// Builder for a `Hop` with sensible defaults.
pub struct HopBuilder {
    hop: Hop,
}

impl HopBuilder {
    pub fn new(device: &str) -> Self {
        Self {
            hop: Hop {
                index: 0,
                ingress: "-".to_string(),
                device: device.to_string(),
                device_id: None,
                egress: "-".to_string(),
                protocol: "ip".to_string(),
                security: None,
                events: Vec::new(),
            },
        }
    }

    pub fn ingress(mut self, iface: &str) -> Self {
        self.hop.ingress = iface.to_string();
        self
    }

    pub fn egress(mut self, iface: &str) -> Self {
        self.hop.egress = iface.to_string();
        self
    }

    pub fn security(mut self, severity: Severity, policy: &str) -> Self {
        self.hop.security = Some(SecurityDecision {
            severity,
            policy: policy.to_string(),
            zones: None,
        });
        self
    }

    pub fn zones(mut self, zones: &str) -> Self {
        if let Some(decision) = self.hop.security.as_mut() {
            decision.zones = Some(zones.to_string());
        }
        self
    }

    pub fn event(mut self, chain: &str, kind: &str, header_type: Option<&str>) -> Self {
        self.hop.events.push(HopEvent {
            chain: chain.to_string(),
            kind: kind.to_string(),
            header_type: header_type.map(str::to_string),
        });
        self
    }

    pub fn build(self) -> Hop {
        self.hop
    }
}

/// Builder for a `PathReport` around an icmp flow.
pub struct ReportBuilder {
    report: PathReport,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self {
            report: PathReport {
                flow: FlowSummary {
                    source: "10.0.0.1".to_string(),
                    source_port: None,
                    destination: "10.0.1.1".to_string(),
                    destination_port: None,
                    protocol: Protocol::Icmp,
                    secured_path: false,
                    pivot: None,
                    ttl: 128,
                    fragment_offset: 0,
                },
                summary: EventSummary {
                    topics: Vec::new(),
                    global: Vec::new(),
                },
                pivot: PivotResolution::NotRequested,
                path_available: true,
                hops: Vec::new(),
                hidden_link_layer_hops: 0,
                l2_exclusion: false,
                outcome: None,
                verdict: Verdict::Allowed,
                edges: None,
            },
        }
    }

    pub fn hop(mut self, mut hop: Hop) -> Self {
        hop.index = self.report.hops.len();
        self.report.hops.push(hop);
        self
    }

    pub fn hidden(mut self, count: usize) -> Self {
        self.report.hidden_link_layer_hops = count;
        self.report.l2_exclusion = true;
        self
    }

    pub fn outcome(mut self, outcome: PathOutcome) -> Self {
        self.report.outcome = Some(outcome);
        self
    }

    pub fn verdict(mut self, verdict: Verdict) -> Self {
        self.report.verdict = verdict;
        self
    }

    pub fn build(self) -> PathReport {
        self.report
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}
