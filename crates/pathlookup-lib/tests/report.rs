mod common;

use pathlookup_lib::pivot::PivotResolution;
use pathlookup_lib::{
    LookupArgs, LookupOutcome, PathLookupRequest, PathOutcome, PathReport, ReportOptions,
    Severity, Verdict, ZoneFirewallInterface,
};

use common::load_fixture;

fn request() -> PathLookupRequest {
    LookupArgs {
        source: "10.0.0.10".to_string(),
        destination: "10.2.0.20".to_string(),
        ..LookupArgs::default()
    }
    .validate()
    .expect("valid request")
}

fn outcome(fixture: &str) -> LookupOutcome {
    LookupOutcome {
        result: load_fixture(fixture),
        pivot: PivotResolution::NotRequested,
        zone_firewall: Vec::new(),
    }
}

fn devices(report: &PathReport) -> Vec<&str> {
    report.hops.iter().map(|hop| hop.device.as_str()).collect()
}

#[test]
fn l2_exclusion_hides_switching_hop_and_reports_denied() {
    let report = PathReport::build(
        &request(),
        &outcome("pathlookup_l2_denied.json"),
        ReportOptions {
            l2_exclusion: true,
            all_edges: false,
        },
    );

    assert_eq!(devices(&report), vec!["rtr-core-01", "fw-edge-01"]);
    assert_eq!(report.hidden_link_layer_hops, 1);
    assert_eq!(report.verdict, Verdict::Denied);
    assert_eq!(report.outcome, Some(PathOutcome::Dropped));
}

#[test]
fn without_exclusion_every_hop_is_kept() {
    let report = PathReport::build(
        &request(),
        &outcome("pathlookup_l2_denied.json"),
        ReportOptions::default(),
    );

    assert_eq!(
        devices(&report),
        vec!["sw-access-01", "rtr-core-01", "fw-edge-01"]
    );
    assert_eq!(report.hidden_link_layer_hops, 0);

    let source = &report.hops[0];
    assert_eq!(source.ingress, "-");
    assert_eq!(source.egress, "Gi1/0/1");
    assert_eq!(source.protocol, "l2");
    assert!(source.is_link_layer());

    let router = &report.hops[1];
    assert_eq!(router.ingress, "Gi0/0");
    assert_eq!(router.egress, "Gi0/1");
    assert_eq!(router.protocol, "ip");
    let decision = router.security.as_ref().expect("router has an ACL decision");
    assert_eq!(decision.severity, Severity::Green);
    assert_eq!(decision.policy, "ACL-IN permit 10");

    let firewall = &report.hops[2];
    assert_eq!(firewall.ingress, "eth1");
    assert_eq!(firewall.egress, "eth2");
    let decision = firewall.security.as_ref().expect("firewall denies");
    assert_eq!(decision.severity, Severity::Red);
    assert_eq!(decision.policy, "DENY-ALL");
}

#[test]
fn event_summary_keeps_only_non_zero_counts() {
    let report = PathReport::build(
        &request(),
        &outcome("pathlookup_l2_denied.json"),
        ReportOptions::default(),
    );

    let topics: Vec<&str> = report.summary.topics.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(topics, vec!["ACL", "Routing"]);

    let acl = &report.summary.topics[0];
    let counts: Vec<(Severity, u64)> = acl.counts.iter().map(|c| (c.severity, c.count)).collect();
    assert_eq!(counts, vec![(Severity::Green, 1), (Severity::Red, 1)]);

    assert_eq!(
        report.summary.global[0].line(),
        "Flow dropped | fw-edge-01 | DENY-ALL | 30"
    );
}

#[test]
fn accepted_fixture_follows_first_egress_and_is_allowed() {
    let report = PathReport::build(
        &request(),
        &outcome("pathlookup_allowed.json"),
        ReportOptions {
            l2_exclusion: true,
            all_edges: true,
        },
    );

    assert_eq!(devices(&report), vec!["leaf-01", "spine-01", "leaf-02"]);
    assert_eq!(report.hops[0].protocol, "vxlan");
    assert_eq!(report.verdict, Verdict::Allowed);
    assert_eq!(report.outcome, Some(PathOutcome::Accepted));
    assert!(report.summary.topics.is_empty());

    let edges = report.edges.as_ref().expect("all edges requested");
    assert_eq!(edges.len(), 4);
    assert!(edges[2].branch);
}

#[test]
fn zone_firewall_rows_annotate_security_decisions() {
    let mut outcome = outcome("pathlookup_l2_denied.json");
    outcome.zone_firewall = vec![ZoneFirewallInterface {
        hostname: "fw-edge-01".to_string(),
        int_name: "eth2".to_string(),
        zone: vec!["untrust".to_string()],
    }];

    let report = PathReport::build(&request(), &outcome, ReportOptions::default());
    let decision = report.hops[2].security.as_ref().expect("firewall decision");
    assert_eq!(decision.zones.as_deref(), Some("untrust"));
    assert_eq!(report.hops[1].security.as_ref().unwrap().zones, None);
}

#[test]
fn empty_graph_has_nothing_to_display() {
    let report = PathReport::build(
        &request(),
        &outcome("pathlookup_no_path.json"),
        ReportOptions::default(),
    );
    assert!(!report.path_available);
    assert!(report.nothing_to_display());
    assert_eq!(report.verdict, Verdict::NoPath);
    assert_eq!(report.summary.global.len(), 1);
}

#[test]
fn empty_graph_with_pivot_is_still_displayed() {
    let mut outcome = outcome("pathlookup_no_path.json");
    outcome.pivot = PivotResolution::NoTransit;
    let report = PathReport::build(&request(), &outcome, ReportOptions::default());
    assert!(!report.nothing_to_display());
}

#[test]
fn building_twice_yields_identical_reports() {
    let options = ReportOptions {
        l2_exclusion: true,
        all_edges: true,
    };
    let first = PathReport::build(&request(), &outcome("pathlookup_l2_denied.json"), options);
    let second = PathReport::build(&request(), &outcome("pathlookup_l2_denied.json"), options);
    assert_eq!(first, second);
}
