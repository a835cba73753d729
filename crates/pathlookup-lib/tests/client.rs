mod common;

use std::time::Duration;

use pathlookup_lib::{
    Error, FirstHopAlgorithm, LookupArgs, PathLookupService, PlatformClient, PlatformConfig,
};

use common::{fixture_path, serve_once};

fn config(base_url: &str) -> PlatformConfig {
    PlatformConfig {
        base_url: base_url.to_string(),
        token: "test-token".to_string(),
        snapshot_id: "snap-1".to_string(),
        verify_tls: true,
        timeout: Duration::from_secs(5),
        api_version: "v6.0".to_string(),
    }
}

fn parameters() -> pathlookup_lib::request::UnicastParameters {
    LookupArgs {
        source: "10.0.0.10".to_string(),
        destination: "10.2.0.20".to_string(),
        ..LookupArgs::default()
    }
    .validate()
    .expect("valid request")
    .unicast(FirstHopAlgorithm::Automatic)
}

#[test]
fn path_lookup_posts_parameters_with_token() {
    let body = std::fs::read_to_string(fixture_path("pathlookup_l2_denied.json")).unwrap();
    let (url, handle) = serve_once(200, &body);

    let client = PlatformClient::new(config(&url)).unwrap();
    let result = client.path_lookup(&parameters()).expect("lookup succeeds");
    let request = handle.join().unwrap();

    assert_eq!(result.edges().len(), 2);
    assert!(request.request_line.starts_with("POST /api/v6.0/graphs "));
    assert_eq!(request.header("x-api-token"), Some("test-token"));

    let sent: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(sent["snapshot"], "snap-1");
    assert_eq!(sent["parameters"]["startingPoint"], "10.0.0.10");
    assert_eq!(sent["parameters"]["protocol"], "icmp");
}

#[test]
fn rejected_token_is_an_authentication_error() {
    let (url, handle) = serve_once(401, r#"{"message":"invalid token"}"#);
    let client = PlatformClient::new(config(&url)).unwrap();

    let err = client.path_lookup(&parameters()).unwrap_err();
    handle.join().unwrap();
    assert!(matches!(err, Error::Authentication { status: 401 }));
}

#[test]
fn unexpected_body_is_a_malformed_response() {
    let (url, handle) = serve_once(200, r#"{"unexpected": true}"#);
    let client = PlatformClient::new(config(&url)).unwrap();

    let err = client.path_lookup(&parameters()).unwrap_err();
    handle.join().unwrap();
    assert!(matches!(err, Error::MalformedResponse { .. }));
}

#[test]
fn zone_firewall_table_is_read_with_pagination() {
    let body = r#"{
        "data": [
            {"hostname": "fw-edge-01", "intName": "eth2", "zone": ["untrust"]},
            {"hostname": "fw-edge-01", "intName": "eth1", "zone": ["trust"]}
        ],
        "_meta": {"count": 2, "size": 2}
    }"#;
    let (url, handle) = serve_once(200, body);
    let client = PlatformClient::new(config(&url)).unwrap();

    let rows = client.zone_firewall_interfaces().unwrap();
    let request = handle.join().unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].int_name, "eth2");
    assert!(request
        .request_line
        .starts_with("POST /api/v6.0/tables/security/zone-firewall/interfaces "));
    let sent: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(sent["pagination"]["start"], 0);
    assert_eq!(sent["columns"][1], "intName");
}

#[test]
fn unreachable_platform_is_a_connectivity_error() {
    // Bind then drop a listener so the port is known to be closed.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = PlatformClient::new(config(&format!("http://127.0.0.1:{port}"))).unwrap();

    let err = client.path_lookup(&parameters()).unwrap_err();
    assert!(matches!(err, Error::Connectivity { .. }), "got {err:?}");
}
