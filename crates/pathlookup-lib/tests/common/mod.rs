//! Common test utilities and fixture helpers.
//!
//! Provides fixture paths, a scripted in-memory `PathLookupService`, and a
//! one-shot HTTP responder for exercising the platform client.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use pathlookup_lib::request::UnicastParameters;
use pathlookup_lib::{
    PathLookupResult, PathLookupService, Result, ZoneFirewallInterface,
};

/// Path to fixtures directory shared by the workspace.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures")
}

#[allow(dead_code)]
pub fn fixture_path(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

/// Load and parse a fixture document.
#[allow(dead_code)]
pub fn load_fixture(name: &str) -> PathLookupResult {
    let path = fixture_path(name);
    let text = fs::read_to_string(&path).expect("fixture readable");
    PathLookupResult::parse(&path.display().to_string(), &text).expect("fixture parses")
}

/// Serves queued results in order and records every request it receives.
#[allow(dead_code)]
pub struct ScriptedService {
    responses: RefCell<VecDeque<PathLookupResult>>,
    zone_firewall: Vec<ZoneFirewallInterface>,
    pub requests: RefCell<Vec<serde_json::Value>>,
}

#[allow(dead_code)]
impl ScriptedService {
    pub fn new(responses: Vec<PathLookupResult>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            zone_firewall: Vec::new(),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn with_zone_firewall(mut self, rows: Vec<ZoneFirewallInterface>) -> Self {
        self.zone_firewall = rows;
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl PathLookupService for ScriptedService {
    fn path_lookup(&self, parameters: &UnicastParameters) -> Result<PathLookupResult> {
        self.requests
            .borrow_mut()
            .push(serde_json::to_value(parameters).expect("parameters serialize"));
        Ok(self
            .responses
            .borrow_mut()
            .pop_front()
            .expect("a scripted response is queued"))
    }

    fn zone_firewall_interfaces(&self) -> Result<Vec<ZoneFirewallInterface>> {
        Ok(self.zone_firewall.clone())
    }
}

/// A request captured by [`serve_once`].
#[allow(dead_code)]
#[derive(Debug)]
pub struct CapturedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

#[allow(dead_code)]
impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Accept one HTTP request on a local port, answer it with `status` and
/// `body`, and hand back what was received.
#[allow(dead_code)]
pub fn serve_once(status: u16, body: &str) -> (String, JoinHandle<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind local port");
    let address = listener.local_addr().expect("local address");
    let body = body.to_string();

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept connection");
        let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));

        let mut request_line = String::new();
        reader.read_line(&mut request_line).expect("read request line");

        let mut headers = Vec::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).expect("read header");
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((key, value)) = line.split_once(':') {
                headers.push((key.trim().to_string(), value.trim().to_string()));
            }
        }

        let length = headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.parse::<usize>().ok())
            .unwrap_or(0);
        let mut raw_body = vec![0u8; length];
        reader.read_exact(&mut raw_body).expect("read body");

        let mut stream = stream;
        let response = format!(
            "HTTP/1.1 {status} Status\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).expect("write response");
        stream.flush().expect("flush response");

        CapturedRequest {
            request_line: request_line.trim_end().to_string(),
            headers,
            body: String::from_utf8(raw_body).expect("utf-8 body"),
        }
    });

    (format!("http://{address}"), handle)
}
