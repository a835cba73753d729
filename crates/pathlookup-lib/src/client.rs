//! Blocking HTTP client for the IP Fabric REST API.

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::config::{PlatformConfig, URL_ENV};
use crate::error::{Error, Result};
use crate::model::{decode_error, PathLookupResult, ZoneFirewallInterface};
use crate::request::UnicastParameters;
use crate::service::PathLookupService;

const TOKEN_HEADER: &str = "X-API-Token";
const GRAPHS_PATH: &str = "graphs";
const ZONE_FIREWALL_PATH: &str = "tables/security/zone-firewall/interfaces";
const ZONE_FIREWALL_COLUMNS: [&str; 3] = ["hostname", "intName", "zone"];
const PAGE_SIZE: usize = 1000;
/// Longest platform error body echoed back to the user.
const MAX_ERROR_BODY: usize = 512;

/// Talks to a live platform instance.
#[derive(Debug)]
pub struct PlatformClient {
    client: Client,
    config: PlatformConfig,
}

impl PlatformClient {
    pub fn new(config: PlatformConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(user_agent())
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(Error::Http)?;
        Ok(Self { client, config })
    }

    fn post_json<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        let url = self.config.endpoint(path);
        debug!(url = %url, snapshot = %self.config.snapshot_id, "sending platform request");

        let response = self
            .client
            .post(&url)
            .header(TOKEN_HEADER, &self.config.token)
            .header(ACCEPT, "application/json")
            .json(body)
            .send()
            .map_err(|err| transport_error(&url, err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(status_error(path, status, &body));
        }

        let text = response.text().map_err(|err| transport_error(&url, err))?;
        serde_json::from_str(&text)
            .map_err(|err| decode_error(&format!("response from {url}"), err))
    }
}

impl PathLookupService for PlatformClient {
    fn path_lookup(&self, parameters: &UnicastParameters) -> Result<PathLookupResult> {
        info!(
            source = %parameters.starting_point,
            destination = %parameters.destination_point,
            protocol = %parameters.protocol,
            "requesting pathlookup"
        );
        let body = json!({
            "parameters": parameters,
            "snapshot": self.config.snapshot_id,
        });
        self.post_json(GRAPHS_PATH, &body)
    }

    fn zone_firewall_interfaces(&self) -> Result<Vec<ZoneFirewallInterface>> {
        let mut rows = Vec::new();
        loop {
            let body = json!({
                "columns": ZONE_FIREWALL_COLUMNS,
                "snapshot": self.config.snapshot_id,
                "pagination": { "start": rows.len(), "limit": PAGE_SIZE },
            });
            let page: TablePage<ZoneFirewallInterface> =
                self.post_json(ZONE_FIREWALL_PATH, &body)?;
            let received = page.data.len();
            rows.extend(page.data);

            let done = match page.meta.and_then(|meta| meta.count) {
                Some(total) => rows.len() >= total,
                None => received < PAGE_SIZE,
            };
            if done || received == 0 {
                break;
            }
        }
        debug!(count = rows.len(), "loaded zone-firewall interfaces");
        Ok(rows)
    }
}

#[derive(Debug, Deserialize)]
struct TablePage<T> {
    data: Vec<T>,
    #[serde(rename = "_meta", default)]
    meta: Option<TableMeta>,
}

#[derive(Debug, Deserialize)]
struct TableMeta {
    #[serde(default)]
    count: Option<usize>,
}

fn user_agent() -> String {
    format!("pathlookup-lib/{version}", version = env!("CARGO_PKG_VERSION"))
}

fn transport_error(url: &str, err: reqwest::Error) -> Error {
    if err.is_builder() {
        Error::InvalidConfig {
            variable: URL_ENV.to_string(),
            value: url.to_string(),
            message: err.to_string(),
        }
    } else if err.is_connect() || err.is_timeout() || err.is_request() {
        Error::Connectivity {
            url: url.to_string(),
            message: err.to_string(),
        }
    } else {
        Error::Http(err)
    }
}

fn status_error(endpoint: &str, status: StatusCode, body: &str) -> Error {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Authentication {
            status: status.as_u16(),
        },
        _ => Error::Platform {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body: body.chars().take(MAX_ERROR_BODY).collect(),
        },
    }
}
