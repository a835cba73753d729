//! Platform connection settings read from the environment.
//!
//! Settings are resolved through a lookup function rather than `std::env`
//! directly so tests can supply their own values without touching the global
//! process environment.

use std::time::Duration;

use crate::error::{Error, Result};

pub const URL_ENV: &str = "IPF_URL";
pub const TOKEN_ENV: &str = "IPF_TOKEN";
pub const SNAPSHOT_ENV: &str = "IPF_SNAPSHOT_ID";
pub const VERIFY_ENV: &str = "IPF_VERIFY";
pub const TIMEOUT_ENV: &str = "IPF_TIMEOUT";
pub const API_VERSION_ENV: &str = "IPF_API_VERSION";

/// Snapshot alias understood by the platform as "most recent loaded snapshot".
pub const LATEST_SNAPSHOT: &str = "$last";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_API_VERSION: &str = "v6.0";

/// Everything needed to talk to the platform.
#[derive(Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    pub base_url: String,
    pub token: String,
    pub snapshot_id: String,
    pub verify_tls: bool,
    pub timeout: Duration,
    pub api_version: String,
}

// Manual impl so the token never ends up in logs.
impl std::fmt::Debug for PlatformConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("snapshot_id", &self.snapshot_id)
            .field("verify_tls", &self.verify_tls)
            .field("timeout", &self.timeout)
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl PlatformConfig {
    /// Read the configuration from the process environment.
    ///
    /// With a `profile`, the URL and token come from `IPF_URL_<PROFILE>` and
    /// `IPF_TOKEN_<PROFILE>`; the remaining settings are shared.
    pub fn from_env(profile: Option<&str>) -> Result<Self> {
        Self::from_lookup(profile, |key| std::env::var(key).ok())
    }

    /// Resolve the configuration through `lookup`.
    pub fn from_lookup<F>(profile: Option<&str>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let profiled = |base: &str| match profile {
            Some(name) if !name.is_empty() => format!("{base}_{}", name.to_ascii_uppercase()),
            _ => base.to_string(),
        };
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let url_key = profiled(URL_ENV);
        let base_url = non_empty(&url_key).ok_or(Error::MissingConfig {
            variable: url_key.clone(),
        })?;
        let token_key = profiled(TOKEN_ENV);
        let token = non_empty(&token_key).ok_or(Error::MissingConfig {
            variable: token_key.clone(),
        })?;

        let snapshot_id =
            non_empty(SNAPSHOT_ENV).unwrap_or_else(|| LATEST_SNAPSHOT.to_string());
        let verify_tls = match non_empty(VERIFY_ENV) {
            Some(raw) => parse_bool(VERIFY_ENV, &raw)?,
            None => true,
        };
        let timeout = match non_empty(TIMEOUT_ENV) {
            Some(raw) => Duration::from_secs(raw.trim().parse::<u64>().map_err(|_| {
                Error::InvalidConfig {
                    variable: TIMEOUT_ENV.to_string(),
                    value: raw.clone(),
                    message: "expected a whole number of seconds".to_string(),
                }
            })?),
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };
        let api_version = non_empty(API_VERSION_ENV)
            .map(|raw| normalize_api_version(&raw))
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        Ok(Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            token,
            snapshot_id,
            verify_tls,
            timeout,
            api_version,
        })
    }

    /// Replace the snapshot when one was given on the command line.
    pub fn with_snapshot(mut self, snapshot: Option<&str>) -> Self {
        if let Some(snapshot) = snapshot.filter(|s| !s.trim().is_empty()) {
            self.snapshot_id = snapshot.trim().to_string();
        }
        self
    }

    /// Absolute URL of an API endpoint such as `graphs`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/api/{}/{}",
            self.base_url,
            self.api_version,
            path.trim_start_matches('/')
        )
    }
}

fn parse_bool(variable: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::InvalidConfig {
            variable: variable.to_string(),
            value: raw.to_string(),
            message: "expected true or false".to_string(),
        }),
    }
}

fn normalize_api_version(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('v') {
        trimmed.to_string()
    } else {
        format!("v{trimmed}")
    }
}
