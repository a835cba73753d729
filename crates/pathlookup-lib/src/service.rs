//! The seam between the lookup flow and where Pathlookup results come from.

use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::info;

use crate::error::{Error, Result};
use crate::model::{PathLookupResult, ZoneFirewallInterface};
use crate::request::UnicastParameters;

/// A source of Pathlookup results.
pub trait PathLookupService {
    /// Run one unicast path lookup.
    fn path_lookup(&self, parameters: &UnicastParameters) -> Result<PathLookupResult>;

    /// Zone-firewall interface bindings used to annotate security decisions.
    /// Sources without that table return an empty list.
    fn zone_firewall_interfaces(&self) -> Result<Vec<ZoneFirewallInterface>> {
        Ok(Vec::new())
    }
}

/// Serves a previously captured Pathlookup response from disk.
///
/// The request parameters are ignored: the file *is* the answer.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PathLookupService for FileSource {
    fn path_lookup(&self, _parameters: &UnicastParameters) -> Result<PathLookupResult> {
        info!(path = %self.path.display(), "loading pathlookup result from file");
        let text = fs::read_to_string(&self.path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => Error::InputNotFound {
                path: self.path.clone(),
            },
            _ => Error::Io(err),
        })?;
        PathLookupResult::parse(&self.path.display().to_string(), &text)
    }
}
