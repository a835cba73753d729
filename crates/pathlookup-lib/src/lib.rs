//! Pathlookup library entry points.
//!
//! This crate validates lookup arguments, talks to the IP Fabric platform (or
//! reads a captured response from disk), walks the returned edge graph and
//! builds a [`PathReport`] that front-ends render. Consumers should depend on
//! the items re-exported here instead of reimplementing behavior.

#![deny(warnings)]

pub mod analysis;
pub mod client;
pub mod config;
pub mod error;
pub mod lookup;
pub mod model;
pub mod path;
pub mod pivot;
pub mod report;
pub mod request;
pub mod service;

pub use analysis::{analyze_path, Hop, PathAnalysis, SecurityDecision, Verdict};
pub use client::PlatformClient;
pub use config::PlatformConfig;
pub use error::{Error, Result};
pub use lookup::{run_lookup, LookupOutcome};
pub use model::{PathLookupResult, Severity, ZoneFirewallInterface};
pub use path::{follow_first_path, list_all_edges, EdgeListing, PathOutcome};
pub use pivot::{entry_point_from_pivot, EntryPoint, PivotResolution};
pub use report::{PathReport, ReportOptions};
pub use request::{FirstHopAlgorithm, LookupArgs, PathLookupRequest, Protocol};
pub use service::{FileSource, PathLookupService};
