//! One lookup cycle: optional pivot resolution, the path lookup itself, and
//! zone-firewall enrichment.

use tracing::{info, warn};

use crate::error::Result;
use crate::model::{PathLookupResult, ZoneFirewallInterface};
use crate::pivot::{entry_point_from_pivot, PivotResolution};
use crate::request::{FirstHopAlgorithm, PathLookupRequest};
use crate::service::PathLookupService;

/// Everything fetched for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupOutcome {
    pub result: PathLookupResult,
    pub pivot: PivotResolution,
    pub zone_firewall: Vec<ZoneFirewallInterface>,
}

/// Run the lookup for `request` against `service`.
///
/// With a pivot, the pivot-to-source path is looked up first; its transit
/// edge becomes the user-defined entry point of the main lookup.
pub fn run_lookup<S>(service: &S, request: &PathLookupRequest) -> Result<LookupOutcome>
where
    S: PathLookupService + ?Sized,
{
    let (first_hop, pivot) = match request.pivot_request() {
        Some(pivot_request) => {
            info!(pivot = %pivot_request.source, "resolving source entry point through pivot");
            let pivot_result =
                service.path_lookup(&pivot_request.unicast(FirstHopAlgorithm::Automatic))?;
            match entry_point_from_pivot(&pivot_result) {
                Some(entry) => {
                    info!(
                        hostname = %entry.hostname,
                        iface = %entry.iface,
                        "source entry point found"
                    );
                    (
                        FirstHopAlgorithm::UserDefined {
                            entry_points: vec![entry.clone()],
                        },
                        PivotResolution::EntryPoint(entry),
                    )
                }
                None => {
                    warn!(
                        pivot = %pivot_request.source,
                        "pivot path has no transit; pivot ignored"
                    );
                    (FirstHopAlgorithm::Automatic, PivotResolution::NoTransit)
                }
            }
        }
        None => (FirstHopAlgorithm::Automatic, PivotResolution::NotRequested),
    };

    let result = service.path_lookup(&request.unicast(first_hop))?;
    let zone_firewall = service.zone_firewall_interfaces()?;

    Ok(LookupOutcome {
        result,
        pivot,
        zone_firewall,
    })
}
