// One poll cycle: fetch the three payloads concurrently, then normalize,
// inspect and resolve. Returns the result instead of publishing it, so a
// cancelled cycle can never leave a snapshot behind.

use tracing::{debug, warn};

use crate::config::ProfileId;
use crate::error::CoreError;
use crate::model::{ResolutionResult, Snapshot, WanInterface};
use crate::resolve::resolve;
use crate::source::WanSource;
use crate::strategy::{normalize, parse_config, parse_routing};

/// Output of a successful cycle, ready to be published.
#[derive(Debug, Clone)]
pub(crate) struct CycleOutput {
    pub interfaces: Vec<WanInterface>,
    pub resolution: ResolutionResult,
}

impl CycleOutput {
    pub(crate) fn into_snapshot(self, profile_id: ProfileId) -> Snapshot {
        Snapshot::new(profile_id, self.interfaces, self.resolution)
    }
}

/// Run a single cycle against `source`.
///
/// Only a failed WAN-list fetch fails the cycle; routing and config
/// failures degrade their tier to "absent".
pub(crate) async fn run_cycle<S: WanSource>(
    source: &S,
    previous: Option<&ResolutionResult>,
) -> Result<CycleOutput, CoreError> {
    let family = source.api_family();
    let (wans, routing, config) = tokio::join!(
        source.fetch_wan_list(),
        source.fetch_routing_info(),
        source.fetch_network_config(),
    );

    let wans = wans?;

    let routing = match routing {
        Ok(raw) => parse_routing(&raw, family),
        Err(e) => {
            warn!(error = %e, kind = %e.kind(), "routing fetch failed, skipping routing tier");
            None
        }
    };
    let config = match config {
        Ok(raw) => parse_config(&raw, family),
        Err(e) => {
            warn!(error = %e, kind = %e.kind(), "network config fetch failed, skipping config tier");
            None
        }
    };

    let interfaces = normalize(&wans, family);
    let resolution = resolve(&interfaces, routing.as_ref(), config.as_ref(), previous);
    debug!(
        interfaces = interfaces.len(),
        routing = routing.is_some(),
        config = config.is_some(),
        method = %resolution.method,
        "cycle resolved"
    );

    Ok(CycleOutput {
        interfaces,
        resolution,
    })
}

/// Poll once outside any scheduler and build a snapshot.
pub async fn poll_once<S: WanSource>(
    source: &S,
    profile_id: ProfileId,
) -> Result<Snapshot, CoreError> {
    let output = run_cycle(source, None).await?;
    Ok(output.into_snapshot(profile_id))
}
