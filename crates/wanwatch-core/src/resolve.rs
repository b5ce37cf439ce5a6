// ── Primary resolver ──
//
// Picks exactly one primary interface (or none) from the canonical set
// plus the routing and configuration signals. Tiers run in strict order
// and the first unambiguous answer wins. Pure: no I/O, no mutation.

use std::cmp::Ordering;

use tracing::trace;

use crate::model::{
    NetworkConfigSnapshot, ResolutionMethod, ResolutionResult, RoutingSnapshot, WanInterface,
};

/// Resolve the primary interface for one poll cycle.
///
/// `previous` is consulted only to break a tie between several live
/// default routes, keeping the primary stable under load-balancing.
pub fn resolve(
    interfaces: &[WanInterface],
    routing: Option<&RoutingSnapshot>,
    config: Option<&NetworkConfigSnapshot>,
    previous: Option<&ResolutionResult>,
) -> ResolutionResult {
    if interfaces.is_empty() {
        return ResolutionResult::none();
    }

    if let Some(key) = routing.and_then(|r| by_routing(interfaces, r, previous)) {
        return ResolutionResult::new(key, ResolutionMethod::Routing);
    }
    if let Some(key) = config.and_then(|c| by_config(interfaces, c)) {
        return ResolutionResult::new(key, ResolutionMethod::Config);
    }
    if let Some(key) = by_speedtest(interfaces) {
        return ResolutionResult::new(key, ResolutionMethod::Speedtest);
    }

    interfaces
        .iter()
        .min_by_key(|wan| wan.wan_number)
        .map_or_else(ResolutionResult::none, |wan| {
            ResolutionResult::new(wan.key.clone(), ResolutionMethod::Fallback)
        })
}

/// The single interface an identifier names, if it names exactly one.
fn unique_match<'a>(
    interfaces: &'a [WanInterface],
    matches: impl Fn(&WanInterface) -> bool,
) -> Option<&'a WanInterface> {
    let mut found = interfaces.iter().filter(|wan| matches(*wan));
    let first = found.next()?;
    found.next().is_none().then_some(first)
}

fn by_routing<'a>(
    interfaces: &'a [WanInterface],
    routing: &RoutingSnapshot,
    previous: Option<&ResolutionResult>,
) -> Option<&'a str> {
    let mut candidates: Vec<&str> = Vec::new();
    for ident in &routing.default_routes {
        match unique_match(interfaces, |wan| wan.matches(ident)) {
            Some(wan) if !candidates.contains(&wan.key.as_str()) => candidates.push(&wan.key),
            Some(_) => {}
            None => trace!(route = %ident, "default route matches no single interface"),
        }
    }

    match candidates.as_slice() {
        [] => None,
        [only] => Some(*only),
        several => {
            let sticky = previous.and_then(|p| p.primary_key.as_deref())?;
            several.iter().copied().find(|key| *key == sticky)
        }
    }
}

fn by_config<'a>(
    interfaces: &'a [WanInterface],
    config: &NetworkConfigSnapshot,
) -> Option<&'a str> {
    let mut designated = config.designated();
    let ident = designated.next()?;
    if designated.next().is_some() {
        trace!("several networks designated primary, ignoring configuration");
        return None;
    }
    unique_match(interfaces, |wan| {
        wan.network_group.as_deref() == Some(ident) || wan.matches(ident)
    })
    .map(|wan| wan.key.as_str())
}

fn by_speedtest(interfaces: &[WanInterface]) -> Option<&str> {
    interfaces
        .iter()
        .filter(|wan| wan.speedtest.is_some())
        .max_by(|a, b| freshness(a, b))
        .map(|wan| wan.key.as_str())
}

/// Newer timestamp, then complete data, then lower discovery order.
fn freshness(a: &WanInterface, b: &WanInterface) -> Ordering {
    let ts = |w: &WanInterface| w.speedtest.as_ref().and_then(|s| s.timestamp);
    let complete = |w: &WanInterface| w.speedtest.as_ref().is_some_and(|s| s.is_complete());
    ts(a)
        .cmp(&ts(b))
        .then_with(|| complete(a).cmp(&complete(b)))
        .then_with(|| b.wan_number.cmp(&a.wan_number))
}
