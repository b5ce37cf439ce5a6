use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default-route signal from the controller's routing table.
///
/// Identifiers of every interface carrying a `0.0.0.0/0` route, in table
/// order without duplicates. More than one entry means load-balancing or
/// failover routes are installed side by side.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoutingSnapshot {
    pub default_routes: Vec<String>,
}

/// Explicit primary designations from static network configuration,
/// keyed by WAN group (or network name when no group is set).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetworkConfigSnapshot {
    pub designations: BTreeMap<String, bool>,
}

impl NetworkConfigSnapshot {
    /// Identifiers flagged as primary.
    pub fn designated(&self) -> impl Iterator<Item = &str> {
        self.designations
            .iter()
            .filter(|(_, primary)| **primary)
            .map(|(ident, _)| ident.as_str())
    }
}
