use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Which tier of the resolver picked the primary interface.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ResolutionMethod {
    /// Live default route.
    Routing,
    /// Static "primary" flag in the network configuration.
    Config,
    /// Freshest speed-test result.
    Speedtest,
    /// Lowest discovery order.
    Fallback,
    /// No interfaces to choose from.
    None,
}

/// Outcome of one resolver run. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub primary_key: Option<String>,
    pub method: ResolutionMethod,
}

impl ResolutionResult {
    pub fn new(primary_key: impl Into<String>, method: ResolutionMethod) -> Self {
        Self {
            primary_key: Some(primary_key.into()),
            method,
        }
    }

    /// Empty interface set: nothing to resolve.
    pub fn none() -> Self {
        Self {
            primary_key: None,
            method: ResolutionMethod::None,
        }
    }
}
