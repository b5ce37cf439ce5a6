use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The controller API family a profile talks to.
///
/// Determines URL prefixes, login paths, payload shapes, and which
/// operations are available.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ApiFamily {
    /// UniFi OS device (UDM, UCG, UXG) -- port 443, `/proxy/network/` prefix.
    Udm,
    /// Standalone Network Application (Java) -- port 8443, no prefix.
    Legacy,
}

impl ApiFamily {
    /// The path prefix in front of every network-application endpoint.
    pub fn network_prefix(self) -> &'static str {
        match self {
            Self::Udm => "/proxy/network",
            Self::Legacy => "",
        }
    }

    /// The login endpoint path.
    pub fn login_path(self) -> &'static str {
        match self {
            Self::Udm => "/api/auth/login",
            Self::Legacy => "/api/login",
        }
    }

    /// The logout endpoint path.
    pub fn logout_path(self) -> &'static str {
        match self {
            Self::Udm => "/api/auth/logout",
            Self::Legacy => "/api/logout",
        }
    }

    /// Whether the controller accepts a remote speed-test trigger.
    ///
    /// UniFi OS consoles run their own schedule configured in the
    /// Network UI; only standalone controllers take `cmd/devmgr speedtest`.
    pub fn supports_speed_test_trigger(self) -> bool {
        matches!(self, Self::Legacy)
    }
}
