use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

/// Most recent speed-test result for one interface.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpeedTest {
    pub download_mbps: Option<f64>,
    pub upload_mbps: Option<f64>,
    pub ping_ms: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
    pub status: Option<String>,
}

impl SpeedTest {
    /// Both throughput figures present and non-zero.
    pub fn is_complete(&self) -> bool {
        let positive = |v: Option<f64>| v.is_some_and(|x| x > 0.0);
        positive(self.download_mbps) && positive(self.upload_mbps)
    }

    /// No measurement at all, only metadata.
    pub fn is_empty(&self) -> bool {
        self.download_mbps.is_none() && self.upload_mbps.is_none() && self.ping_ms.is_none()
    }
}

/// Canonical per-interface record.
///
/// `key` is unique within one poll. `is_primary` is only ever set on the
/// copies held by a published `Snapshot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WanInterface {
    pub key: String,
    pub interface_name: Option<String>,
    pub network_group: Option<String>,
    /// Controller-assigned identifier, accepted as an alias when matching
    /// routing and configuration signals.
    pub controller_id: Option<String>,
    /// Discovery order within the raw payload, starting at 0.
    pub wan_number: usize,
    pub speedtest: Option<SpeedTest>,
    #[serde(default)]
    pub is_primary: bool,
}

impl WanInterface {
    /// Whether `ident` names this interface by key, port name or controller id.
    pub fn matches(&self, ident: &str) -> bool {
        self.key == ident
            || self.interface_name.as_deref() == Some(ident)
            || self.controller_id.as_deref() == Some(ident)
    }

    /// Human-readable label: group, then interface name, then key.
    pub fn label(&self) -> &str {
        self.network_group
            .as_deref()
            .or(self.interface_name.as_deref())
            .unwrap_or(&self.key)
    }
}

/// Result of a speed-test trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SpeedTestOutcome {
    Accepted,
    Unsupported,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completeness_requires_both_directions() {
        let mut st = SpeedTest {
            download_mbps: Some(500.0),
            upload_mbps: Some(0.0),
            ..SpeedTest::default()
        };
        assert!(!st.is_complete());
        st.upload_mbps = Some(40.0);
        assert!(st.is_complete());
        assert!(!st.is_empty());
        assert!(SpeedTest::default().is_empty());
    }

    #[test]
    fn matches_any_identifier_form() {
        let wan = WanInterface {
            key: "eth9_WAN".into(),
            interface_name: Some("eth9".into()),
            network_group: Some("WAN".into()),
            controller_id: Some("64f0".into()),
            wan_number: 0,
            speedtest: None,
            is_primary: false,
        };
        assert!(wan.matches("eth9_WAN"));
        assert!(wan.matches("eth9"));
        assert!(wan.matches("64f0"));
        assert!(!wan.matches("WAN"));
        assert_eq!(wan.label(), "WAN");
    }
}
