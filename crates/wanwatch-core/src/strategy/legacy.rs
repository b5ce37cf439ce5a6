// Standalone controller payloads
//
// WAN list: `stat/device` gateway records, each carrying `wan1..wanN`
// port blocks plus a device-level `speedtest-status`. Routing:
// `{network, netmask, interface}`. Network config: WAN networks flag
// `primary` (or `is_primary` on newer releases).

use serde_json::{Map, Value};
use wanwatch_api::ApiFamily;

use super::{
    FamilyStrategy, RawWan, default_route_interface, num_field, primary_flag, str_field,
    str_field_any, timestamp_field_any,
};
use crate::model::{NetworkConfigSnapshot, RoutingSnapshot, SpeedTest};

const GATEWAY_TYPES: &[&str] = &["ugw", "udm", "uxg", "ucg"];

#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyStrategy;

impl FamilyStrategy for LegacyStrategy {
    fn family(&self) -> ApiFamily {
        ApiFamily::Legacy
    }

    fn extract_interfaces(&self, raw: &[Value]) -> Vec<RawWan> {
        raw.iter()
            .filter(|d| str_field(d, "type").is_some_and(|t| GATEWAY_TYPES.contains(&t)))
            .filter_map(Value::as_object)
            .flat_map(gateway_wans)
            .collect()
    }

    fn parse_routing(&self, raw: &[Value]) -> Option<RoutingSnapshot> {
        let mut default_routes: Vec<String> = Vec::new();
        for intf in raw.iter().filter_map(default_route_interface) {
            if !default_routes.iter().any(|r| r == intf) {
                default_routes.push(intf.to_owned());
            }
        }
        (!default_routes.is_empty()).then_some(RoutingSnapshot { default_routes })
    }

    fn parse_config(&self, raw: &[Value]) -> Option<NetworkConfigSnapshot> {
        let mut snapshot = NetworkConfigSnapshot::default();
        for entry in raw.iter().filter(|e| str_field(e, "purpose") == Some("wan")) {
            let Some(ident) = str_field_any(entry, &["wan_networkgroup", "name"]) else {
                continue;
            };
            let primary = primary_flag(entry);
            snapshot.designations.insert(ident.to_owned(), primary);
        }
        (!snapshot.designations.is_empty()).then_some(snapshot)
    }
}

/// WAN blocks of one gateway device in port order, with the device's
/// speed-test result attached to the interface it measured.
fn gateway_wans(device: &Map<String, Value>) -> Vec<RawWan> {
    let mut ports: Vec<(u32, &Value)> = device
        .iter()
        .filter(|(_, v)| v.is_object())
        .filter_map(|(k, v)| wan_port_number(k).map(|n| (n, v)))
        .collect();
    ports.sort_by_key(|(n, _)| *n);

    let mut wans: Vec<RawWan> = ports
        .into_iter()
        .map(|(n, block)| RawWan {
            interface_name: str_field(block, "ifname").map(str::to_owned),
            network_group: Some(
                str_field_any(block, &["networkgroup", "wan_networkgroup"])
                    .map_or_else(|| derived_group(n), str::to_owned),
            ),
            controller_id: str_field_any(block, &["_id", "id"]).map(str::to_owned),
            speedtest: None,
        })
        .collect();

    if let Some(status) = device.get("speedtest-status").filter(|v| v.is_object()) {
        let result = read_speedtest(status);
        if !result.is_empty() {
            let target = str_field(status, "interface_name")
                .or_else(|| device.get("uplink").and_then(|u| str_field(u, "ifname")));
            let idx = target
                .and_then(|name| {
                    wans.iter()
                        .position(|w| w.interface_name.as_deref() == Some(name))
                })
                .unwrap_or(0);
            if let Some(wan) = wans.get_mut(idx) {
                wan.speedtest = Some(result);
            }
        }
    }
    wans
}

/// `wan1` → 1, `wan2` → 2; anything else is not a WAN port block.
fn wan_port_number(field: &str) -> Option<u32> {
    field
        .strip_prefix("wan")?
        .parse()
        .ok()
        .filter(|n| *n > 0)
}

fn derived_group(port: u32) -> String {
    if port == 1 {
        "WAN".to_owned()
    } else {
        format!("WAN{port}")
    }
}

fn read_speedtest(status: &Value) -> SpeedTest {
    SpeedTest {
        download_mbps: num_field(status, "xput_download"),
        upload_mbps: num_field(status, "xput_upload"),
        ping_ms: num_field(status, "latency"),
        timestamp: timestamp_field_any(status, &["rundate", "time"]),
        status: str_field(status, "status_summary").map(str::to_owned),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn gateway() -> Value {
        json!({
            "type": "ugw",
            "name": "USG",
            "wan2": { "ifname": "eth2", "networkgroup": "WAN2" },
            "wan1": { "ifname": "eth0" },
            "uplink": { "ifname": "eth2" },
            "speedtest-status": {
                "xput_download": 230.5, "xput_upload": 20.1, "latency": 12,
                "rundate": 1_700_000_000, "status_summary": "Complete"
            }
        })
    }

    #[test]
    fn wan_blocks_in_port_order_with_derived_groups() {
        let wans = LegacyStrategy.extract_interfaces(&[gateway()]);
        assert_eq!(wans.len(), 2);
        assert_eq!(wans[0].interface_name.as_deref(), Some("eth0"));
        assert_eq!(wans[0].network_group.as_deref(), Some("WAN"));
        assert_eq!(wans[1].network_group.as_deref(), Some("WAN2"));
    }

    #[test]
    fn speedtest_attaches_to_uplink_interface() {
        let wans = LegacyStrategy.extract_interfaces(&[gateway()]);
        assert!(wans[0].speedtest.is_none());
        let st = wans[1].speedtest.as_ref().expect("speedtest");
        assert_eq!(st.download_mbps, Some(230.5));
        assert_eq!(st.ping_ms, Some(12.0));
        assert_eq!(st.status.as_deref(), Some("Complete"));
        assert!(st.timestamp.is_some());
    }

    #[test]
    fn explicit_interface_name_beats_uplink() {
        let mut dev = gateway();
        dev["speedtest-status"]["interface_name"] = json!("eth0");
        let wans = LegacyStrategy.extract_interfaces(&[dev]);
        assert!(wans[0].speedtest.is_some());
        assert!(wans[1].speedtest.is_none());
    }

    #[test]
    fn unknown_target_falls_back_to_first_wan() {
        let mut dev = gateway();
        dev["uplink"] = json!({ "ifname": "eth7" });
        let wans = LegacyStrategy.extract_interfaces(&[dev]);
        assert!(wans[0].speedtest.is_some());
    }

    #[test]
    fn non_gateway_devices_are_skipped() {
        let raw = vec![
            json!({ "type": "usw", "wan1": { "ifname": "eth0" } }),
            json!({ "type": "uap" }),
        ];
        assert!(LegacyStrategy.extract_interfaces(&raw).is_empty());
    }

    #[test]
    fn port_numbers() {
        assert_eq!(wan_port_number("wan"), None);
        assert_eq!(wan_port_number("wan1"), Some(1));
        assert_eq!(wan_port_number("wan12"), Some(12));
        assert_eq!(wan_port_number("wan_ip"), None);
        assert_eq!(wan_port_number("wan0"), None);
        assert_eq!(wan_port_number("lan1"), None);
    }

    #[test]
    fn routing_matches_zero_network_and_mask() {
        let raw = vec![
            json!({ "network": "10.0.0.0", "netmask": "255.0.0.0", "interface": "eth1" }),
            json!({ "network": "0.0.0.0", "netmask": "0.0.0.0", "interface": "eth2" }),
            json!({ "network": "0.0.0.0", "netmask": 0, "interface": "eth0" }),
        ];
        let snap = LegacyStrategy.parse_routing(&raw).expect("routing");
        assert_eq!(snap.default_routes, vec!["eth2".to_string(), "eth0".to_string()]);
    }

    #[test]
    fn routing_in_udm_shape_is_absent() {
        let raw = vec![json!({ "pfx": "0.0.0.0/0", "nh": [{ "intf": "eth9" }] })];
        assert!(LegacyStrategy.parse_routing(&raw).is_none());
    }

    #[test]
    fn config_reads_primary_flag() {
        let raw = vec![
            json!({ "purpose": "wan", "wan_networkgroup": "WAN", "primary": false }),
            json!({ "purpose": "wan", "wan_networkgroup": "WAN2", "primary": true }),
        ];
        let snap = LegacyStrategy.parse_config(&raw).expect("config");
        assert_eq!(snap.designated().collect::<Vec<_>>(), vec!["WAN2"]);
    }

    #[test]
    fn config_prefers_is_primary_over_primary() {
        let raw = vec![
            json!({ "purpose": "wan", "wan_networkgroup": "WAN", "is_primary": false, "primary": true }),
            json!({ "purpose": "wan", "wan_networkgroup": "WAN2", "is_primary": true }),
        ];
        let snap = LegacyStrategy.parse_config(&raw).expect("config");
        assert_eq!(snap.designated().collect::<Vec<_>>(), vec!["WAN2"]);
    }

    #[test]
    fn config_without_wan_networks_is_absent() {
        let raw = vec![json!({ "purpose": "corporate", "name": "LAN" })];
        assert!(LegacyStrategy.parse_config(&raw).is_none());
    }
}
