// UniFi OS payloads
//
// WAN list: v2 speed-test history, one record per run, tagged with the
// interface and WAN group it measured. Routing: `{pfx, nh: [{intf, t}]}`,
// or the flat `{network, netmask, interface}` rows some firmware still
// returns. Network config: WAN networks flag `is_primary` or `primary`.

use std::collections::HashMap;

use serde_json::Value;
use wanwatch_api::ApiFamily;

use super::{
    FamilyStrategy, RawWan, default_route_interface, num_field, primary_flag, str_field,
    str_field_any, timestamp_field_any,
};
use crate::model::{NetworkConfigSnapshot, RoutingSnapshot, SpeedTest};

const TIME_FIELDS: &[&str] = &["time", "timestamp", "rundate"];

#[derive(Debug, Clone, Copy, Default)]
pub struct UdmStrategy;

impl FamilyStrategy for UdmStrategy {
    fn family(&self) -> ApiFamily {
        ApiFamily::Udm
    }

    fn extract_interfaces(&self, raw: &[Value]) -> Vec<RawWan> {
        // (interface_name, group) -> index into `out`, first appearance wins the slot
        let mut slots: HashMap<(Option<String>, Option<String>), usize> = HashMap::new();
        let mut out: Vec<RawWan> = Vec::new();

        for record in raw.iter().filter(|r| r.is_object()) {
            let name = str_field(record, "interface_name").map(str::to_owned);
            let group = str_field(record, "wan_networkgroup").map(str::to_owned);
            let candidate = RawWan {
                interface_name: name.clone(),
                network_group: group.clone(),
                controller_id: str_field_any(record, &["_id", "id"]).map(str::to_owned),
                speedtest: read_speedtest(record),
            };

            match slots.get(&(name.clone(), group.clone())) {
                Some(&idx) => {
                    if newer(&candidate, &out[idx]) {
                        out[idx] = candidate;
                    }
                }
                None => {
                    slots.insert((name, group), out.len());
                    out.push(candidate);
                }
            }
        }
        out
    }

    fn parse_routing(&self, raw: &[Value]) -> Option<RoutingSnapshot> {
        let mut default_routes: Vec<String> = Vec::new();

        let mut push = |intf: &str| {
            if !default_routes.iter().any(|r| r == intf) {
                default_routes.push(intf.to_owned());
            }
        };

        for route in raw {
            if let Some(intf) = default_route_interface(route) {
                push(intf);
                continue;
            }
            if str_field(route, "pfx") != Some("0.0.0.0/0") {
                continue;
            }
            let Some(hops) = route.get("nh").and_then(Value::as_array) else {
                continue;
            };
            for hop in hops {
                let Some(intf) = str_field(hop, "intf") else {
                    continue;
                };
                if str_field(hop, "t").is_none_or(|t| t.contains('>') || t.contains('*')) {
                    push(intf);
                }
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

fn read_speedtest(record: &Value) -> Option<SpeedTest> {
    let st = SpeedTest {
        download_mbps: num_field(record, "download_mbps"),
        upload_mbps: num_field(record, "upload_mbps"),
        ping_ms: num_field(record, "latency_ms"),
        timestamp: timestamp_field_any(record, TIME_FIELDS),
        status: str_field(record, "status").map(str::to_owned),
    };
    (!st.is_empty()).then_some(st)
}

fn newer(candidate: &RawWan, current: &RawWan) -> bool {
    let ts = |w: &RawWan| w.speedtest.as_ref().and_then(|s| s.timestamp);
    ts(candidate) > ts(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn keeps_newest_result_per_interface() {
        let raw = vec![
            json!({ "interface_name": "eth9", "wan_networkgroup": "WAN", "time": 1_700_000_000,
                    "download_mbps": 100.0, "upload_mbps": 10.0, "latency_ms": 9.0 }),
            json!({ "interface_name": "eth10", "wan_networkgroup": "WAN2", "time": 1_700_000_100,
                    "download_mbps": 50.0, "upload_mbps": 5.0 }),
            json!({ "interface_name": "eth9", "wan_networkgroup": "WAN", "time": 1_700_000_500,
                    "download_mbps": 900.0, "upload_mbps": 40.0, "latency_ms": 4.0, "status": "ok" }),
            json!({ "interface_name": "eth9", "wan_networkgroup": "WAN", "time": 1_699_000_000,
                    "download_mbps": 1.0, "upload_mbps": 1.0 }),
        ];
        let wans = UdmStrategy.extract_interfaces(&raw);
        assert_eq!(wans.len(), 2);
        assert_eq!(wans[0].interface_name.as_deref(), Some("eth9"));
        let st = wans[0].speedtest.as_ref().expect("speedtest");
        assert_eq!(st.download_mbps, Some(900.0));
        assert_eq!(st.ping_ms, Some(4.0));
        assert_eq!(st.status.as_deref(), Some("ok"));
        assert_eq!(wans[1].network_group.as_deref(), Some("WAN2"));
    }

    #[test]
    fn record_without_measurements_has_no_speedtest() {
        let raw = vec![json!({ "interface_name": "eth9", "wan_networkgroup": "WAN", "time": 1 })];
        let wans = UdmStrategy.extract_interfaces(&raw);
        assert_eq!(wans.len(), 1);
        assert!(wans[0].speedtest.is_none());
    }

    #[test]
    fn non_objects_are_ignored() {
        let raw = vec![json!("garbage"), json!(42), json!(null)];
        assert!(UdmStrategy.extract_interfaces(&raw).is_empty());
    }

    #[test]
    fn routing_picks_selected_default_next_hops() {
        let raw = vec![
            json!({ "pfx": "192.168.1.0/24", "nh": [{ "intf": "br0", "t": "C>*" }] }),
            json!({ "pfx": "0.0.0.0/0", "nh": [
                { "intf": "eth9", "t": "S>*" },
                { "intf": "eth10", "t": "S" },
            ]}),
        ];
        let snap = UdmStrategy.parse_routing(&raw).expect("routing");
        assert_eq!(snap.default_routes, vec!["eth9".to_string()]);
    }

    #[test]
    fn routing_without_flags_counts_every_hop() {
        let raw = vec![json!({ "pfx": "0.0.0.0/0", "nh": [{ "intf": "eth9" }, { "intf": "eth10" }, { "intf": "eth9" }] })];
        let snap = UdmStrategy.parse_routing(&raw).expect("routing");
        assert_eq!(snap.default_routes, vec!["eth9".to_string(), "eth10".to_string()]);
    }

    #[test]
    fn routing_without_default_is_absent() {
        assert!(UdmStrategy.parse_routing(&[]).is_none());
        let raw = vec![json!({ "pfx": "10.0.0.0/8", "nh": [{ "intf": "eth9", "t": "S>*" }] })];
        assert!(UdmStrategy.parse_routing(&raw).is_none());
    }

    #[test]
    fn routing_accepts_flat_network_rows() {
        let raw = vec![
            json!({ "network": "192.168.1.0", "netmask": "255.255.255.0", "interface": "br0" }),
            json!({ "network": "0.0.0.0", "netmask": "0.0.0.0", "interface": "eth0" }),
        ];
        let snap = UdmStrategy.parse_routing(&raw).expect("routing");
        assert_eq!(snap.default_routes, vec!["eth0".to_string()]);
    }

    #[test]
    fn config_falls_back_to_primary_flag() {
        let raw = vec![
            json!({ "purpose": "wan", "wan_networkgroup": "WAN", "primary": true }),
            json!({ "purpose": "wan", "wan_networkgroup": "WAN2", "is_primary": false, "primary": true }),
        ];
        let snap = UdmStrategy.parse_config(&raw).expect("config");
        assert_eq!(snap.designated().collect::<Vec<_>>(), vec!["WAN"]);
    }

    #[test]
    fn config_reads_is_primary_on_wan_networks() {
        let raw = vec![
            json!({ "purpose": "wan", "wan_networkgroup": "WAN", "is_primary": true }),
            json!({ "purpose": "wan", "name": "Backup", "is_primary": false }),
            json!({ "purpose": "corporate", "name": "LAN", "is_primary": true }),
        ];
        let snap = UdmStrategy.parse_config(&raw).expect("config");
        assert_eq!(snap.designations.len(), 2);
        assert_eq!(snap.designated().collect::<Vec<_>>(), vec!["WAN"]);
    }
}
