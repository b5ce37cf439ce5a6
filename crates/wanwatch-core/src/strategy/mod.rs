// ── Per-family payload strategies ──
//
// The two controller families describe the same WAN state with different
// payload shapes. Each family gets one concrete `FamilyStrategy`; callers
// pick it by `ApiFamily` and never test for field presence across families.
// Key reconciliation and discovery numbering are shared and live here.

mod legacy;
mod udm;

use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use wanwatch_api::ApiFamily;

use crate::model::{NetworkConfigSnapshot, RoutingSnapshot, SpeedTest, WanInterface};

pub use legacy::LegacyStrategy;
pub use udm::UdmStrategy;

/// One WAN candidate as read from a raw payload, before keys are assigned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawWan {
    pub interface_name: Option<String>,
    pub network_group: Option<String>,
    pub controller_id: Option<String>,
    pub speedtest: Option<SpeedTest>,
}

/// Family-specific interpretation of controller payloads.
///
/// Every method is pure and total: unknown shapes produce empty or
/// absent results, never errors.
pub trait FamilyStrategy: Send + Sync {
    fn family(&self) -> ApiFamily;

    /// WAN candidates in discovery order.
    fn extract_interfaces(&self, raw: &[Value]) -> Vec<RawWan>;

    /// Default-route interfaces, or `None` when the table has none.
    fn parse_routing(&self, raw: &[Value]) -> Option<RoutingSnapshot>;

    /// Primary designations of WAN networks, or `None` when there are none.
    fn parse_config(&self, raw: &[Value]) -> Option<NetworkConfigSnapshot>;
}

static UDM: UdmStrategy = UdmStrategy;
static LEGACY: LegacyStrategy = LegacyStrategy;

/// The strategy for a controller family.
pub fn strategy_for(family: ApiFamily) -> &'static dyn FamilyStrategy {
    match family {
        ApiFamily::Udm => &UDM,
        ApiFamily::Legacy => &LEGACY,
    }
}

/// Convert raw WAN records into canonical interfaces.
///
/// Deterministic: `wan_number` is discovery order and keys are derived
/// only from the record contents.
pub fn normalize(raw: &[Value], family: ApiFamily) -> Vec<WanInterface> {
    let candidates = strategy_for(family).extract_interfaces(raw);
    let mut taken: HashSet<String> = HashSet::new();

    candidates
        .into_iter()
        .enumerate()
        .map(|(wan_number, cand)| {
            let key = unique_key(base_key(&cand, wan_number), &mut taken);
            WanInterface {
                key,
                interface_name: cand.interface_name,
                network_group: cand.network_group,
                controller_id: cand.controller_id,
                wan_number,
                speedtest: cand.speedtest,
                is_primary: false,
            }
        })
        .collect()
}

/// Parse a routing payload with the family's rules.
pub fn parse_routing(raw: &[Value], family: ApiFamily) -> Option<RoutingSnapshot> {
    strategy_for(family).parse_routing(raw)
}

/// Parse a network-config payload with the family's rules.
pub fn parse_config(raw: &[Value], family: ApiFamily) -> Option<NetworkConfigSnapshot> {
    strategy_for(family).parse_config(raw)
}

fn base_key(cand: &RawWan, wan_number: usize) -> String {
    match (&cand.interface_name, &cand.network_group, &cand.controller_id) {
        (Some(name), Some(group), _) => format!("{name}_{group}"),
        (_, _, Some(id)) => id.clone(),
        (Some(name), None, None) => name.clone(),
        (None, Some(group), None) => group.clone(),
        (None, None, None) => format!("wan{}", wan_number + 1),
    }
}

/// `base`, or the first free `base#n` (n ≥ 2) when an earlier interface
/// already holds it. Suffixed keys are checked too, since a controller id
/// may itself look like `ppp0#2`.
fn unique_key(base: String, taken: &mut HashSet<String>) -> String {
    let key = if taken.contains(&base) {
        (2..)
            .map(|n| format!("{base}#{n}"))
            .find(|candidate| !taken.contains(candidate))
            .unwrap_or(base)
    } else {
        base
    };
    taken.insert(key.clone());
    key
}

// ── Shared field readers ─────────────────────────────────────────────

/// Non-empty string field.
pub(crate) fn str_field<'a>(obj: &'a Value, field: &str) -> Option<&'a str> {
    obj.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// First present string among several field names.
pub(crate) fn str_field_any<'a>(obj: &'a Value, fields: &[&str]) -> Option<&'a str> {
    fields.iter().find_map(|f| str_field(obj, f))
}

/// Number field, accepting numeric strings as firmware sometimes sends them.
pub(crate) fn num_field(obj: &Value, field: &str) -> Option<f64> {
    match obj.get(field)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Boolean field, accepting `0`/`1` and `"true"`/`"false"`.
pub(crate) fn bool_field(obj: &Value, field: &str) -> Option<bool> {
    match obj.get(field)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Primary designation of a network-config entry: `is_primary`, else
/// `primary`, else false.
pub(crate) fn primary_flag(entry: &Value) -> bool {
    bool_field(entry, "is_primary")
        .or_else(|| bool_field(entry, "primary"))
        .unwrap_or(false)
}

/// Interface of a flat `{network, netmask, interface}` row routing
/// `0.0.0.0/0`.
pub(crate) fn default_route_interface(route: &Value) -> Option<&str> {
    let zero_mask = match route.get("netmask") {
        Some(Value::String(m)) => m == "0.0.0.0" || m == "0",
        Some(Value::Number(n)) => n.as_u64() == Some(0),
        _ => false,
    };
    if str_field(route, "network") == Some("0.0.0.0") && zero_mask {
        str_field(route, "interface")
    } else {
        None
    }
}

/// Epoch seconds, epoch milliseconds, or RFC 3339.
pub(crate) fn timestamp_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => epoch(n.as_f64()?),
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(epoch))
        }
        _ => None,
    }
}

/// First parseable timestamp among several field names.
pub(crate) fn timestamp_field_any(obj: &Value, fields: &[&str]) -> Option<DateTime<Utc>> {
    fields
        .iter()
        .find_map(|f| obj.get(*f).and_then(timestamp_value))
}

// Values past year 5138 in seconds are taken as milliseconds.
const MILLIS_THRESHOLD: f64 = 100_000_000_000.0;

#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn epoch(raw: f64) -> Option<DateTime<Utc>> {
    if !raw.is_finite() || raw <= 0.0 {
        return None;
    }
    let millis = if raw >= MILLIS_THRESHOLD {
        raw
    } else {
        raw * 1000.0
    };
    Utc.timestamp_millis_opt(millis as i64).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn timestamps_accept_seconds_millis_and_rfc3339() {
        let secs = timestamp_value(&json!(1_700_000_000)).expect("secs");
        let millis = timestamp_value(&json!(1_700_000_000_000_i64)).expect("millis");
        let text = timestamp_value(&json!("2023-11-14T22:13:20Z")).expect("rfc3339");
        assert_eq!(secs, millis);
        assert_eq!(secs, text);
        assert!(timestamp_value(&json!("yesterday")).is_none());
        assert!(timestamp_value(&json!(0)).is_none());
    }

    #[test]
    fn numbers_and_bools_tolerate_strings() {
        let obj = json!({ "a": "12.5", "b": 3, "c": "true", "d": 0, "e": null });
        assert_eq!(num_field(&obj, "a"), Some(12.5));
        assert_eq!(num_field(&obj, "b"), Some(3.0));
        assert_eq!(bool_field(&obj, "c"), Some(true));
        assert_eq!(bool_field(&obj, "d"), Some(false));
        assert_eq!(bool_field(&obj, "e"), None);
    }

    #[test]
    fn duplicate_keys_get_suffixes() {
        let raw = vec![
            json!({ "interface_name": "eth9", "wan_networkgroup": "WAN" }),
            json!({ "interface_name": "ppp0" }),
            json!({ "_id": "ppp0" }),
        ];
        let wans = normalize(&raw, ApiFamily::Udm);
        let keys: Vec<&str> = wans.iter().map(|w| w.key.as_str()).collect();
        assert_eq!(keys, ["eth9_WAN", "ppp0", "ppp0#2"]);
        let numbers: Vec<usize> = wans.iter().map(|w| w.wan_number).collect();
        assert_eq!(numbers, [0, 1, 2]);
    }

    #[test]
    fn suffixed_keys_never_collide_with_controller_ids() {
        let raw = vec![
            json!({ "interface_name": "ppp0" }),
            json!({ "_id": "ppp0" }),
            json!({ "_id": "ppp0#2", "wan_networkgroup": "X" }),
            json!({ "_id": "ppp0", "wan_networkgroup": "Y" }),
        ];
        let wans = normalize(&raw, ApiFamily::Udm);
        let keys: Vec<&str> = wans.iter().map(|w| w.key.as_str()).collect();
        assert_eq!(keys, ["ppp0", "ppp0#2", "ppp0#2#2", "ppp0#3"]);
        let distinct: HashSet<&str> = keys.iter().copied().collect();
        assert_eq!(distinct.len(), keys.len());
    }

    #[test]
    fn anonymous_candidates_fall_back_to_position() {
        let cands = [RawWan::default(), RawWan::default()];
        let keys: Vec<String> = cands
            .iter()
            .enumerate()
            .map(|(n, c)| base_key(c, n))
            .collect();
        assert_eq!(keys, ["wan1", "wan2"]);
    }

    #[test]
    fn key_prefers_name_and_group_then_controller_id() {
        let both = RawWan {
            interface_name: Some("eth8".into()),
            network_group: Some("WAN".into()),
            controller_id: Some("abc".into()),
            speedtest: None,
        };
        assert_eq!(base_key(&both, 0), "eth8_WAN");

        let id_only = RawWan {
            interface_name: Some("eth8".into()),
            controller_id: Some("abc".into()),
            ..RawWan::default()
        };
        assert_eq!(base_key(&id_only, 0), "abc");
    }
}
