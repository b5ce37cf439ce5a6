// Gateway response envelopes
//
// The classic endpoints wrap every payload in `{ meta: { rc, msg }, data }`.
// v2 endpoints skip the envelope and return either a bare array or an
// object carrying `data`. Record bodies stay as `serde_json::Value`: field
// presence varies too much across firmware for strict structs, and the
// normalizer in `wanwatch-core` owns their interpretation.

use serde::Deserialize;

/// Standard UniFi classic API response envelope.
#[derive(Debug, Deserialize)]
pub struct LegacyResponse<T> {
    pub meta: Meta,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// Metadata from the classic envelope. `rc` == `"ok"` means success.
#[derive(Debug, Deserialize)]
pub struct Meta {
    pub rc: String,
    #[serde(default)]
    pub msg: Option<String>,
}

/// A v2 payload: bare list or `{ "data": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum V2Response<T> {
    List(Vec<T>),
    Wrapped {
        #[serde(default = "Vec::new")]
        data: Vec<T>,
    },
}

impl<T> V2Response<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::List(items) | Self::Wrapped { data: items } => items,
        }
    }
}
