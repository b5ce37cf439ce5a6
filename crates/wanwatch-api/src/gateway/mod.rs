// Gateway API client modules
//
// Hand-written client for the UniFi controller endpoints that expose WAN
// state: the classic `stat/` and `rest/` endpoints wrapped in the
// `{ meta: { rc, msg }, data: [...] }` envelope, and the v2 speed-test
// history on UniFi OS.

pub mod auth;
pub mod client;
pub mod models;
pub mod wan;

pub use client::GatewayClient;
