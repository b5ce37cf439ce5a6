//! Async client for the UniFi controller endpoints that describe WAN state.
//!
//! Two API families are supported, selected per controller by [`ApiFamily`]:
//! UniFi OS consoles (`/proxy/network` prefix, `/api/auth/login`) and
//! standalone Network Application controllers. [`GatewayClient`] owns the
//! session cookie jar and CSRF token and returns raw JSON payloads.

pub mod auth;
pub mod error;
pub mod gateway;
pub mod transport;

pub use auth::ApiFamily;
pub use error::Error;
pub use gateway::GatewayClient;
pub use transport::{TlsMode, TransportConfig};
