// HTTP transport for controller sessions.
//
// Every gateway client is session based, so the built client always owns a
// cookie jar. The per-request timeout bounds a whole round trip; connecting
// is capped separately so an unreachable controller fails fast.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;

use crate::error::Error;

/// Longest time spent establishing a TCP/TLS connection.
pub const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// How the controller's certificate is checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsMode {
    /// System certificate store.
    #[default]
    System,
    /// A custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (self-signed gateways).
    DangerAcceptInvalid,
}

/// Settings for the HTTP client behind a `GatewayClient`.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    pub fn new(tls: TlsMode, timeout: Duration) -> Self {
        Self { tls, timeout }
    }

    /// Connect timeout: the request timeout, capped at `MAX_CONNECT_TIMEOUT`.
    pub fn connect_timeout(&self) -> Duration {
        self.timeout.min(MAX_CONNECT_TIMEOUT)
    }

    /// Build a `reqwest::Client` with a fresh session cookie jar.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout())
            .cookie_provider(Arc::new(Jar::default()))
            .user_agent(concat!("wanwatch/", env!("CARGO_PKG_VERSION")));

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                builder = builder.add_root_certificate(load_ca(path)?);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

fn load_ca(path: &Path) -> Result<reqwest::Certificate, Error> {
    let pem = std::fs::read(path)
        .map_err(|e| Error::Tls(format!("failed to read CA cert {}: {e}", path.display())))?;
    reqwest::Certificate::from_pem(&pem)
        .map_err(|e| Error::Tls(format!("invalid CA cert {}: {e}", path.display())))
}
