use thiserror::Error;

/// Top-level error type for the `wanwatch-api` crate.
///
/// Covers every failure mode of a controller round trip: authentication,
/// transport, envelope-level API errors, and payload decoding.
/// `wanwatch-core` folds these into its coarser `ErrorKind` taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed or the controller answered HTTP 401.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Controller answered HTTP 403. UniFi OS also returns this when a
    /// client polls too aggressively, so it is classified as an auth failure
    /// and never hammered.
    #[error("Access denied (HTTP 403): {message}")]
    PermissionDenied { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Controller asked us to slow down (HTTP 429).
    #[error("Rate limited -- retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    // ── Controller API ──────────────────────────────────────────────
    /// Non-success status or a `{meta: {rc: "error"}}` envelope.
    #[error("Controller API error{}: {message}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Api { message: String, status: Option<u16> },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Platform ────────────────────────────────────────────────────
    /// Operation not supported by this controller's API family.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),
}

impl Error {
    /// Returns `true` if the controller rejected our credentials or session.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. } | Self::PermissionDenied { .. }
        )
    }

    /// Returns `true` if auth has expired and a fresh login might resolve it.
    ///
    /// 403 is deliberately excluded: logging in again does not lift a
    /// permission or rate-limit rejection.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::RateLimited { .. } => true,
            Self::Api { status: Some(s), .. } => *s >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the payload arrived but could not be decoded.
    pub fn is_decode(&self) -> bool {
        match self {
            Self::Deserialization { .. } => true,
            Self::Transport(e) => e.is_decode(),
            _ => false,
        }
    }
}
