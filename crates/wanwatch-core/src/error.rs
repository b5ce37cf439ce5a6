// ── Core error types ──
//
// User-facing errors from wanwatch-core. Consumers never see HTTP status
// codes or JSON parse failures directly: the `From<wanwatch_api::Error>`
// impl folds transport-layer errors into domain variants, and `kind()`
// collapses those into the four classes the scheduler acts on.

use strum::Display;
use thiserror::Error;

/// Coarse failure class used by the poll scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ErrorKind {
    /// Credentials rejected or session unusable. Retried only a bounded
    /// number of times before the profile is suspended.
    Auth,
    /// Network, timeout, rate-limit or server-side failure. Retried with
    /// exponential backoff.
    Transport,
    /// The controller answered with a payload we could not interpret.
    Decode,
    /// Everything else (configuration, unsupported operations, internal).
    Other,
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to controller at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Access denied: {message}")]
    PermissionDenied { message: String },

    #[error("Controller request to {url} timed out")]
    Timeout { url: String },

    #[error("Rate limited by controller -- retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Unexpected controller payload: {message}")]
    Decode { message: String },

    #[error("Unknown profile: {profile}")]
    ProfileNotFound { profile: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Operation not supported: {operation}")]
    Unsupported { operation: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Classify this error for retry decisions.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AuthenticationFailed { .. } | Self::PermissionDenied { .. } => ErrorKind::Auth,
            Self::ConnectionFailed { .. } | Self::Timeout { .. } | Self::RateLimited { .. } => {
                ErrorKind::Transport
            }
            Self::Api { status, .. } => match status {
                Some(s) if *s >= 500 => ErrorKind::Transport,
                _ => ErrorKind::Other,
            },
            Self::Decode { .. } => ErrorKind::Decode,
            Self::ProfileNotFound { .. }
            | Self::Unsupported { .. }
            | Self::ValidationFailed { .. }
            | Self::Config { .. }
            | Self::Internal(_) => ErrorKind::Other,
        }
    }

    /// Server-requested delay before the next attempt, if any.
    pub fn retry_after(&self) -> Option<std::time::Duration> {
        match self {
            Self::RateLimited { retry_after_secs } => {
                Some(std::time::Duration::from_secs(*retry_after_secs))
            }
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<wanwatch_api::Error> for CoreError {
    fn from(err: wanwatch_api::Error) -> Self {
        match err {
            wanwatch_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            wanwatch_api::Error::PermissionDenied { message } => {
                CoreError::PermissionDenied { message }
            }
            wanwatch_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                    }
                } else if e.is_decode() {
                    CoreError::Decode {
                        message: e.to_string(),
                    }
                } else if e.is_connect() || e.is_request() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            wanwatch_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            wanwatch_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            wanwatch_api::Error::RateLimited { retry_after_secs } => {
                CoreError::RateLimited { retry_after_secs }
            }
            wanwatch_api::Error::Api { message, status } => CoreError::Api { message, status },
            wanwatch_api::Error::Deserialization { message, body: _ } => {
                CoreError::Decode { message }
            }
            wanwatch_api::Error::UnsupportedOperation(op) => CoreError::Unsupported {
                operation: op.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_fold_into_scheduler_classes() {
        let auth: CoreError = wanwatch_api::Error::Authentication {
            message: "bad password".into(),
        }
        .into();
        assert_eq!(auth.kind(), ErrorKind::Auth);

        let denied: CoreError = wanwatch_api::Error::PermissionDenied {
            message: String::new(),
        }
        .into();
        assert_eq!(denied.kind(), ErrorKind::Auth);

        let decode: CoreError = wanwatch_api::Error::Deserialization {
            message: "expected array".into(),
            body: "{}".into(),
        }
        .into();
        assert_eq!(decode.kind(), ErrorKind::Decode);

        let limited: CoreError = wanwatch_api::Error::RateLimited {
            retry_after_secs: 30,
        }
        .into();
        assert_eq!(limited.kind(), ErrorKind::Transport);
        assert_eq!(limited.retry_after(), Some(std::time::Duration::from_secs(30)));
    }

    #[test]
    fn server_errors_are_transport_client_errors_are_not() {
        let server = CoreError::Api {
            message: "oops".into(),
            status: Some(503),
        };
        assert_eq!(server.kind(), ErrorKind::Transport);

        let client = CoreError::Api {
            message: "bad request".into(),
            status: Some(400),
        };
        assert_eq!(client.kind(), ErrorKind::Other);
    }
}
