//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use wanwatch_config::ConfigError;
use wanwatch_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to controller at {url}")]
    #[diagnostic(
        code(wanwatch::connection_failed),
        help(
            "Check that the controller is running and reachable.\n\
             Self-signed certificate? Try --insecure (-k) or set ca_cert in the profile.\n\
             Detail: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request to {url} timed out")]
    #[diagnostic(
        code(wanwatch::timeout),
        help("Increase the timeout with --timeout or check controller responsiveness.")
    )]
    Timeout { url: String },

    #[error("Rate limited by the controller")]
    #[diagnostic(
        code(wanwatch::rate_limited),
        help("Wait {retry_after_secs}s before polling again.")
    )]
    RateLimited { retry_after_secs: u64 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(wanwatch::auth_failed),
        help(
            "Verify the username and password for this profile.\n\
             Local controller accounts are required; cloud SSO logins are rejected."
        )
    )]
    AuthFailed { message: String },

    #[error("Access denied: {message}")]
    #[diagnostic(
        code(wanwatch::permission_denied),
        help("The account lacks access to this site, or the controller is throttling logins.")
    )]
    PermissionDenied { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(wanwatch::no_credentials),
        help(
            "Set `username` in the profile (or pass --username) and provide the password\n\
             via WANWATCH_PASSWORD, the system keyring (service 'wanwatch', entry\n\
             '{profile}/password'), or `password` in the profile."
        )
    )]
    NoCredentials { profile: String },

    // ── Operations ───────────────────────────────────────────────────
    #[error("Operation '{operation}' is not supported by this controller")]
    #[diagnostic(code(wanwatch::unsupported))]
    Unsupported { operation: String },

    #[error("Controller API error{}: {message}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    #[diagnostic(code(wanwatch::api_error))]
    ApiError { message: String, status: Option<u16> },

    #[error("Unexpected controller response: {message}")]
    #[diagnostic(
        code(wanwatch::decode),
        help("Run with -vv to see the raw requests; the controller version may be unsupported.")
    )]
    Decode { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(wanwatch::validation))]
    Validation { field: String, reason: String },

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(code(wanwatch::profile_not_found), help("Available profiles: {available}"))]
    ProfileNotFound { name: String, available: String },

    #[error("No controller configured")]
    #[diagnostic(
        code(wanwatch::no_config),
        help(
            "Pass --controller and --username, or add a profile to the config file.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(wanwatch::config))]
    Config { message: String },

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::PermissionDenied { .. } | Self::Unsupported { .. } => exit_code::PERMISSION,
            Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NoConfig { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::PermissionDenied { message } => Self::PermissionDenied { message },
            CoreError::Timeout { url } => Self::Timeout { url },
            CoreError::RateLimited { retry_after_secs } => Self::RateLimited { retry_after_secs },
            CoreError::Decode { message } => Self::Decode { message },
            CoreError::ProfileNotFound { profile } => Self::ProfileNotFound {
                name: profile,
                available: String::new(),
            },
            CoreError::Unsupported { operation } => Self::Unsupported { operation },
            CoreError::ValidationFailed { message } => Self::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::Api { message, status } => Self::ApiError { message, status },
            CoreError::Config { message } => Self::Config { message },
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::ProfileNotFound { name, available } => Self::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            },
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            other @ (ConfigError::Serialization(_) | ConfigError::Figment(_)) => Self::Config {
                message: other.to_string(),
            },
        }
    }
}
