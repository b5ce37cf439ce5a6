//! Configuration for wanwatch.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `wanwatch_core::ControllerProfile`. The CLI layers
//! its flag overrides on top before calling [`build_profile`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use wanwatch_core::config::DEFAULT_SPEED_TEST_INTERVAL;
use wanwatch_core::{
    ApiFamily, AuthCredentials, ControllerProfile, CoreError, PollPolicy, ProfileId,
    SpeedTestSchedule, TlsVerification,
};

/// Service name under which passwords live in the system keyring.
pub const KEYRING_SERVICE: &str = "wanwatch";

/// Prefix for environment overrides (`WANWATCH_DEFAULTS__TIMEOUT=60`).
pub const ENV_PREFIX: &str = "WANWATCH_";

const USERNAME_ENV: &str = "WANWATCH_USERNAME";
const PASSWORD_ENV: &str = "WANWATCH_PASSWORD";
const REDACTED: &str = "****";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found in configuration")]
    ProfileNotFound { name: String, available: Vec<String> },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named controller profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile and build its runtime form.
    pub fn controller_profile(&self, name: &str) -> Result<ControllerProfile, ConfigError> {
        let profile = self
            .profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: name.into(),
                available: self.profiles.keys().cloned().collect(),
            })?;
        build_profile(profile, name, &self.defaults)
    }

    /// A copy with every plaintext secret masked, for display.
    pub fn redacted(&self) -> Self {
        let mut cfg = self.clone();
        for profile in cfg.profiles.values_mut() {
            if profile.password.is_some() {
                profile.password = Some(REDACTED.into());
            }
        }
        cfg
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named controller profile.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Controller base URL (e.g., "https://192.168.1.1").
    pub controller: String,

    /// `udm` for UniFi OS consoles, `legacy` for standalone controllers.
    #[serde(default = "default_family")]
    pub family: ApiFamily,

    #[serde(default = "default_site")]
    pub site: String,

    pub username: Option<String>,

    /// Plaintext password. Prefer the keyring or `password_env`.
    pub password: Option<String>,

    /// Name of an environment variable holding the password.
    pub password_env: Option<String>,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    pub insecure: Option<bool>,

    /// Per-request timeout in seconds.
    pub timeout: Option<u64>,

    /// Poll cadence in minutes. Derived from the speed-test schedule when unset.
    pub poll_interval_mins: Option<u64>,

    /// Scheduled speed tests (standalone controllers only).
    pub speed_test: Option<SpeedTestSettings>,
}

impl Profile {
    /// A profile with only a controller URL; everything else defaulted.
    pub fn new(controller: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
            family: default_family(),
            site: default_site(),
            username: None,
            password: None,
            password_env: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
            poll_interval_mins: None,
            speed_test: None,
        }
    }
}

fn default_family() -> ApiFamily {
    ApiFamily::Udm
}
fn default_site() -> String {
    "default".into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct SpeedTestSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Minutes between scheduled tests.
    #[serde(default = "default_speed_test_mins")]
    pub interval_mins: u64,
}

impl SpeedTestSettings {
    pub fn schedule(&self) -> SpeedTestSchedule {
        SpeedTestSchedule::new(self.enabled, minutes(self.interval_mins))
    }
}

fn default_true() -> bool {
    true
}
fn default_speed_test_mins() -> u64 {
    DEFAULT_SPEED_TEST_INTERVAL.as_secs() / 60
}

fn minutes(m: u64) -> Duration {
    Duration::from_secs(m.saturating_mul(60))
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "wanwatch", "wanwatch").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("wanwatch");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file; a missing file yields the defaults.
///
/// Environment variables use `__` as the nesting separator so keys with
/// underscores survive: `WANWATCH_PROFILES__HOME__SITE=branch`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "configuration loaded");
    Ok(config)
}

/// Load config, returning a default if the file is missing or broken.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// The profile to use: explicit choice, then `default_profile`, then "default".
pub fn active_profile_name(explicit: Option<&str>, config: &Config) -> String {
    explicit
        .map(String::from)
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve username + password for a profile.
///
/// Username: profile, then `WANWATCH_USERNAME`. Password: the profile's
/// `password_env`, then `WANWATCH_PASSWORD`, then the system keyring
/// (`wanwatch` / `{profile}/password`), then plaintext config.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<AuthCredentials, ConfigError> {
    resolve_credentials_with(profile, profile_name, |key| std::env::var(key).ok())
}

fn resolve_credentials_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
) -> Result<AuthCredentials, ConfigError> {
    let no_credentials = || ConfigError::NoCredentials {
        profile: profile_name.into(),
    };

    let username = profile
        .username
        .clone()
        .or_else(|| env(USERNAME_ENV))
        .ok_or_else(no_credentials)?;

    let credentials = |pw: String| AuthCredentials {
        username: username.clone(),
        password: SecretString::from(pw),
    };

    // 1. Profile-specific env var
    if let Some(pw) = profile.password_env.as_deref().and_then(&env) {
        return Ok(credentials(pw));
    }

    // 2. Global env var
    if let Some(pw) = env(PASSWORD_ENV) {
        return Ok(credentials(pw));
    }

    // 3. Keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password")) {
        if let Ok(pw) = entry.get_password() {
            debug!(profile = profile_name, "password loaded from keyring");
            return Ok(credentials(pw));
        }
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(credentials(pw.clone()));
    }

    Err(no_credentials())
}

// ── Profile translation ─────────────────────────────────────────────

/// Build a `ControllerProfile` from a TOML profile and the global defaults.
pub fn build_profile(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ControllerProfile, ConfigError> {
    let auth = resolve_credentials(profile, profile_name)?;
    assemble(profile, profile_name, defaults, auth)
}

fn assemble(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    auth: AuthCredentials,
) -> Result<ControllerProfile, ConfigError> {
    let url = parse_controller_url(&profile.controller)?;

    if profile.site.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "site".into(),
            reason: "must not be empty".into(),
        });
    }

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let timeout_secs = profile.timeout.unwrap_or(defaults.timeout);
    if timeout_secs == 0 {
        return Err(ConfigError::Validation {
            field: "timeout".into(),
            reason: "must be at least one second".into(),
        });
    }

    let speed_test = profile
        .speed_test
        .as_ref()
        .map_or_else(SpeedTestSchedule::default, SpeedTestSettings::schedule);
    let schedule = profile
        .family
        .supports_speed_test_trigger()
        .then_some(&speed_test);
    let poll = PollPolicy::resolve(profile.poll_interval_mins.map(minutes), schedule).map_err(
        |err| ConfigError::Validation {
            field: "poll_interval_mins".into(),
            reason: match err {
                CoreError::ValidationFailed { message } => message,
                other => other.to_string(),
            },
        },
    )?;

    Ok(ControllerProfile {
        id: ProfileId::from(profile_name),
        url,
        auth,
        family: profile.family,
        site: profile.site.clone(),
        tls,
        timeout: Duration::from_secs(timeout_secs),
        poll,
        speed_test,
    })
}

fn parse_controller_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::Validation {
        field: "controller".into(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(format!("invalid URL '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme '{other}' in '{raw}'"))),
    }
}
