// ── Runtime profile configuration ──
//
// These types describe *which* controller to poll and *how often*.
// They carry credential data and scheduling policy, but never touch disk.
// The CLI builds a `ControllerProfile` and hands it to the scheduler.

use std::fmt;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;
use wanwatch_api::ApiFamily;

use crate::error::CoreError;

// ── Policy constants ─────────────────────────────────────────────────

const MINUTE: u64 = 60;

/// Poll cadence when nothing is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30 * MINUTE);
/// Fastest cadence a controller is ever polled at.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(10 * MINUTE);
/// Slowest configurable cadence.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(240 * MINUTE);
/// Minimum spacing between manually requested polls.
pub const MANUAL_POLL_SPACING: Duration = Duration::from_secs(60);
/// First retry delay after a failed cycle.
pub const BACKOFF_BASE: Duration = Duration::from_secs(60);
/// Longest retry delay after repeated failures.
pub const BACKOFF_MAX: Duration = Duration::from_secs(15 * MINUTE);
/// Consecutive auth failures before a profile is suspended.
pub const MAX_AUTH_FAILURES: u32 = 3;

pub const DEFAULT_SPEED_TEST_INTERVAL: Duration = Duration::from_secs(90 * MINUTE);
pub const MIN_SPEED_TEST_INTERVAL: Duration = Duration::from_secs(15 * MINUTE);
pub const MAX_SPEED_TEST_INTERVAL: Duration = Duration::from_secs(1440 * MINUTE);

// ── ProfileId ────────────────────────────────────────────────────────

/// Name of a configured controller profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProfileId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for ProfileId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ── Credentials & TLS ────────────────────────────────────────────────

/// Session credentials for a controller login.
#[derive(Debug, Clone)]
pub struct AuthCredentials {
    pub username: String,
    pub password: SecretString,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

// ── Speed-test schedule ──────────────────────────────────────────────

/// Periodic controller-side speed tests (standalone controllers only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedTestSchedule {
    pub enabled: bool,
    pub interval: Duration,
}

impl Default for SpeedTestSchedule {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: DEFAULT_SPEED_TEST_INTERVAL,
        }
    }
}

impl SpeedTestSchedule {
    /// Build a schedule, clamping the interval into the accepted range.
    pub fn new(enabled: bool, interval: Duration) -> Self {
        Self {
            enabled,
            interval: interval.clamp(MIN_SPEED_TEST_INTERVAL, MAX_SPEED_TEST_INTERVAL),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

// ── Poll policy ──────────────────────────────────────────────────────

/// Scheduling policy for one profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub manual_spacing: Duration,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    pub max_auth_failures: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::with_interval(DEFAULT_POLL_INTERVAL)
    }
}

impl PollPolicy {
    /// Policy with the given interval clamped to `[10 min, 240 min]`.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval: interval.clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL),
            manual_spacing: MANUAL_POLL_SPACING,
            backoff_base: BACKOFF_BASE,
            backoff_max: BACKOFF_MAX,
            max_auth_failures: MAX_AUTH_FAILURES,
        }
    }

    /// Resolve the poll interval for a profile.
    ///
    /// Without an explicit interval the cadence follows the speed-test
    /// schedule (when one applies) so fresh results are picked up soon
    /// after they land. An explicit interval must stay below the
    /// speed-test interval, otherwise every other result would be missed.
    pub fn resolve(
        configured: Option<Duration>,
        schedule: Option<&SpeedTestSchedule>,
    ) -> Result<Self, CoreError> {
        let active = schedule.filter(|s| s.enabled);
        match (configured, active) {
            (None, None) => Ok(Self::default()),
            (None, Some(s)) => Ok(Self::with_interval(derive_poll_interval(s.interval))),
            (Some(interval), active) => {
                let policy = Self::with_interval(interval);
                if let Some(s) = active {
                    if policy.interval >= s.interval {
                        return Err(CoreError::ValidationFailed {
                            message: format!(
                                "poll interval ({} min) must be shorter than the speed-test interval ({} min)",
                                policy.interval.as_secs() / MINUTE,
                                s.interval.as_secs() / MINUTE,
                            ),
                        });
                    }
                }
                Ok(policy)
            }
        }
    }

    /// Backoff ceiling: never longer than the regular cadence.
    pub fn backoff_cap(&self) -> Duration {
        self.backoff_max.min(self.interval)
    }
}

/// Poll cadence derived from a speed-test interval.
///
/// Short schedules poll at a third of the interval, medium ones at half,
/// long ones at a third again, each with a floor.
pub fn derive_poll_interval(speed_test: Duration) -> Duration {
    let s = speed_test.as_secs() / MINUTE;
    let minutes = if s <= 30 {
        (s / 3).max(10)
    } else if s <= 60 {
        (s / 2).max(15)
    } else {
        (s / 3).max(20)
    };
    Duration::from_secs(minutes * MINUTE)
}

// ── ControllerProfile ────────────────────────────────────────────────

/// One configured controller target.
///
/// Built by the CLI, passed to the scheduler. Immutable for the lifetime
/// of its polling loop; changing it means removing and re-adding.
#[derive(Debug, Clone)]
pub struct ControllerProfile {
    pub id: ProfileId,
    /// Controller URL (e.g., `https://192.168.1.1`).
    pub url: Url,
    pub auth: AuthCredentials,
    pub family: ApiFamily,
    /// Site to poll (defaults to "default").
    pub site: String,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    pub poll: PollPolicy,
    /// Only honoured for families that accept a speed-test trigger.
    pub speed_test: SpeedTestSchedule,
}

impl ControllerProfile {
    /// The speed-test schedule, if this profile's family can run one.
    pub fn active_speed_test(&self) -> Option<SpeedTestSchedule> {
        (self.family.supports_speed_test_trigger() && self.speed_test.enabled)
            .then_some(self.speed_test)
    }
}
