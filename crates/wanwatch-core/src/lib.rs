//! Primary-WAN resolution and polling pipeline between `wanwatch-api` and
//! its consumers.
//!
//! - **[`PollScheduler`]**: one polling loop per [`ControllerProfile`], with
//!   a cadence floor, manual-poll spacing, exponential backoff, and
//!   suspension after repeated auth failures.
//! - **Normalizer / inspector** ([`strategy`]): one [`FamilyStrategy`] per
//!   controller family turns raw payloads into [`WanInterface`] records,
//!   a [`RoutingSnapshot`] and a [`NetworkConfigSnapshot`].
//! - **[`resolve()`]**: the tiered primary decision (routing, config,
//!   speed test, fallback).
//! - **[`SnapshotRegistry`]**: latest [`Snapshot`] per profile, swapped
//!   atomically and broadcast to subscribers.
//! - **[`WanSource`]**: the network seam; [`GatewaySource`] is the live
//!   implementation.

pub mod config;
pub mod error;
pub mod model;
pub mod publish;
pub mod resolve;
pub mod scheduler;
pub mod source;
pub mod strategy;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{
    AuthCredentials, ControllerProfile, PollPolicy, ProfileId, SpeedTestSchedule,
    TlsVerification,
};
pub use error::{CoreError, ErrorKind};
pub use model::{
    NetworkConfigSnapshot, ResolutionMethod, ResolutionResult, RoutingSnapshot, Snapshot,
    SpeedTest, SpeedTestOutcome, WanInterface,
};
pub use publish::SnapshotRegistry;
pub use resolve::resolve;
pub use scheduler::{ManualPoll, PollScheduler, PollState, poll_once};
pub use source::{GatewaySource, WanSource};
pub use strategy::{FamilyStrategy, normalize, parse_config, parse_routing, strategy_for};

pub use wanwatch_api::ApiFamily;
