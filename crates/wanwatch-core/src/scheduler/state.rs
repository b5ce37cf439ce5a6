use std::time::Duration;

use serde::Serialize;
use strum::Display;

/// Observable state of one profile's polling loop.
///
/// `Succeeded` and `Failed` are resting states: the loop sits in them
/// until the next timer fires and it moves to `Fetching` again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Display)]
#[serde(tag = "state", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PollState {
    /// Not polled yet.
    Idle,
    /// A cycle is in flight.
    Fetching,
    /// Last cycle published a snapshot.
    Succeeded,
    /// Last cycle failed; the next attempt runs after `retry_in`.
    Failed { attempt: u32, retry_in: Duration },
    /// Repeated auth failures. The timer is stopped; only a manual poll
    /// can resume it.
    Suspended { reason: String },
}

impl PollState {
    pub fn is_suspended(&self) -> bool {
        matches!(self, Self::Suspended { .. })
    }
}

/// Answer to a manual poll request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ManualPoll {
    /// A cycle was started now.
    Started,
    /// A cycle is already in flight; nothing was queued.
    Skipped,
    /// Too soon after the previous cycle; one poll will run at the end of
    /// the spacing window.
    Deferred { after: Duration },
}
