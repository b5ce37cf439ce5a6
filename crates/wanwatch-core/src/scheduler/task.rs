// Per-profile polling loop
//
// One task per profile owns every piece of mutable scheduling state.
// The loop multiplexes cancellation, the in-flight cycle, commands from
// the scheduler handle, and three timers (regular poll, deferred manual
// poll, scheduled speed test). At most one cycle is ever in flight; a
// timer that comes due while one runs is dropped, not queued.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::backoff::Backoff;
use super::cycle::{CycleOutput, run_cycle};
use super::state::{ManualPoll, PollState};
use crate::config::{PollPolicy, ProfileId, SpeedTestSchedule};
use crate::error::{CoreError, ErrorKind};
use crate::model::{ResolutionResult, SpeedTestOutcome};
use crate::publish::SnapshotRegistry;
use crate::source::WanSource;

type CycleResult = Result<CycleOutput, CoreError>;

/// Requests from the scheduler handle to a profile loop.
pub(crate) enum Command {
    PollNow {
        reply: oneshot::Sender<ManualPoll>,
    },
    StartSpeedTest {
        reply: oneshot::Sender<Result<SpeedTestOutcome, CoreError>>,
    },
}

pub(crate) struct ProfileTask<S: WanSource> {
    profile_id: ProfileId,
    source: Arc<S>,
    policy: PollPolicy,
    backoff: Backoff,
    speed_test: Option<SpeedTestSchedule>,
    registry: Arc<SnapshotRegistry>,
    state: watch::Sender<PollState>,

    in_flight: Option<JoinHandle<CycleResult>>,
    side_tasks: JoinSet<()>,
    /// `None` while a cycle runs or the profile is suspended.
    next_due: Option<Instant>,
    deferred: Option<Instant>,
    next_speed_test: Option<Instant>,
    last_started: Option<Instant>,
    failures: u32,
    auth_failures: u32,
    suspended: bool,
    previous: Option<ResolutionResult>,
}

impl<S: WanSource> ProfileTask<S> {
    pub(crate) fn new(
        profile_id: ProfileId,
        source: S,
        policy: PollPolicy,
        speed_test: Option<SpeedTestSchedule>,
        registry: Arc<SnapshotRegistry>,
        state: watch::Sender<PollState>,
    ) -> Self {
        let now = Instant::now();
        Self {
            backoff: Backoff::exponential(policy.backoff_base, policy.backoff_cap()),
            next_speed_test: speed_test.map(|s| now + s.interval),
            profile_id,
            source: Arc::new(source),
            policy,
            speed_test,
            registry,
            state,
            in_flight: None,
            side_tasks: JoinSet::new(),
            next_due: Some(now),
            deferred: None,
            last_started: None,
            failures: 0,
            auth_failures: 0,
            suspended: false,
            previous: None,
        }
    }

    pub(crate) async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        cancel: CancellationToken,
    ) {
        info!(
            profile = %self.profile_id,
            interval_secs = self.policy.interval.as_secs(),
            speed_test = self.speed_test.is_some(),
            "polling started"
        );

        loop {
            let idle = self.in_flight.is_none();
            let next_due = self.next_due;
            let deferred = self.deferred;
            let next_speed_test = self.next_speed_test;

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                result = join_cycle(&mut self.in_flight) => self.finish_cycle(result),
                Some(command) = commands.recv() => self.handle_command(command),
                () = sleep_until(next_due.unwrap_or_else(Instant::now)), if idle && next_due.is_some() => {
                    self.start_cycle();
                }
                () = sleep_until(deferred.unwrap_or_else(Instant::now)), if deferred.is_some() => {
                    self.deferred = None;
                    if self.in_flight.is_none() {
                        debug!(profile = %self.profile_id, "running deferred manual poll");
                        self.start_cycle();
                    }
                }
                () = sleep_until(next_speed_test.unwrap_or_else(Instant::now)), if next_speed_test.is_some() => {
                    self.scheduled_speed_test();
                }
                Some(_) = self.side_tasks.join_next() => {}
            }
        }

        if let Some(handle) = self.in_flight.take() {
            handle.abort();
            let _ = handle.await;
        }
        self.side_tasks.shutdown().await;
        self.source.close().await;
        info!(profile = %self.profile_id, "polling stopped");
    }

    // ── Cycle lifecycle ──────────────────────────────────────────────

    fn start_cycle(&mut self) {
        self.last_started = Some(Instant::now());
        self.next_due = None;
        self.state.send_replace(PollState::Fetching);

        let source = Arc::clone(&self.source);
        let previous = self.previous.clone();
        self.in_flight = Some(tokio::spawn(async move {
            run_cycle(source.as_ref(), previous.as_ref()).await
        }));
    }

    fn finish_cycle(&mut self, result: CycleResult) {
        let now = Instant::now();
        match result {
            Ok(output) => {
                if self.suspended {
                    info!(profile = %self.profile_id, "controller reachable again, resuming polling");
                }
                self.suspended = false;
                self.failures = 0;
                self.auth_failures = 0;
                self.previous = Some(output.resolution.clone());
                self.registry
                    .publish(output.into_snapshot(self.profile_id.clone()));
                self.next_due = Some(now + self.policy.interval);
                self.state.send_replace(PollState::Succeeded);
            }
            Err(e) => {
                self.failures = self.failures.saturating_add(1);
                if e.kind() == ErrorKind::Auth {
                    self.auth_failures = self.auth_failures.saturating_add(1);
                } else {
                    self.auth_failures = 0;
                }

                if self.suspended || self.auth_failures >= self.policy.max_auth_failures {
                    error!(
                        profile = %self.profile_id,
                        error = %e,
                        auth_failures = self.auth_failures,
                        "polling suspended, check the controller credentials"
                    );
                    self.suspended = true;
                    self.next_due = None;
                    self.state.send_replace(PollState::Suspended {
                        reason: e.to_string(),
                    });
                    return;
                }

                let retry_in = self
                    .backoff
                    .delay(self.failures)
                    .max(e.retry_after().unwrap_or_default());
                warn!(
                    profile = %self.profile_id,
                    error = %e,
                    kind = %e.kind(),
                    attempt = self.failures,
                    retry_in_secs = retry_in.as_secs(),
                    "poll cycle failed"
                );
                self.next_due = Some(now + retry_in);
                self.state.send_replace(PollState::Failed {
                    attempt: self.failures,
                    retry_in,
                });
            }
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::PollNow { reply } => {
                let answer = self.manual_poll();
                debug!(profile = %self.profile_id, ?answer, "manual poll requested");
                let _ = reply.send(answer);
            }
            Command::StartSpeedTest { reply } => {
                let source = Arc::clone(&self.source);
                self.side_tasks.spawn(async move {
                    let _ = reply.send(source.start_speed_test().await);
                });
            }
        }
    }

    fn manual_poll(&mut self) -> ManualPoll {
        if self.in_flight.is_some() {
            return ManualPoll::Skipped;
        }
        let now = Instant::now();
        if let Some(last) = self.last_started {
            let window_end = last + self.policy.manual_spacing;
            if now < window_end {
                let at = *self.deferred.get_or_insert(window_end);
                return ManualPoll::Deferred { after: at - now };
            }
        }
        self.start_cycle();
        ManualPoll::Started
    }

    fn scheduled_speed_test(&mut self) {
        let Some(schedule) = self.speed_test else {
            self.next_speed_test = None;
            return;
        };
        self.next_speed_test = Some(Instant::now() + schedule.interval);
        if self.suspended {
            debug!(profile = %self.profile_id, "suspended, skipping scheduled speed test");
            return;
        }

        let source = Arc::clone(&self.source);
        let profile = self.profile_id.clone();
        self.side_tasks.spawn(async move {
            match source.start_speed_test().await {
                Ok(outcome) => info!(%profile, %outcome, "scheduled speed test"),
                Err(e) => warn!(%profile, error = %e, "scheduled speed test failed"),
            }
        });
    }
}

/// Await the in-flight cycle, or stay pending when there is none.
async fn join_cycle(slot: &mut Option<JoinHandle<CycleResult>>) -> CycleResult {
    let joined = match slot.as_mut() {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    };
    *slot = None;
    joined.map_err(|e| CoreError::Internal(format!("poll cycle task failed: {e}")))?
}
