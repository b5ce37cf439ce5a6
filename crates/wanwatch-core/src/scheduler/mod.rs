// ── Poll scheduler ──
//
// Owns one polling loop per profile. The handle only holds channels and
// cancellation tokens; all scheduling state lives inside each loop so
// profiles never share anything except the snapshot registry.

mod backoff;
mod cycle;
mod state;
mod task;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub use backoff::Backoff;
pub use cycle::poll_once;
pub use state::{ManualPoll, PollState};

use crate::config::{ControllerProfile, ProfileId};
use crate::error::CoreError;
use crate::model::SpeedTestOutcome;
use crate::publish::SnapshotRegistry;
use crate::source::WanSource;
use task::{Command, ProfileTask};

const COMMAND_CHANNEL_SIZE: usize = 16;

struct ProfileHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<PollState>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ProfileHandle {
    /// Cancel the loop and wait until it has fully stopped.
    async fn stop(self, profile: &ProfileId) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(%profile, error = %e, "polling task ended abnormally");
        }
    }
}

/// Drives periodic collection for every configured profile.
pub struct PollScheduler {
    registry: Arc<SnapshotRegistry>,
    profiles: Mutex<HashMap<ProfileId, ProfileHandle>>,
    cancel: CancellationToken,
}

impl PollScheduler {
    pub fn new(registry: Arc<SnapshotRegistry>) -> Self {
        Self {
            registry,
            profiles: Mutex::new(HashMap::new()),
            cancel: CancellationToken::new(),
        }
    }

    /// The registry snapshots are published to.
    pub fn registry(&self) -> &Arc<SnapshotRegistry> {
        &self.registry
    }

    /// Start polling a profile. The first cycle runs immediately.
    ///
    /// An existing profile with the same id is stopped first (in-flight
    /// cycle aborted, timers dropped, snapshot cleared) before the new
    /// loop is spawned.
    pub async fn add_profile<S: WanSource>(
        &self,
        profile: &ControllerProfile,
        source: S,
    ) -> watch::Receiver<PollState> {
        let mut profiles = self.profiles.lock().await;
        if let Some(old) = profiles.remove(&profile.id) {
            info!(profile = %profile.id, "replacing profile");
            old.stop(&profile.id).await;
            self.registry.remove(&profile.id);
        }

        let (state_tx, state_rx) = watch::channel(PollState::Idle);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let cancel = self.cancel.child_token();

        let task = ProfileTask::new(
            profile.id.clone(),
            source,
            profile.poll.clone(),
            profile.active_speed_test(),
            Arc::clone(&self.registry),
            state_tx,
        );
        let handle = tokio::spawn(task.run(command_rx, cancel.clone()));

        profiles.insert(
            profile.id.clone(),
            ProfileHandle {
                commands: command_tx,
                state: state_rx.clone(),
                cancel,
                task: handle,
            },
        );
        state_rx
    }

    /// Stop polling a profile and drop its snapshot.
    pub async fn remove_profile(&self, profile: &ProfileId) -> Result<(), CoreError> {
        let handle = self
            .profiles
            .lock()
            .await
            .remove(profile)
            .ok_or_else(|| not_found(profile))?;
        handle.stop(profile).await;
        self.registry.remove(profile);
        info!(%profile, "profile removed");
        Ok(())
    }

    /// Poll now, bypassing the timer. Never runs two cycles at once.
    pub async fn request_immediate_poll(&self, profile: &ProfileId) -> Result<ManualPoll, CoreError> {
        let (reply, rx) = oneshot::channel();
        self.send(profile, Command::PollNow { reply }).await?;
        rx.await.map_err(|_| not_found(profile))
    }

    /// Ask the profile's controller to run a speed test.
    pub async fn start_speed_test(
        &self,
        profile: &ProfileId,
    ) -> Result<SpeedTestOutcome, CoreError> {
        let (reply, rx) = oneshot::channel();
        self.send(profile, Command::StartSpeedTest { reply }).await?;
        rx.await.map_err(|_| not_found(profile))?
    }

    /// Watch a profile's polling state.
    pub async fn state(&self, profile: &ProfileId) -> Option<watch::Receiver<PollState>> {
        self.profiles
            .lock()
            .await
            .get(profile)
            .map(|h| h.state.clone())
    }

    /// Ids of all running profiles, sorted.
    pub async fn profiles(&self) -> Vec<ProfileId> {
        let mut ids: Vec<ProfileId> = self.profiles.lock().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Stop every profile loop and wait for all of them.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let drained: Vec<(ProfileId, ProfileHandle)> =
            self.profiles.lock().await.drain().collect();
        for (profile, handle) in drained {
            handle.stop(&profile).await;
        }
    }

    async fn send(&self, profile: &ProfileId, command: Command) -> Result<(), CoreError> {
        let commands = self
            .profiles
            .lock()
            .await
            .get(profile)
            .map(|h| h.commands.clone())
            .ok_or_else(|| not_found(profile))?;
        commands.send(command).await.map_err(|_| not_found(profile))
    }
}

fn not_found(profile: &ProfileId) -> CoreError {
    CoreError::ProfileNotFound {
        profile: profile.to_string(),
    }
}
