//! `watch`: run the poll scheduler and print every published snapshot.

use std::sync::Arc;

use owo_colors::OwoColorize;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{info, warn};

use wanwatch_core::{GatewaySource, PollScheduler, PollState, ProfileId, SnapshotRegistry};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::{Context, status};

pub async fn handle(args: WatchArgs, global: &GlobalOpts, ctx: &Context) -> Result<(), CliError> {
    let profiles = if args.all {
        config::resolve_all_profiles(global, &ctx.config)?
    } else {
        vec![config::resolve_profile(global, &ctx.config)?]
    };

    let registry = Arc::new(SnapshotRegistry::new());
    let mut updates = registry.subscribe();
    let scheduler = PollScheduler::new(Arc::clone(&registry));
    let mut monitors = JoinSet::new();

    for profile in &profiles {
        let source = GatewaySource::new(profile)?;
        let state = scheduler.add_profile(profile, source).await;
        info!(
            profile = %profile.id,
            interval_secs = profile.poll.interval.as_secs(),
            "watching"
        );
        if !ctx.quiet {
            monitors.spawn(report_state(profile.id.clone(), state, ctx.color));
        }
    }

    let mut seen = 0usize;
    let result = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, stopping");
                break Ok(());
            }
            update = updates.recv() => match update {
                Ok(snapshot) => {
                    match status::render_snapshot(&snapshot, ctx, true) {
                        Ok(out) => output::print_output(&out, ctx.quiet),
                        Err(e) => break Err(e),
                    }
                    seen += 1;
                    if args.count.is_some_and(|limit| seen >= limit) {
                        break Ok(());
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "output fell behind, snapshots dropped");
                }
                Err(RecvError::Closed) => break Ok(()),
            },
        }
    };

    scheduler.shutdown().await;
    monitors.shutdown().await;
    result
}

/// Tell the user on stderr when a profile stops being healthy or recovers.
async fn report_state(profile: ProfileId, mut state: watch::Receiver<PollState>, color: bool) {
    let mut was_healthy = true;
    while state.changed().await.is_ok() {
        let current = state.borrow_and_update().clone();
        let line = match current {
            PollState::Failed { attempt, retry_in } => {
                was_healthy = false;
                format!(
                    "{profile}: poll failed (attempt {attempt}), retrying in {}s",
                    retry_in.as_secs()
                )
            }
            PollState::Suspended { reason } => {
                was_healthy = false;
                format!("{profile}: polling suspended: {reason}")
            }
            PollState::Succeeded if !was_healthy => {
                was_healthy = true;
                format!("{profile}: polling recovered")
            }
            _ => continue,
        };
        if color {
            eprintln!("{}", line.yellow());
        } else {
            eprintln!("{line}");
        }
    }
}
