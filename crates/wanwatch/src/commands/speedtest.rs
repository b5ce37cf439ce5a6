//! `speedtest`: ask the controller to run a speed test now.

use serde::Serialize;

use wanwatch_core::{GatewaySource, ProfileId, SpeedTestOutcome, WanSource};

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output;

use super::Context;

#[derive(Debug, Serialize)]
struct SpeedTestReport {
    profile: ProfileId,
    outcome: SpeedTestOutcome,
}

fn describe(report: &SpeedTestReport) -> String {
    match report.outcome {
        SpeedTestOutcome::Accepted => format!(
            "Speed test started on '{}'. Results show up in the next poll.",
            report.profile
        ),
        SpeedTestOutcome::Unsupported => format!(
            "'{}' runs speed tests on its own schedule; remote triggering is not supported.",
            report.profile
        ),
    }
}

pub async fn handle(global: &GlobalOpts, ctx: &Context) -> Result<(), CliError> {
    let profile = config::resolve_profile(global, &ctx.config)?;
    let source = GatewaySource::new(&profile)?;

    let result = source.start_speed_test().await;
    source.close().await;

    let report = SpeedTestReport {
        profile: profile.id,
        outcome: result?,
    };
    let out = output::render_single(ctx.format, &report, describe, |r| r.outcome.to_string())?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}
