//! `status`: one poll cycle, rendered.

use chrono::Local;
use owo_colors::OwoColorize;
use tabled::Tabled;

use wanwatch_core::{GatewaySource, Snapshot, WanInterface, WanSource, poll_once};

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output;

use super::Context;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct WanRow {
    #[tabled(rename = "")]
    marker: String,
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Interface")]
    interface: String,
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Down (Mbps)")]
    download: String,
    #[tabled(rename = "Up (Mbps)")]
    upload: String,
    #[tabled(rename = "Ping (ms)")]
    ping: String,
    #[tabled(rename = "Tested")]
    tested: String,
}

impl WanRow {
    fn new(wan: &WanInterface, color: bool) -> Self {
        let marker = match (wan.is_primary, color) {
            (true, true) => "●".green().to_string(),
            (true, false) => "*".into(),
            (false, _) => String::new(),
        };
        let test = wan.speedtest.as_ref();
        Self {
            marker,
            key: wan.key.clone(),
            interface: wan.interface_name.clone().unwrap_or_default(),
            group: wan.network_group.clone().unwrap_or_default(),
            download: number(test.and_then(|t| t.download_mbps)),
            upload: number(test.and_then(|t| t.upload_mbps)),
            ping: number(test.and_then(|t| t.ping_ms)),
            tested: test
                .and_then(|t| t.timestamp)
                .map(|ts| ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
        }
    }
}

fn number(value: Option<f64>) -> String {
    value.map_or_else(|| "-".into(), |v| format!("{v:.1}"))
}

// ── Rendering ───────────────────────────────────────────────────────

/// Render a snapshot in the selected format.
///
/// Plain output is the primary key (or `none`), prefixed with the
/// profile id when `with_profile` is set.
pub fn render_snapshot(
    snapshot: &Snapshot,
    ctx: &Context,
    with_profile: bool,
) -> Result<String, CliError> {
    output::render_single(
        ctx.format,
        snapshot,
        |s| detail(s, ctx.color),
        |s| {
            let primary = s.resolution.primary_key.as_deref().unwrap_or("none");
            if with_profile {
                format!("{} {primary}", s.profile_id)
            } else {
                primary.to_owned()
            }
        },
    )
}

fn detail(snapshot: &Snapshot, color: bool) -> String {
    let headline = match snapshot.primary() {
        Some(wan) if color => format!(
            "{}: primary {} ({}) via {}",
            snapshot.profile_id.bold(),
            wan.label().green().bold(),
            wan.key,
            snapshot.resolution.method,
        ),
        Some(wan) => format!(
            "{}: primary {} ({}) via {}",
            snapshot.profile_id,
            wan.label(),
            wan.key,
            snapshot.resolution.method,
        ),
        None => format!("{}: no primary WAN resolved", snapshot.profile_id),
    };
    let polled = snapshot
        .polled_at
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S");

    if snapshot.interfaces.is_empty() {
        return format!("{headline}\nNo WAN interfaces reported (polled {polled})");
    }

    let rows: Vec<WanRow> = snapshot
        .interfaces
        .iter()
        .map(|wan| WanRow::new(wan, color))
        .collect();
    format!(
        "{headline}\n{}\n{} WAN interface(s), polled {polled}",
        output::render_table(&rows),
        snapshot.total_wan_interfaces,
    )
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(global: &GlobalOpts, ctx: &Context) -> Result<(), CliError> {
    let profile = config::resolve_profile(global, &ctx.config)?;
    let source = GatewaySource::new(&profile)?;

    let result = poll_once(&source, profile.id.clone()).await;
    source.close().await;
    let snapshot = result?;

    let out = render_snapshot(&snapshot, ctx, false)?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}
