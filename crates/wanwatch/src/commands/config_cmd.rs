//! Config subcommand handlers.

use serde::Serialize;
use tabled::Tabled;

use wanwatch_config::Profile;
use wanwatch_core::ApiFamily;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::Context;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ProfileSummary {
    name: String,
    controller: String,
    family: ApiFamily,
    site: String,
    active: bool,
}

impl ProfileSummary {
    fn new(name: &str, profile: &Profile, active: &str) -> Self {
        Self {
            name: name.into(),
            controller: profile.controller.clone(),
            family: profile.family,
            site: profile.site.clone(),
            active: name == active,
        }
    }
}

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Controller")]
    controller: String,
    #[tabled(rename = "Family")]
    family: String,
    #[tabled(rename = "Site")]
    site: String,
}

impl From<&ProfileSummary> for ProfileRow {
    fn from(p: &ProfileSummary) -> Self {
        Self {
            marker: if p.active { "*" } else { "" },
            name: p.name.clone(),
            controller: p.controller.clone(),
            family: p.family.to_string(),
            site: p.site.clone(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: &ConfigArgs, global: &GlobalOpts, ctx: &Context) -> Result<(), CliError> {
    let out = match args.command {
        ConfigCommand::Path => config::config_path().display().to_string(),

        ConfigCommand::Show => {
            let redacted = ctx.config.redacted();
            match ctx.format {
                OutputFormat::Table | OutputFormat::Plain => redacted.to_toml()?,
                format => output::render_single(format, &redacted, |_| String::new(), |_| {
                    String::new()
                })?,
            }
        }

        ConfigCommand::Profiles => {
            let active = config::active_profile_name(global, &ctx.config);
            let summaries: Vec<ProfileSummary> = ctx
                .config
                .profiles
                .iter()
                .map(|(name, profile)| ProfileSummary::new(name, profile, &active))
                .collect();
            if summaries.is_empty() && ctx.format == OutputFormat::Table {
                format!(
                    "No profiles configured. Add one under [profiles.<name>] in {}",
                    config::config_path().display()
                )
            } else {
                output::render_list(
                    ctx.format,
                    &summaries,
                    |p| ProfileRow::from(p),
                    |p| p.name.clone(),
                )?
            }
        }
    };

    output::print_output(&out, ctx.quiet);
    Ok(())
}
