//! CLI configuration -- thin wrapper around `wanwatch_config`.
//!
//! Adds `GlobalOpts` flag overrides on top of the shared profile
//! translation. Flags beat profile values; profile values beat defaults.

use wanwatch_config::{Config, Profile};
use wanwatch_core::ControllerProfile;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

pub use wanwatch_config::{config_path, load_config};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    wanwatch_config::active_profile_name(global.profile.as_deref(), config)
}

/// Build the runtime profile for the active profile name.
///
/// Without a matching profile, `--controller` alone is enough: everything
/// else comes from flags, env vars and defaults.
pub fn resolve_profile(global: &GlobalOpts, config: &Config) -> Result<ControllerProfile, CliError> {
    let name = active_profile_name(global, config);

    let mut profile = if let Some(profile) = config.profiles.get(&name) {
        profile.clone()
    } else if let Some(ref controller) = global.controller {
        Profile::new(controller.clone())
    } else if global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            available: available_profiles(config),
            name,
        });
    } else {
        return Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        });
    };

    apply_overrides(&mut profile, global);
    Ok(wanwatch_config::build_profile(&profile, &name, &config.defaults)?)
}

/// Build runtime profiles for every configured profile.
///
/// Only connection-wide flags (`--insecure`, `--timeout`) apply here;
/// per-controller flags would make every profile point at the same box.
pub fn resolve_all_profiles(
    global: &GlobalOpts,
    config: &Config,
) -> Result<Vec<ControllerProfile>, CliError> {
    if config.profiles.is_empty() {
        return Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        });
    }

    config
        .profiles
        .iter()
        .map(|(name, profile)| {
            let mut profile = profile.clone();
            apply_transport_overrides(&mut profile, global);
            Ok(wanwatch_config::build_profile(
                &profile,
                name,
                &config.defaults,
            )?)
        })
        .collect()
}

fn apply_overrides(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref controller) = global.controller {
        profile.controller.clone_from(controller);
    }
    if let Some(ref site) = global.site {
        profile.site.clone_from(site);
    }
    if let Some(family) = global.family {
        profile.family = family;
    }
    if let Some(ref username) = global.username {
        profile.username = Some(username.clone());
    }
    apply_transport_overrides(profile, global);
}

fn apply_transport_overrides(profile: &mut Profile, global: &GlobalOpts) {
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
}

fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        return "(none)".into();
    }
    config
        .profiles
        .keys()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Output format: flag, then `defaults.output`, then table.
pub fn output_format(global: &GlobalOpts, config: &Config) -> OutputFormat {
    use clap::ValueEnum;

    global.output.unwrap_or_else(|| {
        OutputFormat::from_str(&config.defaults.output, true).unwrap_or(OutputFormat::Table)
    })
}

/// Color mode: flag, then `defaults.color`, then auto.
pub fn color_mode(global: &GlobalOpts, config: &Config) -> ColorMode {
    use clap::ValueEnum;

    global.color.unwrap_or_else(|| {
        ColorMode::from_str(&config.defaults.color, true).unwrap_or(ColorMode::Auto)
    })
}
