//! Clap derive structures for the `wanwatch` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

use wanwatch_core::ApiFamily;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// wanwatch -- which uplink is your UniFi gateway using?
#[derive(Debug, Parser)]
#[command(
    name = "wanwatch",
    version,
    about = "Track the primary WAN uplink of UniFi gateways",
    long_about = "Polls UniFi controllers for WAN interfaces and speed-test results,\n\
        and decides which uplink is primary from the routing table, the\n\
        network configuration, or the freshest speed test.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Controller profile to use
    #[arg(long, short = 'p', env = "WANWATCH_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Controller URL (overrides profile)
    #[arg(long, short = 'c', env = "WANWATCH_CONTROLLER", global = true)]
    pub controller: Option<String>,

    /// Site name
    #[arg(long, short = 's', env = "WANWATCH_SITE", global = true)]
    pub site: Option<String>,

    /// Controller API family
    #[arg(long, env = "WANWATCH_FAMILY", value_parser = parse_family, global = true)]
    pub family: Option<ApiFamily>,

    /// Login username (password comes from WANWATCH_PASSWORD, the keyring, or the profile)
    #[arg(long, short = 'u', env = "WANWATCH_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format [default: table, or `defaults.output` from the config]
    #[arg(long, short = 'o', env = "WANWATCH_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "WANWATCH_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "WANWATCH_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

fn parse_family(raw: &str) -> Result<ApiFamily, String> {
    raw.parse()
        .map_err(|_| format!("expected 'udm' or 'legacy', got '{raw}'"))
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll once and show WAN interfaces with the resolved primary
    #[command(alias = "st")]
    Status,

    /// Keep polling and print every new snapshot until interrupted
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Ask the controller to run a speed test now (standalone controllers)
    Speedtest,

    /// Inspect CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Watch every configured profile instead of just the active one
    #[arg(long, short = 'a')]
    pub all: bool,

    /// Exit after this many snapshots
    #[arg(long, short = 'n')]
    pub count: Option<usize>,
}

// ── Config ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the loaded configuration (secrets masked)
    Show,

    /// Print the config file location
    Path,

    /// List configured profiles
    Profiles,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
