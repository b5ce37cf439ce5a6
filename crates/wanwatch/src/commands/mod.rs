//! Command handlers, one module per subcommand.

pub mod config_cmd;
pub mod speedtest;
pub mod status;
pub mod watch;

use wanwatch_config::Config;

use crate::cli::{Command, GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Settings every handler needs, resolved once from flags and config.
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    pub format: OutputFormat,
    pub color: bool,
    pub quiet: bool,
}

/// Route a controller-facing command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts, ctx: &Context) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(global, ctx).await,
        Command::Watch(args) => watch::handle(args, global, ctx).await,
        Command::Speedtest => speedtest::handle(global, ctx).await,
        Command::Config(args) => config_cmd::handle(&args, global, ctx),
        Command::Completions(_) => Err(CliError::Internal(
            "completions are handled before dispatch".into(),
        )),
    }
}
