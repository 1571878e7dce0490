use anyhow::Result;
use clap::Parser;

mod cli;
mod init_cmd;
mod inspect_cmds;
mod logs_cmd;
mod run_cmd;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries exactly one verdict JSON.
    // HOOKFLOW_DEBUG=1 forces verbose output regardless of RUST_LOG.
    let filter = if std::env::var("HOOKFLOW_DEBUG").as_deref() == Ok("1") {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init()
        .ok();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Run {
            event,
            event_type,
            dir,
        } => run_cmd::handle_run(event, event_type, dir)?,
        Commands::Validate { dir } => inspect_cmds::handle_validate(dir)?,
        Commands::Discover { dir } => inspect_cmds::handle_discover(dir)?,
        Commands::Triggers {
            event,
            event_type,
            dir,
        } => inspect_cmds::handle_triggers(event, event_type, dir)?,
        Commands::Logs { limit } => logs_cmd::handle_logs(limit)?,
        Commands::Init { dir } => init_cmd::handle_init(dir)?,
    };

    std::process::exit(exit_code);
}
