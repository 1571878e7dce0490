use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hookflow", version)]
#[command(about = "Policy gate between an AI coding agent and your working copy")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate a hook event and print the verdict JSON
    Run {
        /// Event JSON, or '-' to read it from stdin (stdin is also the
        /// default when the flag is omitted)
        #[arg(long)]
        event: Option<String>,

        /// Hook lifecycle (preToolUse or postToolUse)
        #[arg(long = "event-type")]
        event_type: Option<String>,

        /// Workspace root override (defaults to the event's cwd)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Validate every workflow file under .github/hooks
    Validate {
        /// Workspace root (defaults to the current directory)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// List discovered workflow files
    Discover {
        /// Workspace root (defaults to the current directory)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Show which workflows an event would trigger, without running steps
    Triggers {
        /// Event JSON, or '-' to read it from stdin
        #[arg(long)]
        event: Option<String>,

        /// Hook lifecycle (preToolUse or postToolUse)
        #[arg(long = "event-type")]
        event_type: Option<String>,

        /// Workspace root override (defaults to the event's cwd)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// List recent denial log files
    Logs {
        /// Maximum number of entries to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Scaffold .github/hooks with a sample workflow
    Init {
        /// Workspace root (defaults to the current directory)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}
