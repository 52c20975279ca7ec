use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Production schedule with automatic archival of completed tasks.
/// Data lives in ~/.reel or the directory passed via --dir.
#[derive(Parser)]
#[command(name = "reel", version, about = "Task schedule, kanban board and archive for media production")]
pub struct Cli {
    /// Directory holding settings.json, session.json and the log file.
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    /// JSON file of tasks to load at startup (read only).
    #[arg(long, global = true)]
    pub tasks: Option<PathBuf>,

    /// Override the retention window for this run (1-30 days).
    #[arg(long, global = true)]
    pub retention_days: Option<u32>,

    #[command(subcommand)]
    pub command: Commands,
}
