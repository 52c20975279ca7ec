//! # reel - production schedule and archive
//!
//! A terminal front end for tracking media production tasks, with a schedule
//! (list and calendar), a kanban board sharing the same task state, and an
//! automatic archival sweep that moves completed work out of the way after a
//! configurable retention window.
//!
//! ## Quick Start
//!
//! ```bash
//! # Schedule view, preloading tasks from a JSON file
//! reel ui --tasks shoot.json
//!
//! # Kanban board
//! reel board --tasks shoot.json
//!
//! # What is left to do?
//! reel list --tasks shoot.json --status pending
//!
//! # Keep completed tasks around for a week
//! reel settings set --retention-days 7
//! ```
//!
//! ## Lifecycle
//!
//! - Moving a task to **Completed** stamps `completed_at`. Any other move clears it.
//! - Once a day (and at startup) completed tasks older than the retention window
//!   are archived, with one notification per batch.
//! - Archived tasks can be recovered unchanged or permanently deleted.
//!
//! Tasks live in memory for the session. Only settings, the login session and
//! the log file are kept in `~/.reel/`.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod api;
pub mod archival;
pub mod calendar;
pub mod cli;
pub mod clock;
pub mod cmd;
pub mod controller;
pub mod engine;
pub mod error;
pub mod fields;
pub mod notify;
pub mod session;
pub mod settings;
pub mod store;
pub mod task;
pub mod tui {
    pub mod app;
    pub mod board;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod schedule;
    pub mod task_form;
    pub mod utils;
}

use cli::Cli;
use cmd::*;
use settings::Settings;
use tui::enums::Screen;

pub const LOG_FILE: &str = "reel.log";

fn init_logging(dir: &Path, to_file: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if to_file {
        match OpenOptions::new().create(true).append(true).open(dir.join(LOG_FILE)) {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .init();
            }
            // No log file means no logging; stderr would draw over the UI.
            Err(e) => eprintln!("Failed to open log file in {}: {}", dir.display(), e),
        }
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() {
    let cli = Cli::parse();

    let dir = cli.dir.clone().unwrap_or_else(|| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".reel")
    });
    if let Err(e) = std::fs::create_dir_all(&dir) {
        eprintln!("Failed to create data directory {}: {}", dir.display(), e);
        std::process::exit(1);
    }

    init_logging(&dir, matches!(cli.command, Commands::Ui | Commands::Board));

    let mut settings = Settings::load(&dir);
    if let Some(days) = cli.retention_days {
        settings.retention_days = days;
        if let Err(e) = settings.validate() {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
    let tasks = cli.tasks.as_deref();

    match cli.command {
        Commands::Ui => cmd_ui(&dir, settings, tasks, Screen::Schedule),
        Commands::Board => cmd_ui(&dir, settings, tasks, Screen::Board),
        Commands::List { status, archived } => cmd_list(&settings, tasks, status, archived),
        Commands::Calendar { year, month } => cmd_calendar(&settings, tasks, year, month),
        Commands::Login { username, password } => cmd_login(&dir, &settings, username, password),
        Commands::Register { username, password } => cmd_register(&settings, username, password),
        Commands::Logout => cmd_logout(&dir),
        Commands::Whoami => cmd_whoami(&dir),
        Commands::Projects { action } => cmd_projects(&dir, &settings, action),
        Commands::Settings { action } => cmd_settings(&dir, action),
        Commands::Completions { shell } => cmd_completions(shell),
    }
}
