//! Command implementations for the CLI interface.
//!
//! Every handler prints its result to stdout. On failure the error is printed
//! to stderr and the process exits with status 1.

use std::path::Path;
use std::time::Duration;

use chrono::{Datelike, Local};
use clap::Subcommand;
use clap_complete::{generate, Shell};
use tracing::info;

use crate::api::{ApiClient, Credentials, ProjectRequest, TeamMember};
use crate::calendar::{project_month, render_text, YearMonth};
use crate::clock::SystemClock;
use crate::engine::Engine;
use crate::error::{ReelError, Result};
use crate::fields::*;
use crate::session::Session;
use crate::settings::Settings;
use crate::store::{format_local_date, print_table, Seed};
use crate::tui::enums::Screen;
use crate::tui::run::run_tui;

#[derive(Subcommand)]
pub enum Commands {
    /// Open the schedule (list and calendar) in the terminal UI.
    Ui,

    /// Open the kanban board in the terminal UI.
    Board,

    /// List tasks after the startup archival sweep.
    List {
        /// Status filter. "all" hides completed tasks.
        #[arg(long, value_enum, default_value_t = FilterArg::All)]
        status: FilterArg,
        /// Show the archive instead of active tasks.
        #[arg(long)]
        archived: bool,
    },

    /// Print a month calendar of task deadlines.
    Calendar {
        #[arg(long)]
        year: Option<i32>,
        /// Month number, 1-12.
        #[arg(long)]
        month: Option<u32>,
    },

    /// Log in to the production service and remember the token.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },

    /// Create an account on the production service.
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },

    /// Forget the saved login.
    Logout,

    /// Show who is logged in.
    Whoami,

    /// Manage projects on the production service.
    Projects {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Show or change settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// List your projects.
    List,
    /// Report whether you have any active project.
    Active,
    /// Create a project.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, value_enum, default_value_t = ProjectType::FullLengthVideo)]
        project_type: ProjectType,
        /// Team role and head count as NAME:COUNT. May be repeated.
        #[arg(long = "member")]
        members: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print the current settings.
    Show,
    /// Change one or more settings.
    Set {
        /// Days a completed task stays active (1-30).
        #[arg(long)]
        retention_days: Option<u32>,
        /// Hours between archival sweeps.
        #[arg(long)]
        sweep_interval_hours: Option<u64>,
        /// Base URL of the production service.
        #[arg(long)]
        api_url: Option<String>,
    },
}

fn or_exit<T>(result: Result<T>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Build an engine from settings and an optional seed file, then run the
/// startup sweep.
pub fn start_engine(settings: &Settings, tasks: Option<&Path>) -> Result<Engine> {
    let mut engine = Engine::new(settings, Box::new(SystemClock))?;
    if let Some(path) = tasks {
        let seed = Seed::load(path)?;
        let n = engine.import(seed)?;
        info!(count = n, path = %path.display(), "loaded seed tasks");
    }
    engine.start();
    Ok(engine)
}

fn api_client(settings: &Settings, session: &Session) -> ApiClient {
    ApiClient::new(&settings.api_base_url, Duration::from_secs(settings.request_timeout_secs))
        .with_token(session.bearer())
}

pub fn cmd_ui(dir: &Path, settings: Settings, tasks: Option<&Path>, screen: Screen) {
    let engine = or_exit(start_engine(&settings, tasks));
    if let Err(e) = run_tui(engine, settings, dir, screen) {
        eprintln!("UI error: {e}");
        std::process::exit(1);
    }
}

pub fn cmd_list(settings: &Settings, tasks: Option<&Path>, status: FilterArg, archived: bool) {
    let engine = or_exit(start_engine(settings, tasks));
    let store = engine.store();
    if archived {
        let rows = store.list_archived();
        if rows.is_empty() {
            println!("Archive is empty.");
            return;
        }
        println!("{:<5} {:<12} {:<11} {}", "ID", "Archived", "Deadline", "Title");
        for t in rows {
            println!("{:<5} {:<12} {:<11} {}", t.id, format_local_date(t.deleted_at), t.deadline, t.title);
        }
        return;
    }

    let rows = store.list_active(status.into());
    if rows.is_empty() {
        println!("No tasks.");
    } else {
        print_table(&rows);
    }
    for note in engine.feed().iter() {
        println!("[{}] {}", note.kind.label(), note.message);
    }
}

pub fn cmd_calendar(settings: &Settings, tasks: Option<&Path>, year: Option<i32>, month: Option<u32>) {
    let today = Local::now().date_naive();
    let year = year.unwrap_or(today.year());
    let month = month.unwrap_or(today.month());
    let ym = or_exit(YearMonth::new(year, month).ok_or_else(|| ReelError::Input(format!("no such month: {year}-{month:02}"))));
    let engine = or_exit(start_engine(settings, tasks));
    let grid = project_month(engine.store().active(), ym);
    print!("{}", render_text(&grid));
}

pub fn cmd_login(dir: &Path, settings: &Settings, username: String, password: String) {
    let client = api_client(settings, &Session::default());
    let creds = Credentials { username, password };
    let token = or_exit(client.login(&creds).map_err(ReelError::from));
    let session = Session { username: Some(creds.username.clone()), token: Some(token) };
    or_exit(session.save(dir).map_err(ReelError::from));
    println!("Logged in as {}.", creds.username);
}

pub fn cmd_register(settings: &Settings, username: String, password: String) {
    let client = api_client(settings, &Session::default());
    let user = or_exit(client.register(&Credentials { username, password }).map_err(ReelError::from));
    println!("Registered {}.", user.username);
}

pub fn cmd_logout(dir: &Path) {
    or_exit(Session::clear(dir).map_err(ReelError::from));
    println!("Logged out.");
}

pub fn cmd_whoami(dir: &Path) {
    let session = or_exit(Session::load(dir).map_err(ReelError::from));
    match (&session.username, session.is_authenticated()) {
        (Some(name), true) => println!("{name}"),
        _ => println!("Not logged in."),
    }
}

pub fn cmd_projects(dir: &Path, settings: &Settings, action: ProjectAction) {
    let session = or_exit(Session::load(dir).map_err(ReelError::from));
    let client = api_client(settings, &session);
    match action {
        ProjectAction::List => {
            let projects = or_exit(client.my_projects().map_err(ReelError::from));
            if projects.is_empty() {
                println!("No projects.");
                return;
            }
            println!("{:<26} {:<20} {:<7} {}", "ID", "Type", "Active", "Name");
            for p in projects {
                println!(
                    "{:<26} {:<20} {:<7} {}",
                    p.id.as_deref().unwrap_or("-"),
                    p.project_type.map(ProjectType::label).unwrap_or("-"),
                    if p.active { "yes" } else { "no" },
                    p.name,
                );
            }
        }
        ProjectAction::Active => {
            let active = or_exit(client.has_active_projects().map_err(ReelError::from));
            println!("{}", if active { "yes" } else { "no" });
        }
        ProjectAction::Create { name, description, project_type, members } => {
            let team_members = or_exit(parse_members(&members));
            let request = ProjectRequest { name, description, project_type, team_members };
            let project = or_exit(client.create_project(&request).map_err(ReelError::from));
            println!("Created project {} ({}).", project.name, project.id.as_deref().unwrap_or("no id"));
        }
    }
}

fn parse_members(raw: &[String]) -> Result<Vec<TeamMember>> {
    raw.iter()
        .map(|m| TeamMember::parse(m).ok_or_else(|| ReelError::Input(format!("bad member '{m}', expected NAME:COUNT"))))
        .collect()
}

pub fn cmd_settings(dir: &Path, action: SettingsAction) {
    let mut settings = Settings::load(dir);
    match action {
        SettingsAction::Show => {
            println!("retention_days        {}", settings.retention_days);
            println!("sweep_interval_hours  {}", settings.sweep_interval_hours);
            println!("api_base_url          {}", settings.api_base_url);
            println!("request_timeout_secs  {}", settings.request_timeout_secs);
            println!("file                  {}", Settings::path(dir).display());
        }
        SettingsAction::Set { retention_days, sweep_interval_hours, api_url } => {
            if let Some(days) = retention_days {
                settings.retention_days = days;
            }
            if let Some(hours) = sweep_interval_hours {
                settings.sweep_interval_hours = hours;
            }
            if let Some(url) = api_url {
                settings.api_base_url = url;
            }
            or_exit(settings.save(dir).map_err(ReelError::from));
            println!("Settings saved.");
        }
    }
}

pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn engine_starts_with_seed_and_sweeps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(
            &path,
            r#"[
                {"id": 1, "title": "Old", "start_date": "2020-01-01", "deadline": "2020-01-02",
                 "status": "completed", "completed_at": "2020-01-02T00:00:00Z"},
                {"id": 2, "title": "Open", "start_date": "2020-01-01", "deadline": "2030-01-02",
                 "status": "todo"}
            ]"#,
        )
        .unwrap();
        let engine = start_engine(&Settings::default(), Some(&path)).unwrap();
        assert!(engine.is_running());
        assert_eq!(engine.store().active_len(), 1);
        assert_eq!(engine.store().get(2).unwrap().status, Status::Pending);
        assert!(engine.store().get_archived(1).is_some());
    }

    #[test]
    fn missing_seed_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let res = start_engine(&Settings::default(), Some(&dir.path().join("nope.json")));
        assert!(matches!(res, Err(ReelError::Seed(_))));
    }

    #[test]
    fn member_flags() {
        let ok = parse_members(&["Editor:2".into(), "Sound".into()]).unwrap();
        assert_eq!(ok.len(), 2);
        assert!(parse_members(&["Editor:x".into()]).is_err());
    }
}
