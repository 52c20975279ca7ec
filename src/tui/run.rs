//! Terminal setup and teardown around the application loop.

use std::{io, path::Path};

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::CrosstermBackend, Terminal};
use tracing::info;

use crate::engine::Engine;
use crate::settings::Settings;
use crate::tui::{app::App, enums::Screen};

/// Run the terminal UI on `engine` until the user quits. The terminal is
/// restored even when the loop fails.
pub fn run_tui(engine: Engine, settings: Settings, dir: &Path, screen: Screen) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    info!(?screen, "terminal ui started");
    let mut app = App::new(engine, settings, dir.to_path_buf(), screen);
    let result = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    info!("terminal ui closed");

    result
}
