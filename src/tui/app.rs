//! Main application logic for the terminal user interface.
//!
//! `App` owns the engine and the view controller, routes key presses to the
//! current screen or overlay, draws everything, and drives the sweep timer
//! from its event loop.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tracing::{debug, error};

use crate::archival::{MAX_RETENTION_DAYS, MIN_RETENTION_DAYS};
use crate::controller::{ArchiveOutcome, TaskViewController};
use crate::engine::Engine;
use crate::fields::*;
use crate::settings::Settings;
use crate::store::{format_due_relative, format_local_date, StatusChange};
use crate::tui::{
    board::{render_board, BoardState},
    colors::{notification_color, status_color, text_on, DARK_RED, GOLD, SLATE},
    enums::{Overlay, Screen},
    schedule::{render_calendar, render_filter_bar, render_recently_completed, render_task_table, FILTERS},
    task_form::{TaskForm, ASSIGNEE_ORDER, DEADLINE_ORDER, DESCRIPTION_ORDER, PRIORITY_ORDER, START_DATE_ORDER, TITLE_ORDER},
    utils::centered_rect,
};

pub struct App {
    engine: Engine,
    view: TaskViewController,
    settings: Settings,
    dir: PathBuf,
    screen: Screen,
    overlay: Overlay,
    board: BoardState,
    list_selected: usize,
    archive_selected: usize,
    dropdown_selected: usize,
    detail_id: Option<u64>,
    form: TaskForm,
    retention_draft: u32,
    status_message: String,
}

impl App {
    pub fn new(engine: Engine, settings: Settings, dir: PathBuf, screen: Screen) -> Self {
        let today = local_day(&engine);
        let retention_draft = engine.retention_days();
        App {
            view: TaskViewController::new(today),
            form: TaskForm::new(today),
            engine,
            settings,
            dir,
            screen,
            overlay: Overlay::None,
            board: BoardState::default(),
            list_selected: 0,
            archive_selected: 0,
            dropdown_selected: 0,
            detail_id: None,
            retention_draft,
            status_message: String::new(),
        }
    }

    fn today(&self) -> NaiveDate {
        local_day(&self.engine)
    }

    fn set_status_message(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    /// Id of the task under the cursor on the current screen.
    fn selected_task(&self) -> Option<u64> {
        match self.screen {
            Screen::Schedule => {
                if self.view.view_mode() == ViewMode::Calendar {
                    return None;
                }
                let visible = self.view.visible_tasks(self.engine.store());
                visible.get(self.list_selected).map(|t| t.id)
            }
            Screen::Board => {
                let columns = self.view.board_columns(self.engine.store());
                self.board.selected_task(&columns)
            }
        }
    }

    fn report_change(&mut self, change: &StatusChange) {
        let msg = if change.to == Status::Completed {
            format!(
                "Task #{} completed; it will be archived after {} day(s)",
                change.id,
                self.engine.retention_days()
            )
        } else if change.is_noop() {
            format!("Task #{} is already {}", change.id, change.to)
        } else {
            format!("Task #{} moved to {}", change.id, change.to)
        };
        self.set_status_message(msg);
    }

    fn refresh_board_cursor(&mut self, follow: Option<u64>) {
        let columns = self.view.board_columns(self.engine.store());
        match follow {
            Some(id) => self.board.follow(id, &columns),
            None => self.board.clamp(&columns),
        }
    }

    // ----- input -------------------------------------------------------

    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    return Ok(false);
                }
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(true);
                }
                return Ok(match self.overlay {
                    Overlay::None => self.handle_screen_input(key),
                    Overlay::AddTask => {
                        self.handle_form_input(key);
                        false
                    }
                    Overlay::StatusDropdown => {
                        self.handle_dropdown_input(key.code);
                        false
                    }
                    Overlay::Archive => {
                        self.handle_archive_input(key.code);
                        false
                    }
                    Overlay::ConfirmPurge(id) => {
                        self.handle_confirm_input(key.code, id);
                        false
                    }
                    Overlay::Notifications => {
                        match key.code {
                            KeyCode::Char('c') => {
                                self.engine.clear_notifications();
                                self.set_status_message("Notifications cleared");
                            }
                            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('n') => self.overlay = Overlay::None,
                            _ => {}
                        }
                        false
                    }
                    Overlay::Settings => {
                        self.handle_settings_input(key.code);
                        false
                    }
                    Overlay::TaskDetail | Overlay::Help => {
                        self.overlay = Overlay::None;
                        false
                    }
                });
            }
        }
        Ok(false)
    }

    /// Keys on the bare screen. Returns true to quit.
    fn handle_screen_input(&mut self, key: KeyEvent) -> bool {
        if self.board.dragging.is_some() && key.code == KeyCode::Esc {
            self.board.dragging = None;
            self.set_status_message("Move cancelled");
            return false;
        }
        self.status_message.clear();

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab => {
                self.screen = self.screen.toggle();
                self.board.dragging = None;
            }
            KeyCode::Char('h') | KeyCode::F(1) => self.overlay = Overlay::Help,
            KeyCode::Char('a') => {
                self.form = TaskForm::new(self.today());
                self.overlay = Overlay::AddTask;
            }
            KeyCode::Char('n') => self.overlay = Overlay::Notifications,
            KeyCode::Char('r') => {
                self.archive_selected = 0;
                self.overlay = Overlay::Archive;
            }
            KeyCode::Char('o') => {
                self.retention_draft = self.engine.retention_days();
                self.overlay = Overlay::Settings;
            }
            KeyCode::Char('s') => {
                if let Some(id) = self.selected_task() {
                    self.view.open_dropdown(id);
                    self.dropdown_selected = self.engine.store().get(id).map(|t| t.status.column()).unwrap_or(0);
                    self.overlay = Overlay::StatusDropdown;
                }
            }
            KeyCode::Enter => {
                if let Some(id) = self.selected_task() {
                    self.detail_id = Some(id);
                    self.overlay = Overlay::TaskDetail;
                }
            }
            _ => match self.screen {
                Screen::Schedule => self.handle_schedule_input(key),
                Screen::Board => self.handle_board_input(key),
            },
        }
        false
    }

    fn handle_schedule_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c @ '1'..='5') => {
                let idx = c as usize - '1' as usize;
                self.view.set_filter(FILTERS[idx]);
                self.list_selected = 0;
            }
            KeyCode::Char('v') => self.view.toggle_view_mode(),
            KeyCode::Char('c') => {
                self.view.set_filter(StatusFilter::Only(Status::Completed));
                self.list_selected = 0;
            }
            KeyCode::Char('[') => self.view.change_month(-1),
            KeyCode::Char(']') => self.view.change_month(1),
            KeyCode::Left if self.view.view_mode() == ViewMode::Calendar => self.view.change_month(-1),
            KeyCode::Right if self.view.view_mode() == ViewMode::Calendar => self.view.change_month(1),
            KeyCode::Up | KeyCode::Char('k') => self.list_selected = self.list_selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                let len = self.view.visible_tasks(self.engine.store()).len();
                if self.list_selected + 1 < len {
                    self.list_selected += 1;
                }
            }
            _ => {}
        }
    }

    fn handle_board_input(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Left | KeyCode::Right if ctrl => {
                let right = key.code == KeyCode::Right;
                let (Some(id), Some(target)) = (self.selected_task(), self.board.neighbour(right)) else {
                    return;
                };
                self.drop_card(id, target);
            }
            KeyCode::Char(' ') => match self.board.dragging.take() {
                Some(id) => {
                    let target = Status::ALL[self.board.selected_column];
                    self.drop_card(id, target);
                }
                None => {
                    if let Some(id) = self.selected_task() {
                        self.board.dragging = Some(id);
                        self.set_status_message(format!("Carrying #{id}: Left/Right to choose a column, Space to drop"));
                    }
                }
            },
            KeyCode::Left => {
                let columns = self.view.board_columns(self.engine.store());
                self.board.move_column(false, &columns);
            }
            KeyCode::Right | KeyCode::Char('l') => {
                let columns = self.view.board_columns(self.engine.store());
                self.board.move_column(true, &columns);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                let columns = self.view.board_columns(self.engine.store());
                self.board.move_card(false, &columns);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let columns = self.view.board_columns(self.engine.store());
                self.board.move_card(true, &columns);
            }
            _ => {}
        }
    }

    fn drop_card(&mut self, id: u64, target: Status) {
        match self.view.drop_on_column(&mut self.engine, id, target) {
            Ok(Some(change)) => {
                self.report_change(&change);
                self.refresh_board_cursor(Some(id));
            }
            Ok(None) => self.set_status_message(format!("Task #{id} is already in {target}")),
            Err(e) => {
                error!(id, error = %e, "board move failed");
                self.set_status_message(format!("Error: {e}"));
                self.refresh_board_cursor(None);
            }
        }
    }

    fn handle_form_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.overlay = Overlay::None;
                self.set_status_message("Add task cancelled");
            }
            KeyCode::Tab | KeyCode::Down => self.form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.form.prev_field(),
            KeyCode::Left => self.form.handle_left_right(false),
            KeyCode::Right => self.form.handle_left_right(true),
            KeyCode::Backspace => self.form.handle_backspace(),
            KeyCode::Enter => self.submit_form(),
            KeyCode::Char(c) => self.form.handle_char(c),
            _ => {}
        }
    }

    fn submit_form(&mut self) {
        let today = self.today();
        let input = match self.form.to_new_task(today) {
            Ok(input) => input,
            Err(msg) => {
                self.form.error = Some(msg);
                return;
            }
        };
        match self.engine.create_task(input) {
            Ok(id) => {
                debug!(id, "task created from form");
                self.overlay = Overlay::None;
                self.set_status_message(format!("Created task #{id}"));
            }
            Err(e) => self.form.error = Some(e.to_string()),
        }
    }

    fn handle_dropdown_input(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up | KeyCode::Char('k') => self.dropdown_selected = self.dropdown_selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                self.dropdown_selected = (self.dropdown_selected + 1).min(Status::ALL.len() - 1)
            }
            KeyCode::Enter => {
                self.overlay = Overlay::None;
                let Some(id) = self.view.dropdown_for() else {
                    return;
                };
                let status = Status::ALL[self.dropdown_selected];
                match self.view.change_status(&mut self.engine, id, status) {
                    Ok(change) => {
                        self.report_change(&change);
                        self.refresh_board_cursor(Some(id));
                    }
                    Err(e) => {
                        error!(id, error = %e, "status change failed");
                        self.set_status_message(format!("Error: {e}"));
                    }
                }
            }
            KeyCode::Esc | KeyCode::Char('q') => {
                self.view.close_dropdown();
                self.overlay = Overlay::None;
            }
            _ => {}
        }
    }

    fn handle_archive_input(&mut self, code: KeyCode) {
        let archived: Vec<u64> = self.engine.store().list_archived().iter().map(|t| t.id).collect();
        let selected = archived.get(self.archive_selected).copied();
        match code {
            KeyCode::Up | KeyCode::Char('k') => self.archive_selected = self.archive_selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                if self.archive_selected + 1 < archived.len() {
                    self.archive_selected += 1;
                }
            }
            KeyCode::Char('r') => {
                if let Some(id) = selected {
                    match self.view.recover(&mut self.engine, id) {
                        ArchiveOutcome::Done => self.set_status_message(format!("Recovered task #{id}")),
                        ArchiveOutcome::Stale => self.set_status_message("Archive refreshed"),
                    }
                    self.clamp_archive();
                }
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                if let Some(id) = selected {
                    self.overlay = Overlay::ConfirmPurge(id);
                }
            }
            KeyCode::Esc | KeyCode::Char('q') => self.overlay = Overlay::None,
            _ => {}
        }
    }

    fn handle_confirm_input(&mut self, code: KeyCode, id: u64) {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.view.purge(&mut self.engine, id) {
                    ArchiveOutcome::Done => self.set_status_message(format!("Task #{id} permanently deleted")),
                    ArchiveOutcome::Stale => self.set_status_message("Archive refreshed"),
                }
                self.clamp_archive();
                self.overlay = Overlay::Archive;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => self.overlay = Overlay::Archive,
            _ => {}
        }
    }

    fn clamp_archive(&mut self) {
        let len = self.engine.store().archived_len();
        self.archive_selected = self.archive_selected.min(len.saturating_sub(1));
    }

    fn handle_settings_input(&mut self, code: KeyCode) {
        match code {
            KeyCode::Left | KeyCode::Char('-') => {
                self.retention_draft = self.retention_draft.saturating_sub(1).max(MIN_RETENTION_DAYS)
            }
            KeyCode::Right | KeyCode::Char('+') => self.retention_draft = (self.retention_draft + 1).min(MAX_RETENTION_DAYS),
            KeyCode::Enter => {
                self.overlay = Overlay::None;
                let days = self.retention_draft;
                if let Err(e) = self.engine.set_retention_days(days) {
                    self.set_status_message(format!("Error: {e}"));
                    return;
                }
                self.settings.retention_days = days;
                match self.settings.save(&self.dir) {
                    Ok(()) => self.set_status_message(format!("Completed tasks now archived after {days} day(s)")),
                    Err(e) => {
                        error!(error = %e, "could not save settings");
                        self.set_status_message(format!("Applied for this session, not saved: {e}"));
                    }
                }
            }
            KeyCode::Esc | KeyCode::Char('q') => self.overlay = Overlay::None,
            _ => {}
        }
    }

    // ----- rendering ---------------------------------------------------

    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        self.render_header(f, chunks[0]);
        match self.screen {
            Screen::Schedule => self.render_schedule(f, chunks[1]),
            Screen::Board => {
                let today = self.today();
                let columns = self.view.board_columns(self.engine.store());
                self.board.clamp(&columns);
                render_board(f, chunks[1], &columns, &mut self.board, today);
            }
        }
        self.render_status_bar(f, chunks[2]);

        let area = f.area();
        match self.overlay {
            Overlay::None => {}
            Overlay::AddTask => self.render_task_form(f, area),
            Overlay::StatusDropdown => self.render_dropdown(f, area),
            Overlay::TaskDetail => self.render_task_detail(f, area),
            Overlay::Archive => self.render_archive(f, area),
            Overlay::ConfirmPurge(id) => {
                self.render_archive(f, area);
                self.render_confirm(f, area, id);
            }
            Overlay::Notifications => self.render_notifications(f, area),
            Overlay::Settings => self.render_settings(f, area),
            Overlay::Help => self.render_help(f, area),
        }
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let feed_len = self.engine.feed().len();
        let badge_style = if feed_len > 0 {
            Style::default().bg(GOLD).fg(text_on(GOLD)).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let sweep = match self.engine.next_sweep() {
            Some(at) => format!("next sweep {}", at.with_timezone(&Local).format("%m-%d %H:%M")),
            None => "sweep paused".to_string(),
        };
        let header = Line::from(vec![
            Span::styled(self.screen.title(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!(
                    "Active: {}  Archived: {}  Retention: {}d ({})",
                    self.engine.store().active_len(),
                    self.engine.store().archived_len(),
                    self.engine.retention_days(),
                    sweep
                ),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
            Span::raw("  "),
            Span::styled(format!(" n: {feed_len} "), badge_style),
        ]);
        let block = Paragraph::new(header)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(block, area);
    }

    fn render_schedule(&mut self, f: &mut Frame, area: Rect) {
        let today = self.today();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(area);
        render_filter_bar(f, rows[0], self.view.filter());

        let show_recent = self.view.filter() == StatusFilter::All;
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(40), Constraint::Length(if show_recent { 34 } else { 0 })])
            .split(rows[1]);

        let store = self.engine.store();
        match self.view.view_mode() {
            ViewMode::List => {
                let tasks = self.view.visible_tasks(store);
                self.list_selected = self.list_selected.min(tasks.len().saturating_sub(1));
                render_task_table(f, cols[0], &tasks, self.list_selected, self.view.filter(), today);
            }
            ViewMode::Calendar => {
                let grid = self.view.calendar(store);
                render_calendar(f, cols[0], &grid, today);
            }
        }
        if show_recent {
            let recent = self.view.recently_completed(store);
            render_recently_completed(f, cols[1], &recent, self.engine.retention_days());
        }
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            match (self.screen, self.overlay) {
                (_, Overlay::AddTask) => "Tab/↑↓ fields | ←→ priority | Enter create | Esc cancel".to_string(),
                (_, Overlay::Archive) => "r recover | x delete forever | Esc close".to_string(),
                (Screen::Schedule, _) => format!(
                    "1-5 filter | c completed | v {} | s status | a add | r archive | n notifications | o settings | Tab board | h help",
                    match self.view.view_mode() {
                        ViewMode::List => "calendar",
                        ViewMode::Calendar => "list",
                    }
                ),
                (Screen::Board, _) => {
                    "←→↑↓ select | Ctrl+←→ move | Space pick/drop | s status | a add | r archive | Tab schedule | h help"
                        .to_string()
                }
            }
        };
        let bar = Paragraph::new(text).style(Style::default().bg(SLATE).fg(Color::White));
        f.render_widget(bar, area);
    }

    fn render_task_form(&self, f: &mut Frame, area: Rect) {
        let area = centered_rect(60, 70, area);
        f.render_widget(Clear, area);
        let block = Block::default().borders(Borders::ALL).title("Add Task");
        let inner = block.inner(area);
        f.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Length(3), // Description
                Constraint::Length(3), // Start date
                Constraint::Length(3), // Deadline
                Constraint::Length(3), // Priority
                Constraint::Length(3), // Assignee
                Constraint::Min(1),    // Error / hint
            ])
            .split(inner);

        let form = &self.form;
        let text_fields = [
            (TITLE_ORDER, "Title *", &form.title),
            (DESCRIPTION_ORDER, "Description", &form.description),
            (START_DATE_ORDER, "Start date *", &form.start_date),
            (DEADLINE_ORDER, "Deadline *", &form.deadline),
            (ASSIGNEE_ORDER, "Assignee", &form.assignee),
        ];
        for (order, title, field) in text_fields {
            let focused = form.current_field == order;
            let style = if focused { Style::default().fg(GOLD) } else { Style::default() };
            let widget = Paragraph::new(field.value.as_str())
                .block(Block::default().borders(Borders::ALL).title(title).border_style(style));
            f.render_widget(widget, chunks[order]);
            if focused {
                let x = chunks[order].x + 1 + field.cursor as u16;
                f.set_cursor_position((x.min(chunks[order].right().saturating_sub(2)), chunks[order].y + 1));
            }
        }

        let priority_style = if form.current_field == PRIORITY_ORDER { Style::default().fg(GOLD) } else { Style::default() };
        let spans: Vec<Span> = Priority::ALL
            .iter()
            .map(|p| {
                if *p == form.selected_priority() {
                    Span::styled(format!("[{}] ", p.label()), Style::default().add_modifier(Modifier::BOLD))
                } else {
                    Span::raw(format!(" {}  ", p.label()))
                }
            })
            .collect();
        let priority = Paragraph::new(Line::from(spans)).block(
            Block::default().borders(Borders::ALL).title("Priority (←/→)").border_style(priority_style),
        );
        f.render_widget(priority, chunks[PRIORITY_ORDER]);

        let footer = match &form.error {
            Some(msg) => Paragraph::new(msg.as_str()).style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            None => Paragraph::new("Dates: YYYY-MM-DD, today, tomorrow, in 3d, eow, eom")
                .style(Style::default().fg(Color::DarkGray)),
        };
        f.render_widget(footer.wrap(Wrap { trim: true }), chunks[6]);
    }

    fn render_dropdown(&self, f: &mut Frame, area: Rect) {
        let Some(task) = self.view.dropdown_for().and_then(|id| self.engine.store().get(id)) else {
            return;
        };
        let area = centered_rect(30, 30, area);
        f.render_widget(Clear, area);
        let items: Vec<ListItem> = Status::ALL
            .iter()
            .map(|s| {
                let marker = if *s == task.status { "●" } else { " " };
                ListItem::new(format!("{marker} {}", s.label())).style(Style::default().fg(status_color(*s)))
            })
            .collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(format!("Status of #{}", task.id)))
            .highlight_style(Style::default().bg(GOLD).fg(text_on(GOLD)));
        let mut state = ListState::default();
        state.select(Some(self.dropdown_selected));
        f.render_stateful_widget(list, area, &mut state);
    }

    fn render_task_detail(&self, f: &mut Frame, area: Rect) {
        let Some(task) = self.detail_id.and_then(|id| self.engine.store().get(id)) else {
            return;
        };
        let today = self.today();
        let area = centered_rect(70, 60, area);
        f.render_widget(Clear, area);
        let description = if task.description.is_empty() { "-" } else { task.description.as_str() };
        let lines = vec![
            Line::from(Span::styled(
                format!("Task #{}: {}", task.id, task.title),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(format!("Status:     {}", task.status)),
            Line::from(format!("Priority:   {}", task.priority.label())),
            Line::from(format!("Assignee:   {}", task.assignee_label())),
            Line::from(format!("Start:      {}", task.start_date)),
            Line::from(format!(
                "Deadline:   {} ({})",
                task.deadline,
                format_due_relative(task.deadline, today)
            )),
            Line::from(format!("Completed:  {}", format_local_date(task.completed_at))),
            Line::from(""),
            Line::from("Description:"),
            Line::from(description),
        ];
        let popup = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Task Details (any key to close)")
                    .border_style(Style::default().fg(status_color(task.status)).add_modifier(Modifier::BOLD)),
            )
            .wrap(Wrap { trim: true })
            .style(Style::default().bg(Color::Black));
        f.render_widget(popup, area);
    }

    fn render_archive(&self, f: &mut Frame, area: Rect) {
        let area = centered_rect(70, 70, area);
        f.render_widget(Clear, area);
        let archived = self.engine.store().list_archived();
        let items: Vec<ListItem> = if archived.is_empty() {
            vec![ListItem::new("Archive is empty.").style(Style::default().fg(Color::DarkGray))]
        } else {
            archived
                .iter()
                .map(|t| {
                    ListItem::new(format!(
                        "#{:<4} {:<12} archived {}  {}",
                        t.id,
                        t.status.label(),
                        format_local_date(t.deleted_at),
                        t.title
                    ))
                })
                .collect()
        };
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Archive ({})  r recover  x delete  Esc close", archived.len())),
            )
            .highlight_style(Style::default().bg(GOLD).fg(text_on(GOLD)));
        let mut state = ListState::default();
        if !archived.is_empty() {
            state.select(Some(self.archive_selected));
        }
        f.render_stateful_widget(list, area, &mut state);
    }

    fn render_confirm(&self, f: &mut Frame, area: Rect, id: u64) {
        let title = self
            .engine
            .store()
            .get_archived(id)
            .map(|t| t.title.as_str())
            .unwrap_or("(gone)");
        let area = centered_rect(50, 25, area);
        f.render_widget(Clear, area);
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Permanently delete this task?",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("#{id} {title}")),
            Line::from(""),
            Line::from("This action cannot be undone."),
            Line::from(""),
            Line::from("Press 'y' to confirm, 'n' to cancel"),
        ];
        let popup = Paragraph::new(text)
            .block(Block::default().title("Confirm Delete").borders(Borders::ALL))
            .style(Style::default().bg(DARK_RED))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(popup, area);
    }

    fn render_notifications(&self, f: &mut Frame, area: Rect) {
        let area = centered_rect(60, 50, area);
        f.render_widget(Clear, area);
        let feed = self.engine.feed();
        let mut lines: Vec<Line> = Vec::new();
        if feed.is_empty() {
            lines.push(Line::styled("No notifications.", Style::default().fg(Color::DarkGray)));
        }
        for note in feed.iter() {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{:<8}", note.kind.label()),
                    Style::default().fg(notification_color(note.kind)).add_modifier(Modifier::BOLD),
                ),
                Span::raw(note.message.clone()),
            ]));
            lines.push(Line::styled(
                format!("        {}", note.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M")),
                Style::default().fg(Color::DarkGray),
            ));
        }
        let popup = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Notifications  c clear  Esc close"))
            .wrap(Wrap { trim: true });
        f.render_widget(popup, area);
    }

    fn render_settings(&self, f: &mut Frame, area: Rect) {
        let area = centered_rect(50, 30, area);
        f.render_widget(Clear, area);
        let text = vec![
            Line::from(""),
            Line::from("Archive completed tasks after"),
            Line::from(Span::styled(
                format!("◀  {} day(s)  ▶", self.retention_draft),
                Style::default().fg(GOLD).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::styled(
                format!("Range {MIN_RETENTION_DAYS}-{MAX_RETENTION_DAYS}. Enter saves and re-runs the sweep, Esc cancels."),
                Style::default().fg(Color::DarkGray),
            ),
        ];
        let popup = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("Archive Settings"))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(popup, area);
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let help = vec![
            Line::styled("Everywhere:", bold),
            Line::from("  Tab          Switch schedule / board"),
            Line::from("  a            Add task"),
            Line::from("  s            Change status of the selected task"),
            Line::from("  Enter        Task details"),
            Line::from("  r            Archive (recover or delete)"),
            Line::from("  n            Notifications"),
            Line::from("  o            Archive settings"),
            Line::from("  q/Esc/Ctrl+C Quit"),
            Line::from(""),
            Line::styled("Schedule:", bold),
            Line::from("  1-5          All / Pending / In Progress / Completed / Overdue"),
            Line::from("  c            View all completed tasks"),
            Line::from("  v            Toggle list and calendar"),
            Line::from("  [ ]          Previous / next month"),
            Line::from("  ↑↓ j k       Move selection"),
            Line::from(""),
            Line::styled("Board:", bold),
            Line::from("  ←→↑↓         Select card"),
            Line::from("  Ctrl+←/→     Move card to the neighbouring column"),
            Line::from("  Space        Pick up card, Space again to drop"),
            Line::from(""),
            Line::from("Completing a task from the 'All' filter switches to 'Completed'."),
        ];
        let area = centered_rect(70, 80, area);
        f.render_widget(Clear, area);
        let popup = Paragraph::new(help)
            .block(Block::default().borders(Borders::ALL).title("Help - press any key to return"))
            .wrap(Wrap { trim: true });
        f.render_widget(popup, area);
    }

    /// Main event loop. The sweep timer is started before the loop is entered
    /// and stopped when it exits.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        let result = self.event_loop(terminal);
        self.engine.stop();
        result
    }

    fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                return Ok(());
            }

            let report = self.engine.tick();
            if let Some(msg) = report.message() {
                self.set_status_message(msg);
                self.refresh_board_cursor(None);
            }
        }
    }
}

fn local_day(engine: &Engine) -> NaiveDate {
    engine.now().with_timezone(&Local).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::task::NewTask;
    use chrono::{TimeZone, Utc};
    use ratatui::backend::TestBackend;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Press)
    }

    fn ctrl(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::CONTROL, KeyEventKind::Press)
    }

    fn app(screen: Screen) -> (App, tempfile::TempDir, ManualClock) {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap());
        let mut engine = Engine::new(&Settings::default(), Box::new(clock.clone())).unwrap();
        let d = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        engine.create_task(NewTask::new("Rough cut", d, d + chrono::Duration::days(5))).unwrap();
        engine.create_task(NewTask::new("Sound mix", d, d + chrono::Duration::days(9))).unwrap();
        engine.start();
        let app = App::new(engine, Settings::default(), dir.path().to_path_buf(), screen);
        (app, dir, clock)
    }

    #[test]
    fn status_dropdown_completes_and_switches_filter() {
        let (mut app, _dir, _) = app(Screen::Schedule);
        app.handle_screen_input(key(KeyCode::Char('s')));
        assert_eq!(app.overlay, Overlay::StatusDropdown);
        app.handle_dropdown_input(KeyCode::Down);
        app.handle_dropdown_input(KeyCode::Down);
        app.handle_dropdown_input(KeyCode::Enter);
        assert_eq!(app.overlay, Overlay::None);
        assert_eq!(app.view.filter(), StatusFilter::Only(Status::Completed));
        assert_eq!(app.engine.store().get(1).unwrap().status, Status::Completed);
    }

    #[test]
    fn board_ctrl_arrow_moves_card() {
        let (mut app, _dir, _) = app(Screen::Board);
        app.handle_screen_input(ctrl(KeyCode::Right));
        assert_eq!(app.engine.store().get(1).unwrap().status, Status::InProgress);
        assert_eq!(app.board.selected_column, Status::InProgress.column());
        app.handle_screen_input(ctrl(KeyCode::Left));
        assert_eq!(app.engine.store().get(1).unwrap().status, Status::Pending);
    }

    #[test]
    fn board_pick_and_drop_on_same_column_is_noop() {
        let (mut app, _dir, _) = app(Screen::Board);
        app.handle_screen_input(key(KeyCode::Char(' ')));
        assert_eq!(app.board.dragging, Some(1));
        app.handle_screen_input(key(KeyCode::Char(' ')));
        assert_eq!(app.board.dragging, None);
        assert_eq!(app.engine.store().get(1).unwrap().status, Status::Pending);

        app.handle_screen_input(key(KeyCode::Char(' ')));
        app.handle_screen_input(key(KeyCode::Right));
        app.handle_screen_input(key(KeyCode::Right));
        app.handle_screen_input(key(KeyCode::Char(' ')));
        assert_eq!(app.engine.store().get(1).unwrap().status, Status::Completed);
    }

    #[test]
    fn form_reports_missing_deadline_inline() {
        let (mut app, _dir, _) = app(Screen::Schedule);
        app.handle_screen_input(key(KeyCode::Char('a')));
        for c in "Titles".chars() {
            app.handle_form_input(key(KeyCode::Char(c)));
        }
        app.handle_form_input(key(KeyCode::Enter));
        assert_eq!(app.overlay, Overlay::AddTask);
        assert_eq!(app.form.error.as_deref(), Some("deadline is required"));
        assert_eq!(app.engine.store().active_len(), 2);
    }

    #[test]
    fn settings_change_is_saved_and_applied() {
        let (mut app, dir, _) = app(Screen::Schedule);
        app.handle_screen_input(key(KeyCode::Char('o')));
        app.handle_settings_input(KeyCode::Right);
        app.handle_settings_input(KeyCode::Right);
        app.handle_settings_input(KeyCode::Enter);
        assert_eq!(app.engine.retention_days(), 5);
        assert_eq!(Settings::load(dir.path()).retention_days, 5);
    }

    #[test]
    fn archive_recover_and_confirmed_purge() {
        let (mut app, _dir, clock) = app(Screen::Schedule);
        app.engine.set_status(1, Status::Completed).unwrap();
        app.engine.set_status(2, Status::Completed).unwrap();
        clock.advance(chrono::Duration::days(4));
        app.engine.run_sweep();
        assert_eq!(app.engine.store().archived_len(), 2);

        app.handle_screen_input(key(KeyCode::Char('r')));
        app.handle_archive_input(KeyCode::Char('r'));
        assert_eq!(app.engine.store().archived_len(), 1);

        app.handle_archive_input(KeyCode::Char('x'));
        assert!(matches!(app.overlay, Overlay::ConfirmPurge(_)));
        app.handle_confirm_input(KeyCode::Char('n'), 0);
        assert_eq!(app.overlay, Overlay::Archive);
        app.handle_archive_input(KeyCode::Char('x'));
        let Overlay::ConfirmPurge(id) = app.overlay else { panic!("no confirm") };
        app.handle_confirm_input(KeyCode::Char('y'), id);
        assert_eq!(app.engine.store().archived_len(), 0);
        assert_eq!(app.engine.feed().iter().next().unwrap().kind, NotificationKind::Warning);
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal.backend().buffer().content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn recently_completed_panel_only_under_all() {
        let (mut app, _dir, _) = app(Screen::Schedule);
        let mut terminal = Terminal::new(TestBackend::new(140, 45)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        assert!(screen_text(&terminal).contains("Recently Completed"));

        app.handle_screen_input(key(KeyCode::Char('c')));
        assert_eq!(app.view.filter(), StatusFilter::Only(Status::Completed));
        terminal.draw(|f| app.render(f)).unwrap();
        assert!(!screen_text(&terminal).contains("Recently Completed"));

        app.handle_screen_input(key(KeyCode::Char('1')));
        assert_eq!(app.view.filter(), StatusFilter::All);
    }

    #[test]
    fn renders_every_screen_and_overlay() {
        let (mut app, _dir, _) = app(Screen::Schedule);
        let mut terminal = Terminal::new(TestBackend::new(140, 45)).unwrap();
        let overlays = [
            Overlay::None,
            Overlay::AddTask,
            Overlay::Archive,
            Overlay::ConfirmPurge(9),
            Overlay::Notifications,
            Overlay::Settings,
            Overlay::Help,
        ];
        for screen in [Screen::Schedule, Screen::Board] {
            app.screen = screen;
            for overlay in overlays {
                app.overlay = overlay;
                terminal.draw(|f| app.render(f)).unwrap();
            }
        }
        app.screen = Screen::Schedule;
        app.overlay = Overlay::None;
        app.view.toggle_view_mode();
        terminal.draw(|f| app.render(f)).unwrap();
    }
}
