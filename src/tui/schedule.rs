//! Schedule screen: filterable task list or month calendar, with the
//! recently completed panel alongside.

use chrono::{Datelike, NaiveDate};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::calendar::{CalendarCell, MonthGrid};
use crate::fields::{Status, StatusFilter};
use crate::store::{format_due_relative, format_local_date, truncate};
use crate::task::Task;
use crate::tui::colors::{priority_color, status_color, text_on, GOLD, SLATE};

/// Filter chips in keyboard order (1-5).
pub const FILTERS: [StatusFilter; 5] = [
    StatusFilter::All,
    StatusFilter::Only(Status::Pending),
    StatusFilter::Only(Status::InProgress),
    StatusFilter::Only(Status::Completed),
    StatusFilter::Only(Status::Overdue),
];

pub fn render_filter_bar(f: &mut Frame, area: Rect, current: StatusFilter) {
    let mut spans = Vec::new();
    for (i, filter) in FILTERS.iter().enumerate() {
        let label = format!(" {} {} ", i + 1, filter.label());
        let style = if *filter == current {
            Style::default().bg(GOLD).fg(text_on(GOLD)).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::raw(" "));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

pub fn render_task_table(
    f: &mut Frame,
    area: Rect,
    tasks: &[&Task],
    selected: usize,
    filter: StatusFilter,
    today: NaiveDate,
) {
    let header = Row::new(
        ["ID", "Status", "Priority", "Start", "Deadline", "Due", "Assignee", "Title"]
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD))),
    )
    .style(Style::default().bg(SLATE).fg(Color::White))
    .height(1);

    let rows = tasks.iter().map(|t| {
        let due = if t.status == Status::Completed {
            format!("done {}", format_local_date(t.completed_at))
        } else {
            format_due_relative(t.deadline, today)
        };
        let due_style = if t.is_past_deadline(today) {
            Style::default().fg(Color::Red)
        } else {
            Style::default()
        };
        Row::new(vec![
            Cell::from(t.id.to_string()),
            Cell::from(t.status.label()).style(Style::default().fg(status_color(t.status))),
            Cell::from(t.priority.label()).style(Style::default().fg(priority_color(t.priority))),
            Cell::from(t.start_date.to_string()),
            Cell::from(t.deadline.to_string()),
            Cell::from(due).style(due_style),
            Cell::from(truncate(t.assignee_label(), 14)),
            Cell::from(t.title.clone()),
        ])
    });

    let widths = [
        Constraint::Length(5),
        Constraint::Length(12),
        Constraint::Length(9),
        Constraint::Length(11),
        Constraint::Length(11),
        Constraint::Length(16),
        Constraint::Length(15),
        Constraint::Min(10),
    ];
    let title = format!("{} ({})", filter.label(), tasks.len());
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().bg(GOLD).fg(text_on(GOLD)));

    let mut state = TableState::default();
    if !tasks.is_empty() {
        state.select(Some(selected.min(tasks.len() - 1)));
    }
    f.render_stateful_widget(table, area, &mut state);

    if tasks.is_empty() {
        let inner = Rect { x: area.x + 2, y: area.y + 2, width: area.width.saturating_sub(4), height: 1 };
        f.render_widget(Paragraph::new("No tasks. Press 'a' to add one.").style(Style::default().fg(Color::DarkGray)), inner);
    }
}

pub fn render_calendar(f: &mut Frame, area: Rect, grid: &MonthGrid<'_>, today: NaiveDate) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("{}  ([ / ] or Left/Right to change month)", grid.month.label()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let weeks: Vec<_> = grid.weeks().collect();
    let mut row_constraints = vec![Constraint::Length(1)];
    row_constraints.extend(weeks.iter().map(|_| Constraint::Ratio(1, weeks.len().max(1) as u32)));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(row_constraints)
        .split(inner);

    let day_columns = |r: Rect| {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 7); 7])
            .split(r)
    };

    let header = day_columns(rows[0]);
    for (i, name) in ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"].iter().enumerate() {
        f.render_widget(Paragraph::new(*name).style(Style::default().add_modifier(Modifier::BOLD)), header[i]);
    }

    for (w, week) in weeks.iter().enumerate() {
        let cells = day_columns(rows[w + 1]);
        for (i, cell) in week.iter().enumerate() {
            let CalendarCell::Day { day, tasks } = cell else {
                continue;
            };
            let is_today = grid.month.contains(today) && *day == today.day();
            let border = if is_today { Style::default().fg(GOLD) } else { Style::default().fg(Color::DarkGray) };
            let mut lines = vec![Line::from(Span::styled(day.to_string(), Style::default().add_modifier(Modifier::BOLD)))];
            for t in tasks {
                lines.push(Line::styled(format!("• {}", t.title), Style::default().fg(status_color(t.status))));
            }
            let widget = Paragraph::new(lines)
                .block(Block::default().borders(Borders::ALL).border_style(border))
                .wrap(Wrap { trim: true });
            f.render_widget(widget, cells[i]);
        }
    }
}

pub fn render_recently_completed(f: &mut Frame, area: Rect, tasks: &[&Task], retention_days: u32) {
    let mut lines = Vec::new();
    if tasks.is_empty() {
        lines.push(Line::styled("Nothing completed yet.", Style::default().fg(Color::DarkGray)));
    }
    for t in tasks {
        lines.push(Line::from(Span::styled(
            format!("#{} {}", t.id, t.title),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::styled(
            format!("  completed {}", format_local_date(t.completed_at)),
            Style::default().fg(status_color(Status::Completed)),
        ));
    }
    lines.push(Line::from(""));
    lines.push(Line::styled(
        format!("Archived after {retention_days} day(s)."),
        Style::default().fg(Color::DarkGray),
    ));
    lines.push(Line::styled("c  view all completed", Style::default().fg(Color::DarkGray)));

    let panel = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Recently Completed"))
        .wrap(Wrap { trim: true });
    f.render_widget(panel, area);
}
