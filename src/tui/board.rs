//! Kanban board view.
//!
//! One column per status. A card can be moved with Ctrl+Left/Right, or picked
//! up with Space, carried across columns and dropped with Space again.

use chrono::NaiveDate;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::fields::Status;
use crate::store::format_due_relative;
use crate::task::Task;
use crate::tui::colors::{priority_color, status_color, GOLD};

const CARD_HEIGHT: usize = 5;

/// Cursor and drag state of the board.
#[derive(Debug, Clone, Default)]
pub struct BoardState {
    pub selected_column: usize,
    pub selected_card: usize,
    scroll_offsets: [usize; 4],
    /// Card being carried, if any.
    pub dragging: Option<u64>,
}

impl BoardState {
    pub fn selected_task(&self, columns: &[Vec<&Task>; 4]) -> Option<u64> {
        columns[self.selected_column].get(self.selected_card).map(|t| t.id)
    }

    pub fn clamp(&mut self, columns: &[Vec<&Task>; 4]) {
        let len = columns[self.selected_column].len();
        if len == 0 {
            self.selected_card = 0;
        } else if self.selected_card >= len {
            self.selected_card = len - 1;
        }
    }

    pub fn move_column(&mut self, right: bool, columns: &[Vec<&Task>; 4]) {
        if right && self.selected_column + 1 < columns.len() {
            self.selected_column += 1;
        } else if !right && self.selected_column > 0 {
            self.selected_column -= 1;
        }
        self.clamp(columns);
    }

    pub fn move_card(&mut self, down: bool, columns: &[Vec<&Task>; 4]) {
        if down {
            self.selected_card += 1;
        } else {
            self.selected_card = self.selected_card.saturating_sub(1);
        }
        self.clamp(columns);
    }

    /// Column next to the selected one, for a Ctrl+arrow move.
    pub fn neighbour(&self, right: bool) -> Option<Status> {
        let target = if right { self.selected_column + 1 } else { self.selected_column.checked_sub(1)? };
        Status::ALL.get(target).copied()
    }

    /// Put the cursor on `id` after it changed column.
    pub fn follow(&mut self, id: u64, columns: &[Vec<&Task>; 4]) {
        for (c, column) in columns.iter().enumerate() {
            if let Some(pos) = column.iter().position(|t| t.id == id) {
                self.selected_column = c;
                self.selected_card = pos;
                return;
            }
        }
        self.clamp(columns);
    }
}

pub fn render_board(f: &mut Frame, area: Rect, columns: &[Vec<&Task>; 4], state: &mut BoardState, today: NaiveDate) {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(25); 4])
        .split(area);

    for (i, status) in Status::ALL.iter().enumerate() {
        render_column(f, layout[i], *status, &columns[i], state, today);
    }
}

fn render_column(f: &mut Frame, area: Rect, status: Status, cards: &[&Task], state: &mut BoardState, today: NaiveDate) {
    let column = status.column();
    let is_selected = column == state.selected_column;
    let accent = status_color(status);

    let border_style = if is_selected {
        let color = if state.dragging.is_some() { GOLD } else { accent };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(accent)
    };
    let title = format!("{} ({})", status.label(), cards.len());
    let block = Block::default().borders(Borders::ALL).title(title).border_style(border_style);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if cards.is_empty() {
        return;
    }

    let available_height = inner.height as usize;
    let visible_cards = (available_height / CARD_HEIGHT).max(1);
    let offset = &mut state.scroll_offsets[column];
    if is_selected {
        if state.selected_card < *offset {
            *offset = state.selected_card;
        } else if state.selected_card >= *offset + visible_cards {
            *offset = state.selected_card + 1 - visible_cards;
        }
    }
    let scroll_offset = (*offset).min(cards.len().saturating_sub(1));

    let mut y = 0;
    let mut rendered = 0;
    for (i, task) in cards.iter().enumerate().skip(scroll_offset) {
        if y + CARD_HEIGHT > available_height {
            break;
        }
        let card_area = Rect {
            x: inner.x,
            y: inner.y + y as u16,
            width: inner.width,
            height: CARD_HEIGHT as u16,
        };
        let selected = is_selected && i == state.selected_card;
        let carried = state.dragging == Some(task.id);
        render_card(f, card_area, task, selected, carried, today);
        y += CARD_HEIGHT;
        rendered += 1;
    }

    if scroll_offset > 0 {
        let above = Paragraph::new(format!("▲ +{scroll_offset} above")).style(Style::default().fg(Color::Cyan));
        f.render_widget(above, Rect { x: inner.x, y: inner.y, width: inner.width, height: 1 });
    }
    let remaining = cards.len() - scroll_offset - rendered;
    if remaining > 0 {
        let below = Paragraph::new(format!("▼ +{remaining} below")).style(Style::default().fg(Color::Cyan));
        f.render_widget(below, Rect { x: inner.x, y: inner.y + inner.height - 1, width: inner.width, height: 1 });
    }
}

fn render_card(f: &mut Frame, area: Rect, task: &Task, selected: bool, carried: bool, today: NaiveDate) {
    let style = if carried {
        Style::default().bg(GOLD).fg(Color::Black).add_modifier(Modifier::BOLD)
    } else if selected {
        Style::default().bg(status_color(task.status)).fg(Color::Black).add_modifier(Modifier::BOLD)
    } else {
        Style::default().bg(Color::DarkGray)
    };

    let due = if task.status == Status::Completed {
        "done".to_string()
    } else {
        format_due_relative(task.deadline, today)
    };
    let lines = vec![
        Line::from(format!("#{} {}", task.id, task.title)),
        Line::styled(
            format!("{} | due {}", task.priority.label(), due),
            Style::default().fg(if selected || carried { Color::Black } else { priority_color(task.priority) }),
        ),
        Line::from(task.assignee_label().to_string()),
    ];

    let card = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL))
        .style(style)
        .wrap(Wrap { trim: true });
    f.render_widget(card, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Priority;

    fn task(id: u64, status: Status) -> Task {
        let d = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        Task {
            id,
            title: format!("card {id}"),
            description: String::new(),
            start_date: d,
            deadline: d,
            priority: Priority::Medium,
            status,
            assignee: None,
            completed_at: None,
            deleted_at: None,
        }
    }

    #[test]
    fn cursor_moves_and_clamps() {
        let a = task(1, Status::Pending);
        let b = task(2, Status::Pending);
        let c = task(3, Status::InProgress);
        let columns: [Vec<&Task>; 4] = [vec![&a, &b], vec![&c], vec![], vec![]];
        let mut state = BoardState::default();

        state.move_card(true, &columns);
        assert_eq!(state.selected_task(&columns), Some(2));
        state.move_card(true, &columns);
        assert_eq!(state.selected_card, 1);
        state.move_column(true, &columns);
        assert_eq!(state.selected_task(&columns), Some(3));
        state.move_column(true, &columns);
        assert_eq!(state.selected_task(&columns), None);
        state.move_column(false, &columns);
        state.move_column(false, &columns);
        state.move_column(false, &columns);
        assert_eq!(state.selected_column, 0);
    }

    #[test]
    fn neighbours_stop_at_edges() {
        let mut state = BoardState::default();
        assert_eq!(state.neighbour(false), None);
        assert_eq!(state.neighbour(true), Some(Status::InProgress));
        state.selected_column = 3;
        assert_eq!(state.neighbour(true), None);
        assert_eq!(state.neighbour(false), Some(Status::Completed));
    }

    #[test]
    fn follow_finds_moved_card() {
        let a = task(1, Status::Pending);
        let b = task(2, Status::Completed);
        let columns: [Vec<&Task>; 4] = [vec![&a], vec![], vec![&b], vec![]];
        let mut state = BoardState::default();
        state.follow(2, &columns);
        assert_eq!((state.selected_column, state.selected_card), (2, 0));
    }
}
