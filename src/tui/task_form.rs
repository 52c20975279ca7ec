//! Add-task form for the terminal user interface.
//!
//! Text fields and the priority selector are visited in a fixed order. The
//! form turns its contents into a [`NewTask`]; blank required fields are left
//! empty so the store reports them, while unparseable dates are caught here.

use chrono::NaiveDate;

use crate::fields::Priority;
use crate::store::parse_date_input;
use crate::task::NewTask;
use crate::tui::input::InputField;

pub const TITLE_ORDER: usize = 0;
pub const DESCRIPTION_ORDER: usize = 1;
pub const START_DATE_ORDER: usize = 2;
pub const DEADLINE_ORDER: usize = 3;
pub const PRIORITY_ORDER: usize = 4;
pub const ASSIGNEE_ORDER: usize = 5;
const FIELD_COUNT: usize = 6;

pub struct TaskForm {
    pub title: InputField,
    pub description: InputField,
    pub start_date: InputField,
    pub deadline: InputField,
    pub assignee: InputField,
    pub priority: usize,
    pub current_field: usize,
    /// Inline validation message shown under the form.
    pub error: Option<String>,
}

impl TaskForm {
    /// Empty form with the start date prefilled to `today`.
    pub fn new(today: NaiveDate) -> Self {
        TaskForm {
            title: InputField::new(),
            description: InputField::new(),
            start_date: InputField::with_value(&today.to_string()),
            deadline: InputField::new(),
            assignee: InputField::new(),
            priority: Priority::ALL.iter().position(|&p| p == Priority::Medium).unwrap_or(0),
            current_field: TITLE_ORDER,
            error: None,
        }
    }

    pub fn selected_priority(&self) -> Priority {
        Priority::ALL[self.priority % Priority::ALL.len()]
    }

    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % FIELD_COUNT;
    }

    pub fn prev_field(&mut self) {
        self.current_field = (self.current_field + FIELD_COUNT - 1) % FIELD_COUNT;
    }

    fn current_input(&mut self) -> Option<&mut InputField> {
        match self.current_field {
            TITLE_ORDER => Some(&mut self.title),
            DESCRIPTION_ORDER => Some(&mut self.description),
            START_DATE_ORDER => Some(&mut self.start_date),
            DEADLINE_ORDER => Some(&mut self.deadline),
            ASSIGNEE_ORDER => Some(&mut self.assignee),
            _ => None,
        }
    }

    pub fn handle_char(&mut self, c: char) {
        if let Some(field) = self.current_input() {
            field.handle_char(c);
        }
    }

    pub fn handle_backspace(&mut self) {
        if let Some(field) = self.current_input() {
            field.handle_backspace();
        }
    }

    /// Move the cursor, or cycle the priority when the selector is focused.
    pub fn handle_left_right(&mut self, right: bool) {
        if self.current_field == PRIORITY_ORDER {
            let n = Priority::ALL.len();
            self.priority = if right { (self.priority + 1) % n } else { (self.priority + n - 1) % n };
            return;
        }
        if let Some(field) = self.current_input() {
            if right {
                field.move_cursor_right();
            } else {
                field.move_cursor_left();
            }
        }
    }

    /// Build the creation input. Dates accept the same shorthand as the CLI
    /// ("today", "in 3d", "eow", YYYY-MM-DD).
    pub fn to_new_task(&self, today: NaiveDate) -> Result<NewTask, String> {
        let start_date = parse_optional_date(&self.start_date, "start date", today)?;
        let deadline = parse_optional_date(&self.deadline, "deadline", today)?;
        Ok(NewTask {
            title: self.title.trimmed(),
            description: self.description.trimmed(),
            start_date,
            deadline,
            priority: self.selected_priority(),
            assignee: self.assignee.trimmed(),
        })
    }
}

fn parse_optional_date(field: &InputField, name: &str, today: NaiveDate) -> Result<Option<NaiveDate>, String> {
    match field.trimmed() {
        None => Ok(None),
        Some(raw) => parse_date_input(&raw, today)
            .map(Some)
            .ok_or_else(|| format!("{name}: cannot read '{raw}'")),
    }
}
