//! Month grid projection of tasks by deadline.
//!
//! Weeks start on Sunday. The grid has one blank cell per weekday before the
//! 1st, then one cell per day of the month; trailing cells are not padded.

use chrono::{Datelike, Months, NaiveDate};

use crate::task::Task;

/// A displayed month, held as its first day so every value is a real date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearMonth(NaiveDate);

impl YearMonth {
    /// Returns `None` unless `month` is 1..=12 and the year is representable.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(YearMonth)
    }

    pub fn of(date: NaiveDate) -> Self {
        YearMonth(date.with_day(1).unwrap_or(date))
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month(self) -> u32 {
        self.0.month()
    }

    /// Move by `delta` months, wrapping the year. Stays put at the edge of
    /// the representable calendar.
    pub fn shift(self, delta: i32) -> Self {
        let months = Months::new(delta.unsigned_abs());
        let moved = if delta < 0 {
            self.0.checked_sub_months(months)
        } else {
            self.0.checked_add_months(months)
        };
        moved.map_or(self, YearMonth)
    }

    pub fn days_in_month(self) -> u32 {
        (29..=31)
            .rev()
            .find(|&day| self.0.with_day(day).is_some())
            .unwrap_or(28)
    }

    /// Blank cells before the 1st (Sunday = 0).
    pub fn leading_blanks(self) -> u32 {
        self.0.weekday().num_days_from_sunday()
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }

    /// "February 2024".
    pub fn label(self) -> String {
        self.0.format("%B %Y").to_string()
    }
}

/// One cell of the grid.
#[derive(Debug, Clone, PartialEq)]
pub enum CalendarCell<'a> {
    Blank,
    Day { day: u32, tasks: Vec<&'a Task> },
}

impl CalendarCell<'_> {
    pub fn day(&self) -> Option<u32> {
        match self {
            CalendarCell::Blank => None,
            CalendarCell::Day { day, .. } => Some(*day),
        }
    }

    pub fn tasks(&self) -> &[&Task] {
        match self {
            CalendarCell::Blank => &[],
            CalendarCell::Day { tasks, .. } => tasks,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MonthGrid<'a> {
    pub month: YearMonth,
    pub cells: Vec<CalendarCell<'a>>,
}

impl<'a> MonthGrid<'a> {
    /// Rows of seven cells; the last row may be short.
    pub fn weeks(&self) -> std::slice::Chunks<'_, CalendarCell<'a>> {
        self.cells.chunks(7)
    }
}

/// Bucket `tasks` into the days of `month` by deadline.
pub fn project_month<'a, I>(tasks: I, month: YearMonth) -> MonthGrid<'a>
where
    I: IntoIterator<Item = &'a Task>,
{
    let blanks = month.leading_blanks() as usize;
    let days = month.days_in_month();

    let mut cells: Vec<CalendarCell<'a>> = Vec::with_capacity(blanks + days as usize);
    cells.extend(std::iter::repeat_with(|| CalendarCell::Blank).take(blanks));
    cells.extend((1..=days).map(|day| CalendarCell::Day { day, tasks: Vec::new() }));

    for task in tasks {
        if !month.contains(task.deadline) {
            continue;
        }
        let idx = blanks + task.deadline.day() as usize - 1;
        if let Some(CalendarCell::Day { tasks, .. }) = cells.get_mut(idx) {
            tasks.push(task);
        }
    }

    MonthGrid { month, cells }
}

/// Render a month as plain text for the CLI.
pub fn render_text(grid: &MonthGrid<'_>) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:^28}\n", grid.month.label()));
    out.push_str(" Sun Mon Tue Wed Thu Fri Sat\n");
    for week in grid.weeks() {
        for cell in week {
            match cell {
                CalendarCell::Blank => out.push_str("    "),
                CalendarCell::Day { day, tasks } if tasks.is_empty() => out.push_str(&format!("{:>4}", day)),
                CalendarCell::Day { day, .. } => out.push_str(&format!("{:>3}*", day)),
            }
        }
        out.push('\n');
    }
    for cell in &grid.cells {
        if let CalendarCell::Day { day, tasks } = cell {
            for t in tasks {
                out.push_str(&format!("{:>2}: #{} {} [{}]\n", day, t.id, t.title, t.status.label()));
            }
        }
    }
    out
}
