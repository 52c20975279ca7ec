//! View controllers for the schedule and the kanban board.
//!
//! `TaskViewController` turns user intents (pick a status, drop a card on a
//! column, change the filter, page the calendar) into engine calls. It owns
//! only transient view state; all task data stays in the [`Engine`].

use chrono::NaiveDate;
use tracing::{debug, error};

use crate::calendar::{project_month, MonthGrid, YearMonth};
use crate::engine::Engine;
use crate::error::TaskError;
use crate::fields::{Status, StatusFilter, ViewMode};
use crate::store::{StatusChange, TaskStore};
use crate::task::Task;

/// How many completed tasks the "recently completed" panel shows.
pub const RECENTLY_COMPLETED_LIMIT: usize = 3;

/// Result of an archive-view action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveOutcome {
    Done,
    /// The task was no longer where the view thought it was; refresh.
    Stale,
}

#[derive(Debug, Clone)]
pub struct TaskViewController {
    filter: StatusFilter,
    view_mode: ViewMode,
    open_dropdown: Option<u64>,
    month: YearMonth,
}

impl TaskViewController {
    pub fn new(today: NaiveDate) -> Self {
        TaskViewController {
            filter: StatusFilter::All,
            view_mode: ViewMode::List,
            open_dropdown: None,
            month: YearMonth::of(today),
        }
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn toggle_view_mode(&mut self) {
        self.view_mode = match self.view_mode {
            ViewMode::List => ViewMode::Calendar,
            ViewMode::Calendar => ViewMode::List,
        };
    }

    /// Open the status dropdown for `id`, closing any other.
    pub fn open_dropdown(&mut self, id: u64) {
        self.open_dropdown = Some(id);
    }

    pub fn close_dropdown(&mut self) {
        self.open_dropdown = None;
    }

    pub fn dropdown_for(&self) -> Option<u64> {
        self.open_dropdown
    }

    /// Status picked from the dropdown.
    pub fn change_status(&mut self, engine: &mut Engine, id: u64, status: Status) -> Result<StatusChange, TaskError> {
        self.open_dropdown = None;
        let change = engine.set_status(id, status)?;
        self.follow_completion(&change);
        Ok(change)
    }

    /// A card dropped on the column for `column`. Dropping on its own column
    /// does nothing and returns `None`.
    pub fn drop_on_column(
        &mut self,
        engine: &mut Engine,
        id: u64,
        column: Status,
    ) -> Result<Option<StatusChange>, TaskError> {
        let current = engine
            .store()
            .get(id)
            .map(|t| t.status)
            .ok_or(TaskError::NotFound { id, collection: "active" })?;
        if current == column {
            return Ok(None);
        }
        let change = engine.set_status(id, column)?;
        self.follow_completion(&change);
        Ok(Some(change))
    }

    // Show the user where a freshly completed task went, unless they chose a
    // specific filter themselves.
    fn follow_completion(&mut self, change: &StatusChange) {
        if change.to == Status::Completed && !change.is_noop() && self.filter == StatusFilter::All {
            self.filter = StatusFilter::Only(Status::Completed);
        }
    }

    pub fn visible_tasks<'a>(&self, store: &'a TaskStore) -> Vec<&'a Task> {
        store.list_active(self.filter)
    }

    pub fn recently_completed<'a>(&self, store: &'a TaskStore) -> Vec<&'a Task> {
        store.recently_completed(RECENTLY_COMPLETED_LIMIT)
    }

    /// Kanban columns, one per status, each in creation order.
    pub fn board_columns<'a>(&self, store: &'a TaskStore) -> [Vec<&'a Task>; 4] {
        let mut columns: [Vec<&'a Task>; 4] = Default::default();
        for task in store.active() {
            columns[task.status.column()].push(task);
        }
        columns
    }

    pub fn recover(&mut self, engine: &mut Engine, id: u64) -> ArchiveOutcome {
        archive_action(engine.recover(id), id, "recover")
    }

    pub fn purge(&mut self, engine: &mut Engine, id: u64) -> ArchiveOutcome {
        archive_action(engine.purge(id).map(|_| ()), id, "purge")
    }

    pub fn month(&self) -> YearMonth {
        self.month
    }

    pub fn change_month(&mut self, delta: i32) {
        self.month = self.month.shift(delta);
    }

    pub fn calendar<'a>(&self, store: &'a TaskStore) -> MonthGrid<'a> {
        project_month(store.active(), self.month)
    }
}

fn archive_action(result: Result<(), TaskError>, id: u64, action: &str) -> ArchiveOutcome {
    match result {
        Ok(()) => ArchiveOutcome::Done,
        Err(TaskError::NotFound { .. }) => {
            debug!(id, action, "archive entry already gone; refreshing");
            ArchiveOutcome::Stale
        }
        Err(e) => {
            error!(id, action, error = %e, "archive action failed");
            ArchiveOutcome::Stale
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::settings::Settings;
    use crate::task::NewTask;
    use chrono::{Duration, TimeZone, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
    }

    fn setup() -> (Engine, TaskViewController, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap());
        let settings = Settings { retention_days: 1, ..Default::default() };
        let engine = Engine::new(&settings, Box::new(clock.clone())).unwrap();
        (engine, TaskViewController::new(today()), clock)
    }

    fn add(engine: &mut Engine, title: &str) -> u64 {
        engine
            .create_task(NewTask::new(title, today(), NaiveDate::from_ymd_opt(2024, 2, 10).unwrap()))
            .unwrap()
    }

    #[test]
    fn completing_from_all_switches_filter() {
        let (mut engine, mut view, _) = setup();
        let t1 = add(&mut engine, "Conform");
        view.open_dropdown(t1);
        view.change_status(&mut engine, t1, Status::Completed).unwrap();
        assert_eq!(view.filter(), StatusFilter::Only(Status::Completed));
        assert_eq!(view.dropdown_for(), None);
        assert_eq!(view.visible_tasks(engine.store())[0].id, t1);
    }

    #[test]
    fn explicit_filter_is_kept() {
        let (mut engine, mut view, _) = setup();
        let t1 = add(&mut engine, "Conform");
        view.set_filter(StatusFilter::Only(Status::Pending));
        view.change_status(&mut engine, t1, Status::Completed).unwrap();
        assert_eq!(view.filter(), StatusFilter::Only(Status::Pending));
        assert!(view.visible_tasks(engine.store()).is_empty());
    }

    #[test]
    fn other_statuses_do_not_switch_filter() {
        let (mut engine, mut view, _) = setup();
        let t1 = add(&mut engine, "Conform");
        view.change_status(&mut engine, t1, Status::Overdue).unwrap();
        assert_eq!(view.filter(), StatusFilter::All);
    }

    #[test]
    fn drop_on_same_column_is_noop() {
        let (mut engine, mut view, _) = setup();
        let t1 = add(&mut engine, "Grade");
        assert_eq!(view.drop_on_column(&mut engine, t1, Status::Pending).unwrap(), None);

        let moved = view.drop_on_column(&mut engine, t1, Status::InProgress).unwrap().unwrap();
        assert_eq!((moved.from, moved.to), (Status::Pending, Status::InProgress));
        let columns = view.board_columns(engine.store());
        assert_eq!(columns[Status::InProgress.column()][0].id, t1);
        assert!(columns[Status::Pending.column()].is_empty());
    }

    #[test]
    fn drop_on_completed_column_follows_filter_rule() {
        let (mut engine, mut view, _) = setup();
        let t1 = add(&mut engine, "Grade");
        view.drop_on_column(&mut engine, t1, Status::Completed).unwrap();
        assert_eq!(view.filter(), StatusFilter::Only(Status::Completed));
        assert!(engine.store().get(t1).unwrap().completed_at.is_some());
    }

    #[test]
    fn drop_of_unknown_card_is_not_found() {
        let (mut engine, mut view, _) = setup();
        assert!(matches!(
            view.drop_on_column(&mut engine, 42, Status::Completed),
            Err(TaskError::NotFound { id: 42, .. })
        ));
    }

    #[test]
    fn stale_archive_actions_refresh_silently() {
        let (mut engine, mut view, clock) = setup();
        let t1 = add(&mut engine, "Archive me");
        engine.set_status(t1, Status::Completed).unwrap();
        clock.advance(Duration::days(2));
        engine.run_sweep();

        assert_eq!(view.purge(&mut engine, t1), ArchiveOutcome::Done);
        assert_eq!(view.purge(&mut engine, t1), ArchiveOutcome::Stale);
        assert_eq!(view.recover(&mut engine, t1), ArchiveOutcome::Stale);
    }

    #[test]
    fn calendar_follows_month_cursor() {
        let (mut engine, mut view, _) = setup();
        let t1 = add(&mut engine, "Deliver");
        let grid = view.calendar(engine.store());
        assert_eq!(grid.month, YearMonth::new(2024, 2).unwrap());
        assert!(grid.cells.iter().any(|c| c.tasks().iter().any(|t| t.id == t1)));

        view.change_month(1);
        let march = view.calendar(engine.store());
        assert!(march.cells.iter().all(|c| c.tasks().is_empty()));
        view.change_month(-2);
        assert_eq!(view.month(), YearMonth::new(2024, 1).unwrap());
    }

    #[test]
    fn view_mode_toggles() {
        let (_, mut view, _) = setup();
        assert_eq!(view.view_mode(), ViewMode::List);
        view.toggle_view_mode();
        assert_eq!(view.view_mode(), ViewMode::Calendar);
    }
}
