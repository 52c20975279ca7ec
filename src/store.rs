//! Task store and display helpers.
//!
//! This module provides the `TaskStore`, which owns the two disjoint task
//! collections (active and archived) and the atomic operations that move
//! tasks between them, along with date parsing and formatting helpers shared
//! by the CLI and the terminal UI.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{SeedError, TaskError};
use crate::fields::*;
use crate::task::{NewTask, Task};

/// Result of a status change on an active task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub id: u64,
    pub from: Status,
    pub to: Status,
}

impl StatusChange {
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

/// Tasks to preload into a store. Read once at startup, never written back.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub archived: Vec<Task>,
}

impl Seed {
    /// Load a seed file. Accepts either `{"tasks": [...], "archived": [...]}`
    /// or a bare array of tasks.
    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let buf = fs::read_to_string(path).map_err(|source| SeedError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if buf.trim_start().starts_with('[') {
            let tasks: Vec<Task> = serde_json::from_str(&buf).map_err(|source| SeedError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
            return Ok(Seed { tasks, archived: Vec::new() });
        }
        serde_json::from_str(&buf).map_err(|source| SeedError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// In-memory store holding active and archived tasks.
///
/// A task id lives in exactly one of the two collections.
#[derive(Debug, Default)]
pub struct TaskStore {
    active: Vec<Task>,
    archived: Vec<Task>,
    last_id: u64,
}

impl TaskStore {
    pub fn new() -> Self {
        TaskStore::default()
    }

    /// Generate the next task id. Ids are never handed out twice.
    fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }

    /// Create a pending task from form input and append it to the active set.
    pub fn create_task(&mut self, input: NewTask) -> Result<u64, TaskError> {
        let title = input
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(TaskError::Validation { field: "title" })?;
        let start_date = input.start_date.ok_or(TaskError::Validation { field: "start date" })?;
        let deadline = input.deadline.ok_or(TaskError::Validation { field: "deadline" })?;

        let id = self.next_id();
        self.active.push(Task {
            id,
            title,
            description: input.description.unwrap_or_default(),
            start_date,
            deadline,
            priority: input.priority,
            status: Status::Pending,
            assignee: input.assignee.filter(|a| !a.trim().is_empty()),
            completed_at: None,
            deleted_at: None,
        });
        debug!(id, "task created");
        Ok(id)
    }

    /// Change the status of an active task, maintaining `completed_at`.
    pub fn set_status(&mut self, id: u64, status: Status, now: DateTime<Utc>) -> Result<StatusChange, TaskError> {
        let task = self.get_mut(id).ok_or(TaskError::NotFound { id, collection: "active" })?;
        let change = StatusChange { id, from: task.status, to: status };
        task.status = status;
        // Completing again restarts the retention window.
        task.completed_at = if status == Status::Completed { Some(now) } else { None };
        if !change.is_noop() {
            debug!(id, from = %change.from, to = %change.to, "status changed");
        }
        Ok(change)
    }

    /// Move a completed active task into the archive.
    pub fn archive(&mut self, id: u64, now: DateTime<Utc>) -> Result<(), TaskError> {
        let Some(idx) = self.active.iter().position(|t| t.id == id) else {
            return Err(TaskError::InvalidState { id, reason: "task is not active" });
        };
        if self.active[idx].status != Status::Completed {
            return Err(TaskError::InvalidState { id, reason: "task is not completed" });
        }
        let mut task = self.active.remove(idx);
        task.deleted_at = Some(now);
        self.archived.insert(0, task);
        Ok(())
    }

    /// Move an archived task back into the active set.
    pub fn recover(&mut self, id: u64) -> Result<&Task, TaskError> {
        let idx = self
            .archived
            .iter()
            .position(|t| t.id == id)
            .ok_or(TaskError::NotFound { id, collection: "archived" })?;
        if self.active.iter().any(|t| t.id == id) {
            return Err(TaskError::IdConflict { id });
        }
        let mut task = self.archived.remove(idx);
        task.deleted_at = None;
        self.active.push(task);
        Ok(&self.active[self.active.len() - 1])
    }

    /// Permanently remove an archived task.
    pub fn purge(&mut self, id: u64) -> Result<Task, TaskError> {
        let idx = self
            .archived
            .iter()
            .position(|t| t.id == id)
            .ok_or(TaskError::NotFound { id, collection: "archived" })?;
        Ok(self.archived.remove(idx))
    }

    /// Active tasks admitted by `filter`, in creation order.
    pub fn list_active(&self, filter: StatusFilter) -> Vec<&Task> {
        self.active.iter().filter(|t| filter.admits(t.status)).collect()
    }

    /// Archived tasks, most recently archived first.
    pub fn list_archived(&self) -> Vec<&Task> {
        self.archived.iter().collect()
    }

    /// Every active task regardless of status.
    pub fn active(&self) -> &[Task] {
        &self.active
    }

    /// Completed active tasks, most recently completed first.
    pub fn recently_completed(&self, limit: usize) -> Vec<&Task> {
        let mut done: Vec<&Task> = self.active.iter().filter(|t| t.status == Status::Completed).collect();
        done.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        done.truncate(limit);
        done
    }

    /// Ids of completed active tasks finished strictly before `cutoff`.
    pub fn completed_before(&self, cutoff: DateTime<Utc>) -> Vec<u64> {
        self.active
            .iter()
            .filter(|t| t.status == Status::Completed && t.completed_at.is_some_and(|at| at < cutoff))
            .map(|t| t.id)
            .collect()
    }

    /// Get an active task by id.
    pub fn get(&self, id: u64) -> Option<&Task> {
        self.active.iter().find(|t| t.id == id)
    }

    fn get_mut(&mut self, id: u64) -> Option<&mut Task> {
        self.active.iter_mut().find(|t| t.id == id)
    }

    /// Get an archived task by id.
    pub fn get_archived(&self, id: u64) -> Option<&Task> {
        self.archived.iter().find(|t| t.id == id)
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn archived_len(&self) -> usize {
        self.archived.len()
    }

    /// Load seed tasks, reconciling each record with the store invariants.
    pub fn import(&mut self, seed: Seed, now: DateTime<Utc>) -> Result<usize, TaskError> {
        let mut seen: HashSet<u64> = self.active.iter().chain(self.archived.iter()).map(|t| t.id).collect();
        for t in seed.tasks.iter().chain(seed.archived.iter()) {
            if !seen.insert(t.id) {
                return Err(TaskError::IdConflict { id: t.id });
            }
        }

        let count = seed.tasks.len() + seed.archived.len();
        for mut task in seed.tasks {
            reconcile_completion(&mut task, now);
            if task.deleted_at.take().is_some() {
                warn!(id = task.id, "active seed task carried deleted_at; cleared");
            }
            self.last_id = self.last_id.max(task.id);
            self.active.push(task);
        }
        for mut task in seed.archived {
            reconcile_completion(&mut task, now);
            if task.deleted_at.is_none() {
                warn!(id = task.id, "archived seed task had no deleted_at; stamping now");
                task.deleted_at = Some(now);
            }
            self.last_id = self.last_id.max(task.id);
            self.archived.push(task);
        }
        self.archived.sort_by(|a, b| b.deleted_at.cmp(&a.deleted_at));
        Ok(count)
    }

    /// Whether `id` is live in either collection.
    #[cfg(test)]
    pub fn is_live(&self, id: u64) -> bool {
        self.active.iter().any(|t| t.id == id) || self.archived.iter().any(|t| t.id == id)
    }
}

fn reconcile_completion(task: &mut Task, now: DateTime<Utc>) {
    match (task.status, task.completed_at) {
        (Status::Completed, None) => {
            warn!(id = task.id, "completed seed task had no completed_at; stamping now");
            task.completed_at = Some(now);
        }
        (s, Some(_)) if s != Status::Completed => {
            warn!(id = task.id, "seed task not completed but carried completed_at; cleared");
            task.completed_at = None;
        }
        _ => {}
    }
}

/// Parse human date input relative to `today`.
///
/// Supports:
/// - "today", "tomorrow", "yesterday"
/// - "in 3d", "in 2w"
/// - "end of week", "end of month"
/// - "YYYY-MM-DD"
pub fn parse_date_input(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();
    match s.as_str() {
        "" => return None,
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "yesterday" => return Some(today - Duration::days(1)),
        "end of week" | "eow" => {
            // Weeks on the schedule run Sunday to Saturday.
            let to_saturday = 6 - today.weekday().num_days_from_sunday() as i64;
            return Some(today + Duration::days(to_saturday));
        }
        "end of month" | "eom" => {
            let (y, m) = if today.month() == 12 { (today.year() + 1, 1) } else { (today.year(), today.month() + 1) };
            return NaiveDate::from_ymd_opt(y, m, 1).map(|d| d - Duration::days(1));
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(nd) = rest.strip_suffix('d') {
            if let Ok(days) = nd.trim().parse::<i64>() {
                return Some(today + Duration::days(days));
            }
        }
        if let Some(nw) = rest.strip_suffix('w') {
            if let Ok(weeks) = nw.trim().parse::<i64>() {
                return Some(today + Duration::weeks(weeks));
            }
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Format a deadline relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: NaiveDate, today: NaiveDate) -> String {
    let delta = (due - today).num_days();
    if delta == 0 {
        "today".into()
    } else if delta == 1 {
        "tomorrow".into()
    } else if delta > 1 {
        format!("in {}d", delta)
    } else {
        format!("{}d late", -delta)
    }
}

/// Format an optional UTC timestamp as a local date.
pub fn format_local_date(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(t) => t.with_timezone(&Local).format("%Y-%m-%d").to_string(),
        None => "-".into(),
    }
}

/// Print tasks as a table.
pub fn print_table(tasks: &[&Task]) {
    println!(
        "{:<5} {:<12} {:<7} {:<11} {:<12} {:<14} {}",
        "ID", "Status", "Pri", "Deadline", "Due", "Assignee", "Title"
    );
    let today = Local::now().date_naive();
    for t in tasks {
        println!(
            "{:<5} {:<12} {:<7} {:<11} {:<12} {:<14} {}",
            t.id,
            t.status.label(),
            t.priority.label(),
            t.deadline,
            format_due_relative(t.deadline, today),
            truncate(t.assignee_label(), 14),
            t.title,
        );
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, d).unwrap()
    }

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 10, h, 0, 0).unwrap()
    }

    fn store_with(titles: &[&str]) -> (TaskStore, Vec<u64>) {
        let mut store = TaskStore::new();
        let ids = titles
            .iter()
            .map(|t| store.create_task(NewTask::new(t, day(1), day(10))).unwrap())
            .collect();
        (store, ids)
    }

    fn assert_invariants(store: &TaskStore) {
        for t in store.active() {
            assert_eq!(t.completed_at.is_some(), t.status == Status::Completed, "task {}", t.id);
            assert!(t.deleted_at.is_none());
            assert!(store.get_archived(t.id).is_none());
        }
        for t in store.list_archived() {
            assert!(t.deleted_at.is_some());
            assert!(store.get(t.id).is_none());
        }
    }

    #[test]
    fn create_requires_title_and_dates() {
        let mut store = TaskStore::new();
        let missing_title = NewTask { start_date: Some(day(1)), deadline: Some(day(2)), ..Default::default() };
        assert_eq!(store.create_task(missing_title), Err(TaskError::Validation { field: "title" }));

        let blank = NewTask::new("   ", day(1), day(2));
        assert_eq!(store.create_task(blank), Err(TaskError::Validation { field: "title" }));

        let mut no_start = NewTask::new("Edit", day(1), day(2));
        no_start.start_date = None;
        assert_eq!(store.create_task(no_start), Err(TaskError::Validation { field: "start date" }));

        let mut no_deadline = NewTask::new("Edit", day(1), day(2));
        no_deadline.deadline = None;
        assert_eq!(store.create_task(no_deadline), Err(TaskError::Validation { field: "deadline" }));
        assert_eq!(store.active_len(), 0);
    }

    #[test]
    fn created_task_is_pending_without_timestamps() {
        let mut store = TaskStore::new();
        let id = store
            .create_task(NewTask::new("Color grade", day(1), day(9)).priority(Priority::High).assignee("Jane"))
            .unwrap();
        let t = store.get(id).unwrap();
        assert_eq!(t.status, Status::Pending);
        assert_eq!(t.priority, Priority::High);
        assert_eq!(t.assignee.as_deref(), Some("Jane"));
        assert!(t.completed_at.is_none() && t.deleted_at.is_none());
    }

    #[test]
    fn completed_at_tracks_status() {
        let (mut store, ids) = store_with(&["Rough cut"]);
        let id = ids[0];
        for status in [Status::InProgress, Status::Completed, Status::Overdue, Status::Completed, Status::Pending] {
            store.set_status(id, status, at(9)).unwrap();
            assert_invariants(&store);
        }
        store.set_status(id, Status::Completed, at(11)).unwrap();
        assert_eq!(store.get(id).unwrap().completed_at, Some(at(11)));
    }

    #[test]
    fn completing_again_restamps_completed_at() {
        let (mut store, ids) = store_with(&["Mix"]);
        store.set_status(ids[0], Status::Completed, at(8)).unwrap();
        let change = store.set_status(ids[0], Status::Completed, at(12)).unwrap();
        assert!(change.is_noop());
        assert_eq!(store.get(ids[0]).unwrap().completed_at, Some(at(12)));
        assert_invariants(&store);

        let change = store.set_status(ids[0], Status::Pending, at(13)).unwrap();
        assert!(!change.is_noop());
        store.set_status(ids[0], Status::Pending, at(14)).unwrap();
        assert_eq!(store.get(ids[0]).unwrap().completed_at, None);
    }

    #[test]
    fn set_status_on_unknown_id_is_not_found() {
        let mut store = TaskStore::new();
        assert_eq!(
            store.set_status(7, Status::Completed, at(1)),
            Err(TaskError::NotFound { id: 7, collection: "active" })
        );
    }

    #[test]
    fn archive_requires_completed_active_task() {
        let (mut store, ids) = store_with(&["Titles"]);
        assert!(matches!(store.archive(ids[0], at(1)), Err(TaskError::InvalidState { .. })));
        assert!(matches!(store.archive(99, at(1)), Err(TaskError::InvalidState { .. })));

        store.set_status(ids[0], Status::Completed, at(1)).unwrap();
        store.archive(ids[0], at(2)).unwrap();
        assert!(store.get(ids[0]).is_none());
        assert_eq!(store.get_archived(ids[0]).unwrap().deleted_at, Some(at(2)));
        assert_invariants(&store);
    }

    #[test]
    fn recover_restores_everything_but_deleted_at() {
        let (mut store, ids) = store_with(&["Subtitles"]);
        store.set_status(ids[0], Status::Completed, at(3)).unwrap();
        let before = store.get(ids[0]).unwrap().clone();

        store.archive(ids[0], at(4)).unwrap();
        let recovered = store.recover(ids[0]).unwrap().clone();
        assert_eq!(recovered, before);
        assert_invariants(&store);
    }

    #[test]
    fn purge_is_final() {
        let (mut store, ids) = store_with(&["Deliverables"]);
        store.set_status(ids[0], Status::Completed, at(3)).unwrap();
        store.archive(ids[0], at(4)).unwrap();
        let gone = store.purge(ids[0]).unwrap();
        assert_eq!(gone.title, "Deliverables");
        assert!(!store.is_live(ids[0]));
        assert_eq!(store.recover(ids[0]), Err(TaskError::NotFound { id: ids[0], collection: "archived" }));
        assert_eq!(store.purge(ids[0]).unwrap_err(), TaskError::NotFound { id: ids[0], collection: "archived" });
    }

    #[test]
    fn recover_refuses_live_duplicate() {
        let (mut store, ids) = store_with(&["Trailer"]);
        store.set_status(ids[0], Status::Completed, at(3)).unwrap();
        store.archive(ids[0], at(4)).unwrap();
        let mut twin = store.get_archived(ids[0]).unwrap().clone();
        twin.deleted_at = None;
        store.active.push(twin);

        assert_eq!(store.recover(ids[0]), Err(TaskError::IdConflict { id: ids[0] }));
        assert_eq!(store.archived_len(), 1);
        assert_eq!(store.active_len(), 1);
    }

    #[test]
    fn ids_are_not_reused_after_purge() {
        let (mut store, ids) = store_with(&["A", "B"]);
        store.set_status(ids[1], Status::Completed, at(1)).unwrap();
        store.archive(ids[1], at(2)).unwrap();
        store.purge(ids[1]).unwrap();
        let next = store.create_task(NewTask::new("C", day(1), day(2))).unwrap();
        assert!(next > ids[1]);
    }

    #[test]
    fn list_active_all_hides_completed() {
        let (mut store, ids) = store_with(&["A", "B", "C"]);
        store.set_status(ids[1], Status::Completed, at(1)).unwrap();
        store.set_status(ids[2], Status::Overdue, at(1)).unwrap();

        let all: Vec<u64> = store.list_active(StatusFilter::All).iter().map(|t| t.id).collect();
        assert_eq!(all, vec![ids[0], ids[2]]);
        let done: Vec<u64> = store.list_active(StatusFilter::Only(Status::Completed)).iter().map(|t| t.id).collect();
        assert_eq!(done, vec![ids[1]]);
    }

    #[test]
    fn recently_completed_is_newest_first() {
        let (mut store, ids) = store_with(&["A", "B", "C"]);
        store.set_status(ids[0], Status::Completed, at(5)).unwrap();
        store.set_status(ids[1], Status::Completed, at(9)).unwrap();
        store.set_status(ids[2], Status::Completed, at(7)).unwrap();
        let order: Vec<u64> = store.recently_completed(2).iter().map(|t| t.id).collect();
        assert_eq!(order, vec![ids[1], ids[2]]);
    }

    #[test]
    fn import_reconciles_and_rejects_duplicates() {
        let json = r#"{
            "tasks": [
                {"id": 4, "title": "Review", "startDate": "2024-02-01", "deadline": "2024-02-05", "status": "review"},
                {"id": 5, "title": "Done", "start_date": "2024-02-01", "deadline": "2024-02-05", "status": "completed"}
            ],
            "archived": [
                {"id": 6, "title": "Old", "start_date": "2024-01-01", "deadline": "2024-01-05", "status": "completed",
                 "completedAt": "2024-01-04T10:00:00Z"}
            ]
        }"#;
        let seed: Seed = serde_json::from_str(json).unwrap();
        let mut store = TaskStore::new();
        assert_eq!(store.import(seed, at(1)).unwrap(), 3);
        assert_eq!(store.get(4).unwrap().status, Status::InProgress);
        assert_eq!(store.get(5).unwrap().completed_at, Some(at(1)));
        assert_eq!(store.get_archived(6).unwrap().deleted_at, Some(at(1)));
        assert_invariants(&store);

        let next = store.create_task(NewTask::new("New", day(1), day(2))).unwrap();
        assert_eq!(next, 7);

        let tasks: Vec<Task> = serde_json::from_str(
            r#"[{"id": 5, "title": "x", "start_date": "2024-02-01", "deadline": "2024-02-01", "status": "pending"}]"#,
        )
        .unwrap();
        let dup = Seed { tasks, archived: Vec::new() };
        assert_eq!(store.import(dup, at(2)), Err(TaskError::IdConflict { id: 5 }));
    }

    #[test]
    fn seed_file_accepts_bare_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        fs::write(&path, r#"[{"id": 1, "title": "Shoot", "startDate": "2024-02-10", "deadline": "2024-02-14", "status": "in-progress", "priority": "high"}]"#).unwrap();
        let seed = Seed::load(&path).unwrap();
        assert_eq!(seed.tasks.len(), 1);
        assert_eq!(seed.tasks[0].priority, Priority::High);
        assert!(seed.archived.is_empty());
    }

    #[test]
    fn parses_date_shortcuts() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 14).unwrap(); // Wednesday
        assert_eq!(parse_date_input("today", today), Some(today));
        assert_eq!(parse_date_input("in 3d", today), Some(day(17)));
        assert_eq!(parse_date_input("in 1w", today), Some(day(21)));
        assert_eq!(parse_date_input("eow", today), Some(day(17)));
        assert_eq!(parse_date_input("end of month", today), Some(day(29)));
        assert_eq!(parse_date_input("2024-03-01", today), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(parse_date_input("", today), None);
        assert_eq!(parse_date_input("soon", today), None);
    }

    #[test]
    fn relative_due_labels() {
        let today = day(10);
        assert_eq!(format_due_relative(day(10), today), "today");
        assert_eq!(format_due_relative(day(11), today), "tomorrow");
        assert_eq!(format_due_relative(day(14), today), "in 4d");
        assert_eq!(format_due_relative(day(8), today), "2d late");
    }
}
