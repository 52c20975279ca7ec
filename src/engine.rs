//! The task lifecycle engine.
//!
//! `Engine` owns the task store, the notification feed, the retention policy
//! and the sweep timer, and reads time from an injected [`Clock`]. Both the
//! schedule view and the kanban board operate on the same engine, so task
//! state and lifecycle rules exist exactly once.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::archival::{self, RetentionPolicy, SweepReport, SweepTimer};
use crate::clock::Clock;
use crate::error::{SettingsError, TaskError};
use crate::fields::{NotificationKind, Status};
use crate::notify::NotificationFeed;
use crate::settings::Settings;
use crate::store::{Seed, StatusChange, TaskStore};
use crate::task::{NewTask, Task};

pub struct Engine {
    store: TaskStore,
    feed: NotificationFeed,
    policy: RetentionPolicy,
    timer: SweepTimer,
    clock: Box<dyn Clock>,
}

impl Engine {
    pub fn new(settings: &Settings, clock: Box<dyn Clock>) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Engine {
            store: TaskStore::new(),
            feed: NotificationFeed::new(),
            policy: RetentionPolicy::new(settings.retention_days)?,
            timer: SweepTimer::new(settings.sweep_interval()?),
            clock,
        })
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Start the recurring sweep. Runs one sweep immediately.
    pub fn start(&mut self) -> SweepReport {
        let now = self.now();
        self.timer.arm_now(now);
        self.tick()
    }

    /// Cancel the recurring sweep. No further automatic mutation happens
    /// until [`Engine::start`] is called again.
    pub fn stop(&mut self) {
        if self.timer.is_armed() {
            debug!("sweep timer cancelled");
        }
        self.timer.cancel();
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_armed()
    }

    /// When the next automatic sweep is due, if the timer is running.
    pub fn next_sweep(&self) -> Option<DateTime<Utc>> {
        self.timer.next_due()
    }

    /// Run a sweep if the timer is due. Called from the event loop.
    pub fn tick(&mut self) -> SweepReport {
        let now = self.now();
        if self.timer.fire(now) {
            self.run_sweep()
        } else {
            SweepReport::default()
        }
    }

    /// Archive completed tasks past the retention window and report the batch.
    pub fn run_sweep(&mut self) -> SweepReport {
        let now = self.now();
        let report = archival::sweep(&mut self.store, &self.policy, now);
        self.announce(&report, now);
        report
    }

    fn announce(&mut self, report: &SweepReport, now: DateTime<Utc>) {
        if let Some(message) = report.message() {
            self.feed.push(message, NotificationKind::Info, now);
        }
        if let Some(message) = report.failure_message() {
            warn!(failed = report.failed.len(), "sweep finished with errors; timer stays armed");
            self.feed.push(message, NotificationKind::Error, now);
        }
    }

    pub fn retention_days(&self) -> u32 {
        self.policy.retention_days()
    }

    /// Change the retention window. The sweep timer restarts, so the new
    /// window applies from an immediate sweep onward.
    pub fn set_retention_days(&mut self, days: u32) -> Result<(), SettingsError> {
        self.policy = RetentionPolicy::new(days)?;
        info!(days, "retention window changed");
        if self.timer.is_armed() {
            let now = self.now();
            self.timer.arm_now(now);
        }
        Ok(())
    }

    pub fn create_task(&mut self, input: NewTask) -> Result<u64, TaskError> {
        self.store.create_task(input)
    }

    pub fn set_status(&mut self, id: u64, status: Status) -> Result<StatusChange, TaskError> {
        let now = self.now();
        self.store.set_status(id, status, now)
    }

    /// Bring an archived task back to the active set.
    pub fn recover(&mut self, id: u64) -> Result<(), TaskError> {
        let title = self.store.recover(id)?.title.clone();
        let now = self.now();
        self.feed.push(format!("Task \"{}\" has been recovered", title), NotificationKind::Success, now);
        Ok(())
    }

    /// Permanently delete an archived task.
    pub fn purge(&mut self, id: u64) -> Result<Task, TaskError> {
        let task = self.store.purge(id)?;
        let now = self.now();
        self.feed.push(
            format!("Task \"{}\" has been permanently deleted", task.title),
            NotificationKind::Warning,
            now,
        );
        Ok(task)
    }

    pub fn import(&mut self, seed: Seed) -> Result<usize, TaskError> {
        let now = self.now();
        self.store.import(seed, now)
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn feed(&self) -> &NotificationFeed {
        &self.feed
    }

    pub fn clear_notifications(&mut self) {
        self.feed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::fields::StatusFilter;
    use chrono::{Duration, NaiveDate, TimeZone};

    fn setup(retention_days: u32) -> (Engine, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap());
        let settings = Settings { retention_days, ..Default::default() };
        let engine = Engine::new(&settings, Box::new(clock.clone())).unwrap();
        (engine, clock)
    }

    fn add(engine: &mut Engine, title: &str, deadline_day: u32) -> u64 {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let deadline = NaiveDate::from_ymd_opt(2024, 2, deadline_day).unwrap();
        engine.create_task(NewTask::new(title, start, deadline)).unwrap()
    }

    fn ids(tasks: &[&Task]) -> Vec<u64> {
        tasks.iter().map(|t| t.id).collect()
    }

    #[test]
    fn new_rejects_unbounded_sweep_interval() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap());
        let settings = Settings { sweep_interval_hours: 10_000_000_000_000, ..Default::default() };
        assert!(matches!(
            Engine::new(&settings, Box::new(clock)),
            Err(SettingsError::SweepIntervalOutOfRange { .. })
        ));
    }

    #[test]
    fn completed_task_leaves_all_view() {
        let (mut engine, _clock) = setup(3);
        let t1 = add(&mut engine, "Edit trailer", 10);
        assert_eq!(ids(&engine.store().list_active(StatusFilter::All)), vec![t1]);

        engine.set_status(t1, Status::Completed).unwrap();
        assert!(engine.store().list_active(StatusFilter::All).is_empty());
        assert_eq!(ids(&engine.store().recently_completed(3)), vec![t1]);
    }

    #[test]
    fn completing_again_restarts_retention() {
        let (mut engine, clock) = setup(1);
        let t1 = add(&mut engine, "Colour grade", 10);
        engine.set_status(t1, Status::Completed).unwrap();
        engine.start();

        clock.advance(Duration::hours(20));
        engine.set_status(t1, Status::Completed).unwrap();
        assert_eq!(engine.store().get(t1).unwrap().completed_at, Some(engine.now()));

        clock.advance(Duration::hours(10));
        assert!(engine.run_sweep().archived.is_empty());
        assert!(engine.store().get(t1).is_some());

        clock.advance(Duration::hours(15));
        assert_eq!(engine.run_sweep().archived, vec![t1]);
    }

    #[test]
    fn failed_archival_posts_error_and_keeps_timer() {
        let (mut engine, _clock) = setup(3);
        let open = add(&mut engine, "Storyboard", 10);
        engine.start();
        let now = engine.now();

        let report = archival::archive_batch(&mut engine.store, [open], now);
        engine.announce(&report, now);

        let latest = engine.feed().iter().next().unwrap();
        assert_eq!(latest.message, "1 task(s) could not be archived");
        assert_eq!(latest.kind, NotificationKind::Error);
        assert_eq!(engine.feed().iter().count(), 1);
        assert!(engine.store().get(open).is_some());
        assert!(engine.is_running());
    }

    #[test]
    fn sweep_archives_after_retention() {
        let (mut engine, clock) = setup(1);
        let t1 = add(&mut engine, "Sound mix", 10);
        engine.set_status(t1, Status::Completed).unwrap();
        engine.start();
        assert!(engine.store().get(t1).is_some());
        assert_eq!(engine.next_sweep(), Some(engine.now() + Duration::hours(24)));

        clock.advance(Duration::days(2));
        let report = engine.tick();
        assert_eq!(report.archived, vec![t1]);
        assert!(engine.store().get(t1).is_none());
        assert!(engine.store().get_archived(t1).unwrap().deleted_at.is_some());

        let latest = engine.feed().iter().next().unwrap();
        assert_eq!(latest.message, "1 completed task(s) have been archived");
        assert_eq!(latest.kind, NotificationKind::Info);
    }

    #[test]
    fn boundary_is_exclusive() {
        let (mut engine, clock) = setup(3);
        let edge = add(&mut engine, "edge", 10);
        let older = add(&mut engine, "older", 10);
        engine.set_status(older, Status::Completed).unwrap();
        clock.advance(Duration::days(1));
        engine.set_status(edge, Status::Completed).unwrap();

        clock.advance(Duration::days(3));
        let report = engine.run_sweep();
        assert_eq!(report.archived, vec![older]);
        assert!(engine.store().get(edge).is_some());
    }

    #[test]
    fn empty_sweep_is_silent() {
        let (mut engine, _clock) = setup(3);
        add(&mut engine, "open", 10);
        let report = engine.start();
        assert!(report.is_empty());
        assert!(engine.feed().is_empty());
    }

    #[test]
    fn repeated_sweeps_are_idempotent() {
        let (mut engine, clock) = setup(2);
        let a = add(&mut engine, "a", 10);
        engine.set_status(a, Status::Completed).unwrap();
        clock.advance(Duration::days(5));

        assert_eq!(engine.run_sweep().archived.len(), 1);
        assert_eq!(engine.run_sweep().archived.len(), 0);
        assert_eq!(engine.feed().len(), 1);
        assert_eq!(engine.store().archived_len(), 1);
    }

    #[test]
    fn timer_runs_on_start_and_daily() {
        let (mut engine, clock) = setup(1);
        let a = add(&mut engine, "a", 10);
        engine.set_status(a, Status::Completed).unwrap();
        clock.advance(Duration::days(2));

        assert_eq!(engine.start().archived, vec![a]);

        let b = add(&mut engine, "b", 10);
        engine.set_status(b, Status::Completed).unwrap();
        clock.advance(Duration::hours(12));
        assert!(engine.tick().is_empty());
        clock.advance(Duration::hours(13));
        assert_eq!(engine.tick().archived, vec![b]);
    }

    #[test]
    fn stopped_engine_does_not_sweep() {
        let (mut engine, clock) = setup(1);
        engine.start();
        let a = add(&mut engine, "a", 10);
        engine.set_status(a, Status::Completed).unwrap();
        engine.stop();
        clock.advance(Duration::days(10));
        assert!(engine.tick().is_empty());
        assert!(engine.store().get(a).is_some());

        engine.start();
        assert!(engine.store().get(a).is_none());
    }

    #[test]
    fn retention_change_applies_on_next_sweep() {
        let (mut engine, clock) = setup(5);
        engine.start();
        let a = add(&mut engine, "a", 10);
        engine.set_status(a, Status::Completed).unwrap();
        clock.advance(Duration::days(2));
        assert!(engine.tick().is_empty());

        engine.set_retention_days(1).unwrap();
        assert_eq!(engine.tick().archived, vec![a]);
        assert!(engine.set_retention_days(31).is_err());
        assert_eq!(engine.retention_days(), 1);
    }

    #[test]
    fn recover_round_trip_and_purge() {
        let (mut engine, clock) = setup(1);
        let a = add(&mut engine, "Color pass", 12);
        engine.set_status(a, Status::Completed).unwrap();
        let before = engine.store().get(a).unwrap().clone();

        clock.advance(Duration::days(2));
        engine.run_sweep();
        engine.recover(a).unwrap();
        assert_eq!(engine.store().get(a).unwrap(), &before);
        assert_eq!(
            engine.feed().iter().next().unwrap().message,
            "Task \"Color pass\" has been recovered"
        );

        clock.advance(Duration::days(2));
        engine.run_sweep();
        let gone = engine.purge(a).unwrap();
        assert_eq!(gone.id, a);
        assert!(engine.store().get(a).is_none());
        assert!(engine.store().get_archived(a).is_none());
        assert_eq!(engine.recover(a), Err(TaskError::NotFound { id: a, collection: "archived" }));
        assert_eq!(engine.feed().iter().next().unwrap().kind, NotificationKind::Warning);
    }

    #[test]
    fn feed_stays_bounded_under_many_events() {
        let (mut engine, clock) = setup(1);
        for i in 0..8 {
            let id = add(&mut engine, &format!("t{i}"), 10);
            engine.set_status(id, Status::Completed).unwrap();
            clock.advance(Duration::days(2));
            engine.run_sweep();
        }
        assert_eq!(engine.feed().len(), 5);
        engine.clear_notifications();
        assert!(engine.feed().is_empty());
    }
}
