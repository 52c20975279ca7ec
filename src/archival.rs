//! Retention policy and the automatic archival sweep.
//!
//! Completed tasks stay on the board for `retention_days` after completion.
//! A sweep moves everything older than that into the archive in one batch.
//! The sweep is driven by a [`SweepTimer`], a single owned deadline that the
//! event loop polls; there is never more than one outstanding run.

use chrono::{DateTime, Duration, Utc};
use tracing::{error, info};

use crate::error::{SettingsError, TaskError};
use crate::store::TaskStore;

pub const MIN_RETENTION_DAYS: u32 = 1;
pub const MAX_RETENTION_DAYS: u32 = 30;
pub const DEFAULT_RETENTION_DAYS: u32 = 3;

/// How long completed tasks remain active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    retention_days: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        RetentionPolicy {
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }
}

impl RetentionPolicy {
    pub fn new(retention_days: u32) -> Result<Self, SettingsError> {
        validate_retention_days(retention_days)?;
        Ok(RetentionPolicy { retention_days })
    }

    pub fn retention_days(&self) -> u32 {
        self.retention_days
    }

    /// Completion instant before which a task is due for archival.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(i64::from(self.retention_days))
    }
}

pub fn validate_retention_days(days: u32) -> Result<(), SettingsError> {
    if (MIN_RETENTION_DAYS..=MAX_RETENTION_DAYS).contains(&days) {
        Ok(())
    } else {
        Err(SettingsError::RetentionOutOfRange {
            got: days,
            min: MIN_RETENTION_DAYS,
            max: MAX_RETENTION_DAYS,
        })
    }
}

/// Outcome of one sweep.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub archived: Vec<u64>,
    pub failed: Vec<TaskError>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.archived.is_empty() && self.failed.is_empty()
    }

    /// Feed message for this batch, if anything was archived.
    pub fn message(&self) -> Option<String> {
        if self.archived.is_empty() {
            None
        } else {
            Some(format!("{} completed task(s) have been archived", self.archived.len()))
        }
    }

    /// Feed message for the tasks that could not be archived, if any.
    pub fn failure_message(&self) -> Option<String> {
        if self.failed.is_empty() {
            None
        } else {
            Some(format!("{} task(s) could not be archived", self.failed.len()))
        }
    }
}

/// Archive every completed task whose completion is strictly before the
/// policy cutoff.
///
/// Never returns an error: a task that cannot be archived is logged and
/// recorded in the report, and the rest of the batch proceeds.
pub fn sweep(store: &mut TaskStore, policy: &RetentionPolicy, now: DateTime<Utc>) -> SweepReport {
    let cutoff = policy.cutoff(now);
    let candidates = store.completed_before(cutoff);
    let report = archive_batch(store, candidates, now);
    if !report.archived.is_empty() {
        info!(count = report.archived.len(), %cutoff, "archived completed tasks");
    }
    report
}

/// Archive each of `ids`, collecting failures instead of stopping.
pub fn archive_batch<I>(store: &mut TaskStore, ids: I, now: DateTime<Utc>) -> SweepReport
where
    I: IntoIterator<Item = u64>,
{
    let mut report = SweepReport::default();
    for id in ids {
        match store.archive(id, now) {
            Ok(()) => report.archived.push(id),
            Err(e) => {
                error!(id, error = %e, "archival sweep hit an invalid task");
                report.failed.push(e);
            }
        }
    }
    report
}

/// The recurring trigger for sweeps.
///
/// Holds at most one pending deadline. `arm_now` schedules an immediate run,
/// `fire` consumes the deadline and schedules the next one, `cancel` drops it.
#[derive(Debug, Clone)]
pub struct SweepTimer {
    interval: Duration,
    next_due: Option<DateTime<Utc>>,
}

impl SweepTimer {
    pub fn new(interval: Duration) -> Self {
        SweepTimer { interval, next_due: None }
    }

    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.next_due
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    /// Schedule a run at `now`, replacing any pending deadline.
    pub fn arm_now(&mut self, now: DateTime<Utc>) {
        self.next_due = Some(now);
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    /// If the deadline has passed, re-arm for one interval later and return true.
    pub fn fire(&mut self, now: DateTime<Utc>) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }
}
