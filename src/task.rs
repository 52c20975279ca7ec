//! Task data structure and the input used to create one.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::*;

/// A unit of production work tracked on the schedule and the board.
///
/// `completed_at` is present exactly when `status` is `Completed`, and
/// `deleted_at` is present exactly while the task sits in the archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(alias = "startDate")]
    pub start_date: NaiveDate,
    pub deadline: NaiveDate,
    #[serde(default)]
    pub priority: Priority,
    pub status: Status,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default, alias = "completedAt")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "deletedAt")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Whether the deadline has passed relative to `today`.
    pub fn is_past_deadline(&self, today: NaiveDate) -> bool {
        self.status != Status::Completed && self.deadline < today
    }

    /// Display name of the assignee, or "Unassigned".
    pub fn assignee_label(&self) -> &str {
        self.assignee.as_deref().unwrap_or("Unassigned")
    }
}

/// Fields collected by the add-task form.
///
/// Everything is optional here so that missing input can be reported as a
/// validation error rather than being impossible to express.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    pub priority: Priority,
    pub assignee: Option<String>,
}

impl NewTask {
    pub fn new(title: &str, start_date: NaiveDate, deadline: NaiveDate) -> Self {
        NewTask {
            title: Some(title.to_string()),
            start_date: Some(start_date),
            deadline: Some(deadline),
            ..Default::default()
        }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn assignee(mut self, assignee: &str) -> Self {
        self.assignee = Some(assignee.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}
