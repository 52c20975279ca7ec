//! Enumerations and field types shared across the board.
//!
//! Statuses, priorities, notification kinds and the view-level filter all live
//! here so the CLI, the engine and the terminal UI agree on one closed set.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a task.
///
/// The kanban vocabulary maps onto this set: `todo` reads as `Pending` and
/// `review` reads as `InProgress`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[serde(alias = "todo", alias = "Pending")]
    Pending,
    #[serde(alias = "review", alias = "InProgress")]
    InProgress,
    #[serde(alias = "Completed", alias = "done")]
    Completed,
    #[serde(alias = "Overdue")]
    Overdue,
}

impl Status {
    /// Every status in board column order.
    pub const ALL: [Status; 4] = [
        Status::Pending,
        Status::InProgress,
        Status::Completed,
        Status::Overdue,
    ];

    /// Human label used in lists, columns and the status dropdown.
    pub fn label(self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::InProgress => "In Progress",
            Status::Completed => "Completed",
            Status::Overdue => "Overdue",
        }
    }

    /// Position of this status in [`Status::ALL`].
    pub fn column(self) -> usize {
        match self {
            Status::Pending => 0,
            Status::InProgress => 1,
            Status::Completed => 2,
            Status::Overdue => 3,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Task importance.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

/// Severity of an entry in the notification feed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    Info,
    Warning,
    Success,
    Error,
}

impl NotificationKind {
    pub fn label(self) -> &'static str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Warning => "warning",
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
        }
    }
}

/// Which active tasks a list view shows.
///
/// `All` means every active task that is not completed; completed work is
/// surfaced in its own panel instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(Status),
}

impl StatusFilter {
    /// Whether a task with `status` passes this filter.
    pub fn admits(self, status: Status) -> bool {
        match self {
            StatusFilter::All => status != Status::Completed,
            StatusFilter::Only(s) => status == s,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "All Tasks",
            StatusFilter::Only(Status::Pending) => "Pending Tasks",
            StatusFilter::Only(Status::InProgress) => "In Progress Tasks",
            StatusFilter::Only(Status::Completed) => "Completed Tasks",
            StatusFilter::Only(Status::Overdue) => "Overdue Tasks",
        }
    }
}

/// Status filter as accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FilterArg {
    All,
    Pending,
    InProgress,
    Completed,
    Overdue,
}

impl From<FilterArg> for StatusFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => StatusFilter::All,
            FilterArg::Pending => StatusFilter::Only(Status::Pending),
            FilterArg::InProgress => StatusFilter::Only(Status::InProgress),
            FilterArg::Completed => StatusFilter::Only(Status::Completed),
            FilterArg::Overdue => StatusFilter::Only(Status::Overdue),
        }
    }
}

/// Schedule presentation mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewMode {
    #[default]
    List,
    Calendar,
}

/// Kind of production a remote project represents.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectType {
    #[default]
    FullLengthVideo,
    ShortFormContent,
}

impl ProjectType {
    pub fn label(self) -> &'static str {
        match self {
            ProjectType::FullLengthVideo => "Full-Length Video",
            ProjectType::ShortFormContent => "Short-Form Content",
        }
    }
}
