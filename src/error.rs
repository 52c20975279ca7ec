//! Error types.
//!
//! Each subsystem has its own `thiserror` enum; [`ReelError`] wraps them for
//! the command handlers.

use std::path::PathBuf;

use thiserror::Error;

/// Failures of task store operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    /// A required field was missing on creation.
    #[error("{field} is required")]
    Validation { field: &'static str },

    /// The id is not in the collection the operation targets.
    #[error("task {id} not found in the {collection} set")]
    NotFound { id: u64, collection: &'static str },

    /// An internal precondition was violated. Treated as a defect.
    #[error("task {id} cannot be archived: {reason}")]
    InvalidState { id: u64, reason: &'static str },

    /// A live task already uses this id.
    #[error("task id {id} is already in use")]
    IdConflict { id: u64 },
}

/// Invalid or unreadable settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("retention must be between {min} and {max} days, got {got}")]
    RetentionOutOfRange { got: u32, min: u32, max: u32 },

    #[error("sweep interval must be between 1 and {max} hours, got {got}")]
    SweepIntervalOutOfRange { got: u64, max: u64 },

    #[error("api base url must not be empty")]
    EmptyApiUrl,

    #[error("failed to write settings to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures talking to the production REST service.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not logged in; run `reel login` first")]
    NotAuthenticated,

    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {message}")]
    Transport { message: String },

    #[error("could not decode response: {message}")]
    Decode { message: String },
}

impl From<ureq::Error> for ApiError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::Status(status, resp) => ApiError::Status {
                status,
                body: resp.into_string().unwrap_or_default(),
            },
            ureq::Error::Transport(t) => ApiError::Transport {
                message: t.to_string(),
            },
        }
    }
}

/// Failures reading or writing the session file.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("session file {path} is corrupt: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure loading a seed file of tasks.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Task(#[from] TaskError),
}

/// Top-level error for command handlers.
#[derive(Debug, Error)]
pub enum ReelError {
    #[error(transparent)]
    Task(#[from] TaskError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Seed(#[from] SeedError),

    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),

    #[error("{0}")]
    Input(String),
}

pub type Result<T, E = ReelError> = std::result::Result<T, E>;
