//! Login session kept between CLI invocations.
//!
//! The session is just the bearer token returned by the login endpoint and
//! the username it was issued for, stored as `session.json`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

pub const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: Option<String>,
    pub token: Option<String>,
}

impl Session {
    pub fn path(dir: &Path) -> PathBuf {
        dir.join(SESSION_FILE)
    }

    /// Load the session, or an anonymous one if none was saved.
    pub fn load(dir: &Path) -> Result<Self, SessionError> {
        let path = Self::path(dir);
        if !path.exists() {
            return Ok(Session::default());
        }
        let buf = fs::read_to_string(&path).map_err(|source| SessionError::Io { path: path.clone(), source })?;
        serde_json::from_str(&buf).map_err(|source| SessionError::Parse { path, source })
    }

    pub fn save(&self, dir: &Path) -> Result<(), SessionError> {
        let path = Self::path(dir);
        let data = serde_json::to_string_pretty(self).map_err(|source| SessionError::Parse {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, data).map_err(|source| SessionError::Io { path, source })
    }

    /// Remove the saved session. Missing file is not an error.
    pub fn clear(dir: &Path) -> Result<(), SessionError> {
        let path = Self::path(dir);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SessionError::Io { path, source }),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    /// The token to attach to authenticated requests.
    pub fn bearer(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.trim().is_empty())
    }
}
