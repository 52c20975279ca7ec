//! User settings stored as `settings.json` in the data directory.
//!
//! Only configuration lives on disk; task state never does.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::archival::{validate_retention_days, DEFAULT_RETENTION_DAYS};
use crate::error::SettingsError;

pub const SETTINGS_FILE: &str = "settings.json";

/// Longest allowed gap between sweeps: the maximum retention window.
pub const MAX_SWEEP_INTERVAL_HOURS: u64 = 24 * 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Days a completed task stays active before the sweep archives it.
    pub retention_days: u32,
    /// Hours between archival sweeps.
    pub sweep_interval_hours: u64,
    pub api_base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            retention_days: DEFAULT_RETENTION_DAYS,
            sweep_interval_hours: 24,
            api_base_url: "http://localhost:8080".to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl Settings {
    pub fn path(dir: &Path) -> PathBuf {
        dir.join(SETTINGS_FILE)
    }

    /// Load settings from `dir`, falling back to defaults if the file is
    /// missing, unreadable or invalid.
    pub fn load(dir: &Path) -> Self {
        let path = Self::path(dir);
        if !path.exists() {
            return Settings::default();
        }
        let parsed = fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|buf| serde_json::from_str::<Settings>(&buf).map_err(|e| e.to_string()));
        match parsed {
            Ok(settings) => match settings.validate() {
                Ok(()) => settings,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "invalid settings, using defaults");
                    Settings::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable settings, using defaults");
                Settings::default()
            }
        }
    }

    /// Save settings using temp file + rename.
    pub fn save(&self, dir: &Path) -> Result<(), SettingsError> {
        self.validate()?;
        let path = Self::path(dir);
        let write = || -> std::io::Result<()> {
            let tmp = path.with_extension("json.tmp");
            let mut f = File::create(&tmp)?;
            let data = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
            f.write_all(data.as_bytes())?;
            f.flush()?;
            fs::rename(tmp, &path)
        };
        write().map_err(|source| SettingsError::Write { path: path.clone(), source })
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        validate_retention_days(self.retention_days)?;
        self.sweep_interval()?;
        if self.api_base_url.trim().is_empty() {
            return Err(SettingsError::EmptyApiUrl);
        }
        Ok(())
    }

    pub fn sweep_interval(&self) -> Result<chrono::TimeDelta, SettingsError> {
        let hours = self.sweep_interval_hours;
        let out_of_range = SettingsError::SweepIntervalOutOfRange {
            got: hours,
            max: MAX_SWEEP_INTERVAL_HOURS,
        };
        if !(1..=MAX_SWEEP_INTERVAL_HOURS).contains(&hours) {
            return Err(out_of_range);
        }
        i64::try_from(hours)
            .ok()
            .and_then(chrono::TimeDelta::try_hours)
            .ok_or(out_of_range)
    }
}
