//! Local configuration and session state.
//!
//! Credentials live in `~/.config/sqlshift/config.toml`. The reference
//! to the most recent translation is kept in `state.toml` next to it so
//! `sqlshift last` can re-render a report without re-running anything.
//! Single-user, single-session assumption: nothing here is guarded
//! against concurrent writers.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ShiftError, ShiftResult};
use crate::model::JobRef;

/// Default service host.
pub const DEFAULT_HOST: &str = "https://app.datafold.com";

/// Persisted credentials and host selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub host: Option<String>,
    pub api_key: Option<String>,
    pub org_token: Option<String>,
}

impl Config {
    /// Path of the config file (`<config_dir>/sqlshift/config.toml`).
    pub fn path() -> ShiftResult<PathBuf> {
        Ok(config_dir()?.join("config.toml"))
    }

    /// Load the config file, or defaults when it does not exist yet.
    pub fn load() -> ShiftResult<Self> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)?;
        toml::from_str(&content)
            .map_err(|e| ShiftError::Config(format!("invalid {}: {e}", path.display())))
    }

    /// Write the config file, creating the directory if needed.
    pub fn save(&self) -> ShiftResult<()> {
        let path = Self::path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| ShiftError::Config(format!("cannot serialize config: {e}")))?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Host to talk to, falling back to the default.
    pub fn host_or_default(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }
}

/// Reference to the most recently started translation job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct State {
    pub last_job: Option<JobRef>,
}

impl State {
    pub fn path() -> ShiftResult<PathBuf> {
        Ok(config_dir()?.join("state.toml"))
    }

    pub fn load() -> ShiftResult<Self> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)?;
        toml::from_str(&content)
            .map_err(|e| ShiftError::Config(format!("invalid {}: {e}", path.display())))
    }

    pub fn save(&self) -> ShiftResult<()> {
        let path = Self::path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| ShiftError::Config(format!("cannot serialize state: {e}")))?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Record `job` as the last started translation.
    pub fn remember(job: JobRef) -> ShiftResult<()> {
        State {
            last_job: Some(job),
        }
        .save()
    }
}

fn config_dir() -> ShiftResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("sqlshift"))
        .ok_or_else(|| ShiftError::Config("no user config directory on this platform".into()))
}
