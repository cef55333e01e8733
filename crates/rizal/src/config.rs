//! Application configuration.
//!
//! One JSON document configures every layer. Each section falls back to
//! its defaults, so `{}` is a valid config.

use std::path::Path;

use rizal_progress::CourseLayout;
use rizal_session::SessionConfig;
use serde::{Deserialize, Serialize};

use crate::RizalError;
use crate::telemetry::TracingConfig;

/// Settings for the whole game core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Session lifetimes and login redirects.
    pub session: SessionConfig,
    /// Chapters and level counts.
    pub course: CourseLayout,
    /// Log filter and format.
    pub logging: TracingConfig,
}

impl AppConfig {
    /// Parses a config document; missing sections and fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, RizalError> {
        serde_json::from_str(json).map_err(RizalError::Config)
    }

    /// Reads and parses a config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RizalError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }
}
