use std::path::Path;

use hoist_core::UpdaterConfig;
use hoist_platform::AppPaths;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub updater: UpdaterConfig,

    #[serde(default = "default_true")]
    pub check_on_startup: bool,

    #[serde(default = "default_startup_delay")]
    pub startup_delay_secs: u64,

    #[serde(default)]
    pub debug_logging: bool,

    #[serde(default = "default_max_log_size_bytes")]
    pub max_log_size_bytes: u64,
}

fn default_true() -> bool {
    true
}

fn default_startup_delay() -> u64 {
    3
}

fn default_max_log_size_bytes() -> u64 {
    5 * 1024 * 1024
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            updater: UpdaterConfig::default(),
            check_on_startup: true,
            startup_delay_secs: default_startup_delay(),
            debug_logging: false,
            max_log_size_bytes: default_max_log_size_bytes(),
        }
    }
}

impl AppSettings {
    /// Load the settings file, or the defaults when it does not exist yet.
    ///
    /// Runs before logging is set up, so failures are returned instead of
    /// logged; callers fall back to [`AppSettings::default`].
    pub fn load() -> Result<Self, AppError> {
        let paths = AppPaths::new().map_err(|error| AppError::settings("locate", error))?;
        Self::load_from(&paths.settings_file())
    }

    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).map_err(|error| AppError::settings("read", error))?;
        serde_json::from_str(&content).map_err(|error| AppError::settings("parse", error))
    }

    pub fn save(&self) -> Result<(), std::io::Error> {
        let paths = AppPaths::new().map_err(std::io::Error::other)?;
        paths.ensure_dirs()?;
        self.save_to(&paths.settings_file())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
