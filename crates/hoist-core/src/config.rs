use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_FEED_URL: &str = "https://api.github.com/repos/hoist-app/hoist/releases/latest";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdaterConfig {
    #[serde(default = "default_feed_url")]
    pub feed_url: String,

    #[serde(default = "default_check_timeout")]
    pub check_timeout_secs: u64,

    /// Where downloaded assets are written. `None` means the OS temp dir.
    #[serde(default)]
    pub download_dir: Option<PathBuf>,

    /// Report a newer release without a matching asset as its own outcome
    /// instead of folding it into "no update".
    #[serde(default)]
    pub report_missing_asset: bool,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_feed_url() -> String {
    DEFAULT_FEED_URL.to_string()
}

fn default_check_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("hoist/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            feed_url: default_feed_url(),
            check_timeout_secs: default_check_timeout(),
            download_dir: None,
            report_missing_asset: false,
            user_agent: default_user_agent(),
        }
    }
}

impl UpdaterConfig {
    #[must_use]
    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_secs)
    }

    #[must_use]
    pub fn resolved_download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}
