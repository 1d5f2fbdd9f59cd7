//! Self-update pipeline for Hoist.
//!
//! This crate holds the update logic that is independent of any host UI:
//! - Dotted version parsing and comparison.
//! - Release feed decoding and per-platform asset selection.
//! - Update checks, streamed downloads and installer dispatch.
//! - An orchestrator that runs those operations in the background and
//!   relays their outcomes over a channel.

mod asset;
pub mod config;
pub mod download;
pub mod install;
pub mod orchestrator;
mod release;
mod update;
mod version;

/// Platform asset selection.
pub use asset::select_asset;
/// Updater configuration.
pub use config::UpdaterConfig;
/// Streamed asset download.
pub use download::{DownloadError, DownloadProgress, download_update, file_name_from_url};
/// Installer dispatch and its process boundary.
pub use install::{InstallError, InstallStarted, Launcher, SystemLauncher, install_update};
/// Background coordination and its event channel.
pub use orchestrator::{Trigger, UpdateEvent, UpdateOrchestrator};
/// Release feed model.
pub use release::{Asset, ReleaseInfo};
/// Update check outcomes.
pub use update::{CheckOutcome, UpdateError, UpdateInfo, check_for_update, evaluate_release};
/// Version parsing and ordering.
pub use version::{VersionNumber, VersionParseError, compare, is_newer, is_newer_version};

pub use hoist_platform::PlatformId;
