use hoist_platform::PlatformId;
use log::{debug, info};
use thiserror::Error;

use crate::asset::select_asset;
use crate::config::UpdaterConfig;
use crate::release::ReleaseInfo;
use crate::version::{VersionNumber, VersionParseError, is_newer};

const BODY_SNIPPET_CHARS: usize = 160;

/// A newer release with an asset installable on this platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateInfo {
    pub version: VersionNumber,
    pub url: String,
    pub notes: String,
}

#[derive(Debug)]
pub enum CheckOutcome {
    NoUpdate,
    UpdateAvailable(UpdateInfo),
    /// Only produced when `report_missing_asset` is enabled; otherwise this
    /// case is reported as `NoUpdate`.
    NoCompatibleAsset { version: VersionNumber },
    CheckFailed(UpdateError),
}

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("failed to check for app update: {0}")]
    Request(#[source] reqwest::Error),
    #[error("app update check failed with HTTP {status}{body_snippet}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body_snippet: String,
    },
    #[error("failed to parse app update response: {0}")]
    Parse(#[source] reqwest::Error),
    #[error(transparent)]
    Version(#[from] VersionParseError),
}

/// Query the release feed and decide whether an update applies to the running
/// version on `platform`.
///
/// Every failure is folded into [`CheckOutcome::CheckFailed`], so exactly one
/// outcome is produced per call.
pub async fn check_for_update(
    client: &reqwest::Client,
    config: &UpdaterConfig,
    current_version: &str,
    platform: Option<PlatformId>,
) -> CheckOutcome {
    info!("Checking for updates at {}", config.feed_url);

    let result = match fetch_latest_release(client, config).await {
        Ok(release) => {
            evaluate_release(&release, current_version, platform, config.report_missing_asset)
        }
        Err(error) => Err(error),
    };

    result.unwrap_or_else(CheckOutcome::CheckFailed)
}

async fn fetch_latest_release(
    client: &reqwest::Client,
    config: &UpdaterConfig,
) -> Result<ReleaseInfo, UpdateError> {
    let response = client
        .get(&config.feed_url)
        .header("User-Agent", &config.user_agent)
        .timeout(config.check_timeout())
        .send()
        .await
        .map_err(UpdateError::Request)?;

    // The feed answers a plain 200; any other status, 2xx included, is a failure.
    if response.status() != reqwest::StatusCode::OK {
        let status = response.status();
        let body_snippet = response
            .text()
            .await
            .ok()
            .map(|body| response_snippet(&body, BODY_SNIPPET_CHARS))
            .unwrap_or_default();
        return Err(UpdateError::HttpStatus {
            status,
            body_snippet,
        });
    }

    response.json().await.map_err(UpdateError::Parse)
}

/// Apply version comparison and asset selection to a decoded release.
///
/// # Errors
/// Returns an error when the release tag or the current version is not a
/// valid dotted version.
pub fn evaluate_release(
    release: &ReleaseInfo,
    current_version: &str,
    platform: Option<PlatformId>,
    report_missing_asset: bool,
) -> Result<CheckOutcome, UpdateError> {
    let latest = VersionNumber::parse(release.version_str())?;
    let current = VersionNumber::parse(
        current_version
            .strip_prefix('v')
            .unwrap_or(current_version),
    )?;

    if !is_newer(&latest, &current) {
        debug!("Latest release {latest} is not newer than {current}");
        return Ok(CheckOutcome::NoUpdate);
    }

    let asset = platform.and_then(|platform| select_asset(&release.assets, platform));
    let Some(asset) = asset else {
        info!("Release {latest} has no asset for this platform");
        return Ok(if report_missing_asset {
            CheckOutcome::NoCompatibleAsset { version: latest }
        } else {
            CheckOutcome::NoUpdate
        });
    };

    info!("Update available: {current} -> {latest} ({})", asset.name);
    Ok(CheckOutcome::UpdateAvailable(UpdateInfo {
        version: latest,
        url: asset.download_url.clone(),
        notes: release.notes.clone(),
    }))
}

fn response_snippet(body: &str, max_chars: usize) -> String {
    let snippet: String = body.chars().take(max_chars).collect();
    if snippet.is_empty() {
        String::new()
    } else {
        format!(": {snippet}")
    }
}
