use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use log::{info, warn};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const FALLBACK_FILE_NAME: &str = "update-download";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadProgress {
    /// Share of the announced `content-length` received so far, 0 to 100.
    Percent(u8),
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{context}: {source}")]
    Http {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("download failed with HTTP {status}")]
    HttpStatus { status: reqwest::StatusCode },
    #[error("download cancelled")]
    Cancelled,
}

impl DownloadError {
    fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    fn http(context: &'static str, source: reqwest::Error) -> Self {
        Self::Http { context, source }
    }

    fn io_with_path(context: &'static str, path: &Path, source: &std::io::Error) -> Self {
        Self::io(
            context,
            std::io::Error::new(source.kind(), format!("{}: {source}", path.display())),
        )
    }
}

/// Final path segment of `url`, used as the local file name.
///
/// Query strings and fragments are ignored. Empty names and names containing
/// `..` fall back to a fixed name.
#[must_use]
pub fn file_name_from_url(url: &str) -> String {
    let segment = reqwest::Url::parse(url).ok().and_then(|parsed| {
        parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_string))
    });

    let raw = segment.unwrap_or_else(|| {
        url.split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .unwrap_or_default()
            .to_string()
    });

    Path::new(&raw)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty() && !name.contains(".."))
        .map_or_else(|| FALLBACK_FILE_NAME.to_string(), str::to_string)
}

/// Integer percentage of `downloaded` over `total`, capped at 100.
#[must_use]
pub fn percent(downloaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (u128::from(downloaded) * 100 / u128::from(total)).min(100);
    u8::try_from(pct).unwrap_or(100)
}

/// Stream `url` into `dest_dir`, reporting progress on `progress`.
///
/// Progress is only reported when the response announces a `content-length`.
/// A pre-existing file with the same name is overwritten. When the transfer
/// fails midway the partial file is left on disk.
///
/// # Errors
/// Returns an error when the request fails, the server answers with a
/// non-success status, the body stream breaks, writing to disk fails, or the
/// optional `cancel` token fires.
pub async fn download_update(
    client: &reqwest::Client,
    url: &str,
    dest_dir: &Path,
    progress: &mpsc::Sender<DownloadProgress>,
    cancel: Option<&CancellationToken>,
) -> Result<PathBuf, DownloadError> {
    let dest = dest_dir.join(file_name_from_url(url));
    info!("Downloading update from {url} to {}", dest.display());

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|error| DownloadError::http("download request failed", error))?;

    if !response.status().is_success() {
        return Err(DownloadError::HttpStatus {
            status: response.status(),
        });
    }

    tokio::fs::create_dir_all(dest_dir).await.map_err(|error| {
        DownloadError::io_with_path("failed to create download directory", dest_dir, &error)
    })?;

    let total = response.content_length().filter(|&len| len > 0);
    let mut downloaded: u64 = 0;

    let mut file = tokio::fs::File::create(&dest).await.map_err(|error| {
        DownloadError::io_with_path("failed to create download file", &dest, &error)
    })?;

    let mut stream = response.bytes_stream();
    let streamed: Result<(), DownloadError> = async {
        loop {
            let next = match cancel {
                Some(token) => tokio::select! {
                    () = token.cancelled() => return Err(DownloadError::Cancelled),
                    next = stream.next() => next,
                },
                None => stream.next().await,
            };
            let Some(chunk) = next else {
                return Ok(());
            };

            let chunk =
                chunk.map_err(|error| DownloadError::http("download stream error", error))?;
            file.write_all(&chunk).await.map_err(|error| {
                DownloadError::io_with_path("failed to write download data", &dest, &error)
            })?;
            downloaded += chunk.len() as u64;

            if let Some(total) = total {
                let _ = progress
                    .send(DownloadProgress::Percent(percent(downloaded, total)))
                    .await;
            }
        }
    }
    .await;

    // Flush even on failure so the partial file reflects every received byte.
    let flushed = file.flush().await.map_err(|error| {
        DownloadError::io_with_path("failed to flush download file", &dest, &error)
    });

    if let Err(error) = streamed {
        warn!(
            "Download stopped after {downloaded} bytes, partial file left at {}: {error}",
            dest.display()
        );
        return Err(error);
    }
    flushed?;

    info!("Download complete: {downloaded} bytes");
    Ok(dest)
}
