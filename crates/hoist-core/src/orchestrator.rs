//! Coordination of the update pipeline for a host application.
//!
//! The orchestrator starts checks, downloads and installs on a tokio runtime
//! and reports every outcome as an [`UpdateEvent`] on a single channel. At most
//! one check and one download run at a time; a second request of the same kind
//! is answered with [`Trigger::AlreadyRunning`].

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use hoist_platform::PlatformId;
use log::{debug, warn};
use tokio::runtime::Handle;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc};
use tokio_util::sync::CancellationToken;

use crate::config::UpdaterConfig;
use crate::download::{DownloadProgress, download_update};
use crate::install::{Launcher, SystemLauncher, install_update};
use crate::update::{CheckOutcome, UpdateError, check_for_update};

const EVENT_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug)]
pub enum UpdateEvent {
    Checked(CheckOutcome),
    DownloadProgress(u8),
    DownloadFinished(PathBuf),
    DownloadFailed(String),
    /// The installer is running; the host should terminate.
    ExitForInstaller { path: PathBuf },
    InstallFailed { path: PathBuf, reason: String },
}

#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Started,
    AlreadyRunning,
}

pub struct UpdateOrchestrator {
    runtime: Handle,
    client: reqwest::Client,
    config: Arc<UpdaterConfig>,
    platform: Option<PlatformId>,
    launcher: Arc<dyn Launcher>,
    events: mpsc::Sender<UpdateEvent>,
    check_slot: Arc<Semaphore>,
    download_slot: Arc<Semaphore>,
    /// Token of the running download; cleared before its terminal event.
    download_cancel: Arc<Mutex<Option<CancellationToken>>>,
}

impl UpdateOrchestrator {
    /// Create an orchestrator that runs its work on `runtime`, returning it
    /// together with the receiving end of its event channel.
    ///
    /// # Errors
    /// Returns an error when the HTTP client cannot be built.
    pub fn new(
        config: UpdaterConfig,
        runtime: Handle,
    ) -> Result<(Self, mpsc::Receiver<UpdateEvent>), UpdateError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(UpdateError::ClientBuild)?;
        let (events, receiver) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let orchestrator = Self {
            runtime,
            client,
            config: Arc::new(config),
            platform: PlatformId::current(),
            launcher: Arc::new(SystemLauncher),
            events,
            check_slot: Arc::new(Semaphore::new(1)),
            download_slot: Arc::new(Semaphore::new(1)),
            download_cancel: Arc::new(Mutex::new(None)),
        };
        Ok((orchestrator, receiver))
    }

    #[must_use]
    pub fn with_launcher(mut self, launcher: Arc<dyn Launcher>) -> Self {
        self.launcher = launcher;
        self
    }

    #[must_use]
    pub fn with_platform(mut self, platform: Option<PlatformId>) -> Self {
        self.platform = platform;
        self
    }

    #[must_use]
    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    #[must_use]
    pub fn is_checking(&self) -> bool {
        self.check_slot.available_permits() == 0
    }

    #[must_use]
    pub fn is_downloading(&self) -> bool {
        self.download_slot.available_permits() == 0
    }

    /// Start a release feed check for `current_version`.
    ///
    /// Emits exactly one [`UpdateEvent::Checked`] per started check.
    pub fn check_for_updates(&self, current_version: &str) -> Trigger {
        let Some(permit) = try_claim(&self.check_slot) else {
            debug!("Update check already in flight");
            return Trigger::AlreadyRunning;
        };

        let client = self.client.clone();
        let config = Arc::clone(&self.config);
        let events = self.events.clone();
        let platform = self.platform;
        let current_version = current_version.to_string();

        self.runtime.spawn(async move {
            let outcome = check_for_update(&client, &config, &current_version, platform).await;
            drop(permit);
            let _ = events.send(UpdateEvent::Checked(outcome)).await;
        });
        Trigger::Started
    }

    /// Start downloading `url` into the configured download directory.
    ///
    /// Emits zero or more [`UpdateEvent::DownloadProgress`] events followed by
    /// exactly one of [`UpdateEvent::DownloadFinished`] or
    /// [`UpdateEvent::DownloadFailed`].
    pub fn download(&self, url: &str) -> Trigger {
        let Some(permit) = try_claim(&self.download_slot) else {
            debug!("Download already in flight");
            return Trigger::AlreadyRunning;
        };

        let cancel = CancellationToken::new();
        *self
            .download_cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(cancel.clone());

        let client = self.client.clone();
        let events = self.events.clone();
        let cancel_slot = Arc::clone(&self.download_cancel);
        let dest_dir = self.config.resolved_download_dir();
        let url = url.to_string();

        self.runtime.spawn(async move {
            let (progress_tx, mut progress_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

            // Owning the sender here closes the progress channel when the
            // transfer ends, which lets the relay drain and finish.
            let transfer = async move {
                download_update(&client, &url, &dest_dir, &progress_tx, Some(&cancel)).await
            };
            let relay = async {
                while let Some(DownloadProgress::Percent(pct)) = progress_rx.recv().await {
                    let _ = events.send(UpdateEvent::DownloadProgress(pct)).await;
                }
            };
            let (result, ()) = tokio::join!(transfer, relay);

            cancel_slot
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            drop(permit);
            let event = match result {
                Ok(path) => UpdateEvent::DownloadFinished(path),
                Err(error) => {
                    warn!("Update download failed: {error}");
                    UpdateEvent::DownloadFailed(error.to_string())
                }
            };
            let _ = events.send(event).await;
        });
        Trigger::Started
    }

    /// Cancel the running download, if any. Returns whether one was running.
    pub fn cancel_download(&self) -> bool {
        let guard = self
            .download_cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().is_some_and(|token| {
            token.cancel();
            true
        })
    }

    /// Launch the downloaded update at `path`.
    ///
    /// Emits [`UpdateEvent::ExitForInstaller`] once the installer runs, or
    /// [`UpdateEvent::InstallFailed`] carrying the path for a manual install.
    pub fn install(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let launcher = Arc::clone(&self.launcher);
        let platform = self.platform;
        let events = self.events.clone();

        self.runtime.spawn(async move {
            let dispatch_path = path.clone();
            let result = tokio::task::spawn_blocking(move || {
                install_update(&dispatch_path, platform, launcher.as_ref())
            })
            .await;

            let event = match result {
                Ok(Ok(started)) => UpdateEvent::ExitForInstaller { path: started.path },
                Ok(Err(error)) => {
                    warn!("Update install failed: {error}");
                    UpdateEvent::InstallFailed {
                        path,
                        reason: error.to_string(),
                    }
                }
                Err(error) => UpdateEvent::InstallFailed {
                    path,
                    reason: format!("install task panicked: {error}"),
                },
            };
            let _ = events.send(event).await;
        });
    }
}

fn try_claim(slot: &Arc<Semaphore>) -> Option<OwnedSemaphorePermit> {
    Arc::clone(slot).try_acquire_owned().ok()
}
