//! Terminal front end for the update pipeline.
//!
//! Drives an [`UpdateOrchestrator`] from its event channel: announces results,
//! asks before downloading and installing, and decides the exit status.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use hoist_core::{CheckOutcome, Trigger, UpdateEvent, UpdateInfo, UpdateOrchestrator};
use log::{debug, info};
use tokio::sync::mpsc;

use crate::error::AppError;

const NOTES_PREVIEW_CHARS: usize = 200;

/// Where the session reports progress and asks questions.
pub trait Console {
    fn say(&mut self, line: &str);

    /// Ask a yes/no question. An empty answer means yes.
    fn confirm(&mut self, question: &str) -> bool;
}

pub struct Terminal;

impl Console for Terminal {
    fn say(&mut self, line: &str) {
        println!("{line}");
    }

    fn confirm(&mut self, question: &str) -> bool {
        print!("{question} [Y/n] ");
        let _ = std::io::stdout().flush();

        let mut answer = String::new();
        let read = tokio::task::block_in_place(|| std::io::stdin().lock().read_line(&mut answer));
        match read {
            Ok(0) | Err(_) => false,
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "" | "y" | "yes"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    /// Answer every confirmation with yes.
    pub assume_yes: bool,
    /// Stop after a successful download.
    pub no_install: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit(u8),
}

pub struct UpdateSession<C> {
    orchestrator: UpdateOrchestrator,
    console: C,
    options: SessionOptions,
    /// Started operations whose terminal event has not arrived yet.
    pending: usize,
    /// Set once any operation failed; the session then exits non-zero.
    failed: bool,
    last_percent: Option<u8>,
}

impl<C: Console> UpdateSession<C> {
    pub fn new(orchestrator: UpdateOrchestrator, console: C, options: SessionOptions) -> Self {
        Self {
            orchestrator,
            console,
            options,
            pending: 0,
            failed: false,
            last_percent: None,
        }
    }

    /// Trigger a check after `delay`.
    pub async fn start_check(&mut self, current_version: &str, delay: Duration) {
        if !delay.is_zero() {
            debug!("Waiting {}s before checking for updates", delay.as_secs());
            tokio::time::sleep(delay).await;
        }
        self.console.say("Checking for updates...");
        let trigger = self.orchestrator.check_for_updates(current_version);
        self.track(trigger);
    }

    pub fn start_download(&mut self, url: &str) {
        self.console.say(&format!("Downloading {url}"));
        self.last_percent = None;
        let trigger = self.orchestrator.download(url);
        self.track(trigger);
    }

    /// Handle events until nothing is in flight, returning the exit status.
    pub async fn run(&mut self, events: &mut mpsc::Receiver<UpdateEvent>) -> ExitCode {
        ExitCode::from(self.drive(events).await)
    }

    async fn drive(&mut self, events: &mut mpsc::Receiver<UpdateEvent>) -> u8 {
        while self.pending > 0 {
            let Some(event) = events.recv().await else {
                break;
            };
            if let Flow::Exit(code) = self.handle_event(event) {
                return code;
            }
        }
        u8::from(self.failed)
    }

    fn track(&mut self, trigger: Trigger) {
        match trigger {
            Trigger::Started => self.pending += 1,
            Trigger::AlreadyRunning => debug!("Request ignored, operation already running"),
        }
    }

    fn settle(&mut self) {
        self.pending = self.pending.saturating_sub(1);
    }

    fn handle_event(&mut self, event: UpdateEvent) -> Flow {
        match event {
            UpdateEvent::Checked(outcome) => {
                self.settle();
                self.handle_check(outcome)
            }
            UpdateEvent::DownloadProgress(pct) => {
                if self.last_percent != Some(pct) {
                    self.last_percent = Some(pct);
                    self.console.say(&format!("Downloading... {pct}%"));
                }
                Flow::Continue
            }
            UpdateEvent::DownloadFinished(path) => {
                self.settle();
                self.handle_downloaded(path)
            }
            UpdateEvent::DownloadFailed(reason) => {
                self.settle();
                let error = AppError::auto_update_failed("download", reason);
                self.console.say(&error.to_string());
                Flow::Exit(1)
            }
            UpdateEvent::ExitForInstaller { path } => {
                self.settle();
                info!("Installer started from {}, exiting", path.display());
                self.console.say("Installer started. Exiting.");
                Flow::Exit(0)
            }
            UpdateEvent::InstallFailed { path, reason } => {
                self.settle();
                self.failed = true;
                let error = AppError::auto_update_failed("install", reason);
                self.console.say(&error.to_string());
                self.console.say(&format!(
                    "Please manually install from: {}",
                    path.display()
                ));
                Flow::Continue
            }
        }
    }

    fn handle_check(&mut self, outcome: CheckOutcome) -> Flow {
        match outcome {
            CheckOutcome::NoUpdate => self.console.say("You have the latest version"),
            CheckOutcome::NoCompatibleAsset { version } => self.console.say(&format!(
                "Version {version} is available, but not for this platform"
            )),
            CheckOutcome::CheckFailed(error) => {
                self.failed = true;
                self.console
                    .say(&AppError::update_check_failed(error).to_string());
            }
            CheckOutcome::UpdateAvailable(update) => self.offer_update(&update),
        }
        Flow::Continue
    }

    fn offer_update(&mut self, update: &UpdateInfo) {
        self.console
            .say(&format!("A new version ({}) is available!", update.version));
        self.console.say(&format!(
            "Release Notes:\n{}",
            notes_preview(&update.notes)
        ));
        if self.ask("Would you like to download and install it now?") {
            self.start_download(&update.url);
        }
    }

    fn handle_downloaded(&mut self, path: PathBuf) -> Flow {
        self.console
            .say(&format!("Update downloaded to {}", path.display()));
        if self.options.no_install {
            return Flow::Continue;
        }
        if self.ask("Install the update now? The application will exit.") {
            self.orchestrator.install(path);
            self.pending += 1;
        }
        Flow::Continue
    }

    fn ask(&mut self, question: &str) -> bool {
        self.options.assume_yes || self.console.confirm(question)
    }
}

/// First characters of the release notes, always followed by an ellipsis.
fn notes_preview(notes: &str) -> String {
    let head: String = notes.chars().take(NOTES_PREVIEW_CHARS).collect();
    format!("{head}...")
}
