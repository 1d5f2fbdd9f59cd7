//! Hoist - check for, download and install application updates

use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use hoist_core::UpdateOrchestrator;
use hoist_platform::{AppPaths, PlatformId};
use log::{error, info, warn};

mod app;
mod error;
mod logging;
mod settings;

use app::{SessionOptions, Terminal, UpdateSession};
use error::AppError;
use settings::AppSettings;

/// Hoist - application self-updater
#[derive(Parser)]
#[command(name = "hoist", version)]
#[command(about = "Check for, download and install application updates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Release feed to query instead of the configured one
    #[arg(long, global = true)]
    feed_url: Option<String>,

    /// Version to compare releases against
    #[arg(long, global = true, default_value = env!("CARGO_PKG_VERSION"))]
    current_version: String,

    /// Answer yes to every prompt
    #[arg(short, long, global = true)]
    yes: bool,

    /// Stop after downloading the update
    #[arg(long, global = true)]
    no_install: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the release feed now
    Check,
    /// Download an asset directly, skipping the check
    Download { url: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let (mut settings, load_error) = match AppSettings::load() {
        Ok(settings) => (settings, None),
        Err(error) => (AppSettings::default(), Some(error)),
    };

    logging::init_logging(
        cli.verbose || settings.debug_logging,
        settings.max_log_size_bytes,
    );
    if let Some(error) = load_error {
        warn!("{error}; using default settings");
        eprintln!("{error}; using default settings");
    }
    write_default_settings(&settings);

    if let Some(feed_url) = cli.feed_url.clone() {
        settings.updater.feed_url = feed_url;
    }

    match run(cli, settings).await {
        Ok(code) => code,
        Err(error) => {
            error!("{error}");
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, settings: AppSettings) -> Result<ExitCode, AppError> {
    match PlatformId::current() {
        Some(platform) => info!("hoist {} on {platform}", cli.current_version),
        None => warn!("No update channel for this platform"),
    }

    let (orchestrator, mut events) =
        UpdateOrchestrator::new(settings.updater, tokio::runtime::Handle::current())
            .map_err(|error| AppError::auto_update_failed("setup", error))?;

    let options = SessionOptions {
        assume_yes: cli.yes,
        no_install: cli.no_install,
    };
    let mut session = UpdateSession::new(orchestrator, Terminal, options);

    match cli.command {
        Some(Commands::Download { url }) => session.start_download(&url),
        Some(Commands::Check) => session.start_check(&cli.current_version, Duration::ZERO).await,
        None if settings.check_on_startup => {
            let delay = Duration::from_secs(settings.startup_delay_secs);
            session.start_check(&cli.current_version, delay).await;
        }
        None => {
            println!("Startup update check is disabled; run `hoist check` to check now.");
            return Ok(ExitCode::SUCCESS);
        }
    }

    Ok(session.run(&mut events).await)
}

/// Write the defaults on first run so the settings file can be edited.
fn write_default_settings(settings: &AppSettings) {
    let Ok(paths) = AppPaths::new() else {
        return;
    };
    if paths.settings_file().exists() {
        return;
    }
    if let Err(error) = settings.save() {
        warn!("{}", AppError::settings("save", error));
    }
}
