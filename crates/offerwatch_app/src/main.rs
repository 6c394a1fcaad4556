//! CLI entry point: run one check against the configured listings page
//! and report the outcome. Scheduling repeated checks is the caller's
//! job (cron, a supervisor loop), not ours.

mod config;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::LevelFilter;
use thiserror::Error;

use offerwatch_engine::{
    BrowserSettings, CancelFlag, ExtractError, JsonStateStore, LogNotifier, Notifier, NotifyError,
    RunCoordinator, RunError, RunOutcome, RunStatus, SelectorExtractor, WebDriverBrowser,
    WebhookNotifier,
};
use offerwatch_logging::{watch_error, watch_info};

use crate::config::{ConfigError, WatchConfig};

#[derive(Debug, Parser)]
#[command(name = "offerwatch", about = "Monitor a listings page for new offers")]
struct Cli {
    /// Path to the JSON configuration bundle.
    #[arg(long, short, default_value = "watch.json")]
    config: PathBuf,

    /// Override the snapshot path from the config file.
    #[arg(long)]
    state_path: Option<PathBuf>,

    /// Additionally write logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log at debug level.
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
    #[error(transparent)]
    Run(#[from] RunError),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    offerwatch_logging::initialize(level, cli.log_file.as_deref());

    match run(cli).await {
        Ok(outcome) => {
            // One JSON line on stdout for schedulers that parse it.
            println!("{}", outcome.to_json());
            match outcome.status {
                RunStatus::Committed => ExitCode::SUCCESS,
                RunStatus::Aborted => ExitCode::FAILURE,
            }
        }
        Err(err) => {
            watch_error!("offerwatch could not start a check: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<RunOutcome, AppError> {
    let mut config = WatchConfig::load(&cli.config)?;
    if let Some(state_path) = cli.state_path {
        config.state_path = state_path;
    }
    let settings = config.run_settings()?;
    watch_info!("checking {} for new offers", settings.target_url);

    let browser = WebDriverBrowser::new(BrowserSettings {
        webdriver_url: config.webdriver_url.clone(),
        headless: config.headless,
        launch_timeout: std::time::Duration::from_secs(config.launch_timeout_secs),
        ..BrowserSettings::default()
    })?;
    let extractor = SelectorExtractor::new(&config.mapping, &config.target_url)?;
    let store = JsonStateStore::new(config.state_path.clone());
    let notifier: Arc<dyn Notifier> = match &config.webhook_url {
        Some(endpoint) => Arc::new(WebhookNotifier::new(
            endpoint.clone(),
            std::time::Duration::from_secs(config.webhook_timeout_secs),
        )?),
        None => Arc::new(LogNotifier),
    };

    let coordinator = RunCoordinator::new(
        Arc::new(browser),
        Arc::new(extractor),
        Arc::new(store),
        notifier,
        settings,
    );

    // Honor shutdown requests at the next phase boundary; the browser
    // session is still torn down.
    let cancel = CancelFlag::new();
    let signal_flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            watch_info!("shutdown requested; cancelling at next phase boundary");
            signal_flag.cancel();
        }
    });

    Ok(coordinator.run_once(&cancel).await)
}
