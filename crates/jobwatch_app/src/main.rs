mod config;
mod logging;

use std::process::ExitCode;
use std::rc::Rc;

use anyhow::Context;
use jobwatch_engine::{
    BrowserSession, ChromeFactory, DedupStore, RunController, RunSummary, TelegramNotifier,
    ThreadPacer,
};
use jobwatch_logging::{watch_critical, watch_info};

use crate::config::{AppConfig, ConfigError};
use crate::logging::LogSettings;

fn main() -> ExitCode {
    let log_settings = LogSettings::from_lookup(|name| std::env::var(name).ok());
    logging::initialize(&log_settings);

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err @ ConfigError::Missing(_)) => {
            watch_critical!("{}. Aborting job search.", err);
            return ExitCode::FAILURE;
        }
        Err(err) => {
            watch_critical!("Invalid configuration: {}", err);
            return ExitCode::FAILURE;
        }
    };

    match run(&config) {
        Ok(summary) => {
            watch_info!(
                "Job search and notification cycle complete: {} sent, {} failed.",
                summary.sent,
                summary.failed
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            watch_critical!("An unhandled error occurred during main execution: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// One watch cycle. The browser is closed on every path out of here,
/// including errors from the run itself.
fn run(config: &AppConfig) -> anyhow::Result<RunSummary> {
    let notifier =
        TelegramNotifier::new(config.telegram.clone()).context("setting up the Telegram notifier")?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting the async runtime")?;
    let controller = RunController::new(
        config.filter(),
        DedupStore::new(&config.posted_jobs_file),
        Box::new(notifier),
        config.run.clone(),
    );

    let mut session = BrowserSession::open(
        Box::new(ChromeFactory),
        config.session.clone(),
        Rc::new(ThreadPacer),
    )
    .context("launching the browser")?;

    let summary = controller.run(&mut session, &config.sites, &runtime);
    session.close();
    summary.context("reading the posted jobs file")
}
