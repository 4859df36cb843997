mod cli;
mod core;
mod video;

use clap::Parser;
use cli::Cli;
use crate::core::{is_supported_input, AppConfig, ConversionOutcome, ConversionRequest};
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use video::{ConversionRunner, ConversionTicket};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const PROGRESS_INTERVAL: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config_path = cli.config_path();
    let config = cli.merge_config(AppConfig::load_or_default(&config_path));

    if cli.save_defaults {
        config.save_to(&config_path)
            .map_err(|e| anyhow::anyhow!("Failed to save defaults to {}: {}", config_path.display(), e))?;
        log::info!("Saved defaults to {}", config_path.display());
    }

    let runner = ConversionRunner::from_config(&config, Handle::current());
    log::debug!("Using ffmpeg at {}", runner.tool().program().display());

    if cli.check {
        return Ok(match runner.tool().version() {
            Ok(version) => {
                println!("{}", version);
                ExitCode::SUCCESS
            }
            Err(outcome) => {
                eprintln!("{}", outcome.notification());
                ExitCode::FAILURE
            }
        });
    }

    let request = cli.request(&config.defaults);
    if !request.source().as_os_str().is_empty() && !is_supported_input(request.source()) {
        log::warn!("{} does not look like a supported video file, trying anyway", request.source().display());
    }

    let outcome = wait_with_progress(&runner, runner.convert(request.clone())).await;
    let snapshot = runner.snapshot();
    log::debug!("Runner status: {} ({} completed)", snapshot.status_line(), snapshot.completed);
    notify(&request, &outcome);

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Indeterminate progress: ffmpeg gives no fraction, so just report that it is still running.
async fn wait_with_progress(runner: &ConversionRunner, mut ticket: ConversionTicket) -> ConversionOutcome {
    let started = Instant::now();
    let mut last_report = started;
    let mut ticker = tokio::time::interval(POLL_INTERVAL);

    loop {
        ticker.tick().await;
        if let Some(outcome) = ticket.try_outcome() {
            return outcome;
        }

        if last_report.elapsed() >= PROGRESS_INTERVAL {
            last_report = Instant::now();
            if let Some(active) = runner.snapshot().active_request {
                log::info!("Still converting {} ({}s elapsed)", active.source().display(), started.elapsed().as_secs());
            }
        }
    }
}

fn notify(request: &ConversionRequest, outcome: &ConversionOutcome) {
    if outcome.is_success() {
        println!("{}:\n{}", outcome.notification(), request.destination().display());
    } else {
        eprintln!("{}", outcome.notification());
    }
}
