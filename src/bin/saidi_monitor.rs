//! Watch a running search through its progress file, or ask it to stop.

use anyhow::Context;
use clap::Parser;
use log::warn;
use saidi_forecast::search::{format_model_info, ObservedStatus, ProgressMonitor};
use saidi_forecast::SearchError;
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "saidi-monitor")]
#[command(version, about = "Follow or cancel a running SAIDI parameter search", long_about = None)]
struct Cli {
    /// Progress document written by saidi-search
    #[arg(long)]
    progress: PathBuf,

    /// Polling interval in milliseconds
    #[arg(long, default_value_t = 500)]
    interval_ms: u64,

    /// Write the cancel file and exit
    #[arg(long)]
    cancel: bool,

    /// Reason recorded in the cancel file
    #[arg(long, default_value = "requested from monitor")]
    reason: String,
}

fn init_logging() {
    env_logger::Builder::new()
        .filter(None, log::LevelFilter::Warn)
        .filter(Some("saidi_forecast"), log::LevelFilter::Info)
        .parse_default_env()
        .init();
}

fn follow(monitor: &ProgressMonitor, interval: Duration) -> ExitCode {
    let mut last: Option<ObservedStatus> = None;
    loop {
        let observed = match monitor.observe() {
            Ok(observed) => observed,
            Err(err) => {
                warn!("could not read {}: {err}", monitor.path().display());
                thread::sleep(interval);
                continue;
            }
        };

        if last.as_ref() != Some(&observed) {
            match &observed {
                ObservedStatus::NotStarted => println!("waiting for search to start"),
                ObservedStatus::Running { progress, status } => {
                    println!("[{progress:5.1}%] {status}")
                }
                ObservedStatus::Completed { top_models } => {
                    println!("completed");
                    for (rank, model) in top_models.iter().enumerate() {
                        println!("  #{} {}", rank + 1, format_model_info(model));
                    }
                }
                ObservedStatus::CompletedEmpty { status } => println!("completed: {status}"),
                ObservedStatus::Cancelled => println!("cancelled"),
                ObservedStatus::Errored { message } => println!("{message}"),
            }
        }

        match observed {
            ObservedStatus::Completed { .. } | ObservedStatus::CompletedEmpty { .. } => {
                return ExitCode::SUCCESS
            }
            ObservedStatus::Cancelled => {
                return ExitCode::from(SearchError::CANCELLED_EXIT_CODE)
            }
            ObservedStatus::Errored { .. } => {
                return ExitCode::from(SearchError::FAILURE_EXIT_CODE)
            }
            ObservedStatus::NotStarted | ObservedStatus::Running { .. } => {}
        }
        last = Some(observed);
        thread::sleep(interval);
    }
}

fn main() -> anyhow::Result<ExitCode> {
    init_logging();
    let cli = Cli::parse();
    let monitor = ProgressMonitor::new(&cli.progress);

    if cli.cancel {
        let path = monitor
            .request_cancel(&cli.reason)
            .context("failed to write cancel file")?;
        println!("cancellation requested: {}", path.display());
        return Ok(ExitCode::SUCCESS);
    }

    Ok(follow(&monitor, Duration::from_millis(cli.interval_ms)))
}
