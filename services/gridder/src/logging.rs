//! Tracing setup for the gridder binary.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::ValueEnum;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use aerosol_common::ProcessingDay;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// `MAINPROCESS_{start}_{end}_{YYYYMMDD_HHMMSS}.log`
pub fn log_file_name(start: ProcessingDay, end: ProcessingDay, started_at: NaiveDateTime) -> String {
    format!(
        "MAINPROCESS_{}_{}_{}.log",
        start.compact(),
        end.compact(),
        started_at.format("%Y%m%d_%H%M%S")
    )
}

pub fn log_file_path(
    dir: &Path,
    start: ProcessingDay,
    end: ProcessingDay,
    started_at: NaiveDateTime,
) -> PathBuf {
    dir.join(log_file_name(start, end, started_at))
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `level` when set. With `log_file`, every
/// event is also written there as plain text.
pub fn init(level: &str, format: LogFormat, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(parse_level(level).into())
        .from_env_lossy();

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create log directory: {}", parent.display())
                })?;
            }
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file: {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(true))
            .try_init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .try_init(),
    }
    .context("Failed to install tracing subscriber")
}
