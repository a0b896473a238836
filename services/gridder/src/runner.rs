//! Date-range driver: runs the daily pipeline with bounded concurrency.

use anyhow::Result;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, info_span, Instrument};

use aerosol_common::ProcessingDay;

use crate::config::RunConfig;
use crate::pipeline::DayProcessor;
use crate::sources::GranuleSource;

/// Outcome of a run, printed as JSON by the binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Fraction of days that produced a file, 0.0 for an empty run.
    pub success_rate: f64,
    pub processed_days: Vec<ProcessingDay>,
    pub failed_days: Vec<ProcessingDay>,
    /// Wall time as `HH:MM:SS`.
    pub total_execution_time: String,
}

impl RunSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed_days.is_empty()
    }
}

pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60)
}

fn log_parameters(config: &RunConfig, days: &[ProcessingDay]) {
    info!(
        grid_size = config.grid_size,
        export_path = %config.output_dir.display(),
        lon_range = ?(config.min_lon, config.max_lon),
        lat_range = ?(config.min_lat, config.max_lat),
        value_range = ?(config.min_value, config.max_value),
        satellite = %config.satellite,
        workers = config.num_workers,
        num_dates = days.len(),
        "Run parameters"
    );
    info!(
        dates = ?days.iter().map(|d| d.year_doy()).collect::<Vec<_>>(),
        start = %config.start_date,
        end = %config.end_date,
        "Dates to process"
    );
}

/// Process every day of the configured range.
///
/// A failed day is logged and recorded; it never stops the other days.
/// Results are reported in day order.
pub async fn run(config: &RunConfig, source: Arc<dyn GranuleSource>) -> Result<RunSummary> {
    let started = Instant::now();
    let days = config.date_range()?.days();
    let processor = Arc::new(DayProcessor::new(source, config)?);

    log_parameters(config, &days);
    info!(
        xdim = processor.domain().xdim(),
        ydim = processor.domain().ydim(),
        "Grid domain"
    );

    let outcomes: Vec<(ProcessingDay, bool)> = stream::iter(days)
        .map(|day| {
            let processor = Arc::clone(&processor);
            let span = info_span!("day", day = %day);
            async move {
                let day_started = Instant::now();
                match processor.process_day(day).instrument(span.clone()).await {
                    Ok(output) => {
                        span.in_scope(|| {
                            info!(
                                path = %output.path.display(),
                                bytes = output.bytes_written,
                                db_granules = output.db_granules,
                                dt_granules = output.dt_granules,
                                db_samples = output.db_samples,
                                dt_samples = output.dt_samples,
                                elapsed = %format_elapsed(day_started.elapsed()),
                                "Day complete"
                            )
                        });
                        (day, true)
                    }
                    Err(e) => {
                        span.in_scope(|| {
                            error!(error = %format!("{:#}", e), "Day failed");
                        });
                        (day, false)
                    }
                }
            }
        })
        .buffered(config.num_workers.max(1))
        .collect()
        .await;

    let total = outcomes.len();
    let (processed, failed): (Vec<_>, Vec<_>) = outcomes.into_iter().partition(|(_, ok)| *ok);
    let processed_days: Vec<ProcessingDay> = processed.into_iter().map(|(d, _)| d).collect();
    let failed_days: Vec<ProcessingDay> = failed.into_iter().map(|(d, _)| d).collect();

    let success_rate = if total == 0 {
        0.0
    } else {
        processed_days.len() as f64 / total as f64
    };

    let summary = RunSummary {
        success_rate,
        processed_days,
        failed_days,
        total_execution_time: format_elapsed(started.elapsed()),
    };

    info!(
        success_rate = %format!("{:.1}%", summary.success_rate * 100.0),
        processed = ?summary.processed_days.iter().map(|d| d.year_doy()).collect::<Vec<_>>(),
        failed = ?summary.failed_days.iter().map(|d| d.year_doy()).collect::<Vec<_>>(),
        total_execution_time = %summary.total_execution_time,
        "Run complete"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_elapsed(Duration::from_millis(59_999)), "00:00:59");
        assert_eq!(format_elapsed(Duration::from_secs(3_725)), "01:02:05");
        assert_eq!(format_elapsed(Duration::from_secs(100 * 3600)), "100:00:00");
    }

    #[test]
    fn test_summary_serializes_days_as_dates() {
        let summary = RunSummary {
            success_rate: 0.5,
            processed_days: vec![ProcessingDay::parse("20240101").unwrap()],
            failed_days: vec![ProcessingDay::parse("20240102").unwrap()],
            total_execution_time: "00:00:07".to_string(),
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["success_rate"], 0.5);
        assert_eq!(json["processed_days"][0], "2024-01-01");
        assert_eq!(json["failed_days"][0], "2024-01-02");
        assert!(!summary.all_succeeded());
    }
}
