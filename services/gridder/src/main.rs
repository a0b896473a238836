//! Daily Level 3 gridder for VIIRS aerosol retrievals.
//!
//! Grids the Deep Blue and Dark Target Level 2 products for a date range
//! and writes one combined NetCDF file per day.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use gridder::{build_source, logging, run, Args, RunConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = RunConfig::load(&args)?;
    let range = config.date_range()?;

    let log_file = args.log_dir.as_ref().map(|dir| {
        logging::log_file_path(
            dir,
            range.start,
            range.end,
            chrono::Local::now().naive_local(),
        )
    });
    logging::init(&args.log_level, args.log_format, log_file.as_deref())?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        log_file = ?log_file,
        "Starting VIIRS aerosol gridder"
    );

    netcdf_parser::silence_hdf5_errors();

    let source = build_source(&config)
        .await
        .context("Failed to set up granule source")?;
    let summary = run(&config, source).await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
