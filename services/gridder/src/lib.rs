//! Daily VIIRS DB/DT aerosol gridding service.
//!
//! For each day in a range, lists the Deep Blue and Dark Target Level 2
//! granules, reads and range-filters their samples, bins both products onto
//! one lat/lon grid, combines them and writes one NetCDF-4 file per day.
//! Days run concurrently; a failed day is recorded and never stops the run.

pub mod archive;
pub mod config;
pub mod credentials;
pub mod logging;
pub mod pipeline;
pub mod runner;
pub mod sources;

use anyhow::{Context, Result};
use std::sync::Arc;

pub use config::{Args, RunConfig};
pub use runner::{run, RunSummary};
pub use sources::{ArchiveSource, GranuleData, GranuleSource, LocalSource};

/// Pick the granule source for a run: the local tree when `input_dir` is
/// set, otherwise the archive with freshly issued S3 credentials.
pub async fn build_source(config: &RunConfig) -> Result<Arc<dyn GranuleSource>> {
    if let Some(dir) = &config.input_dir {
        return Ok(Arc::new(LocalSource::new(dir.clone())));
    }

    let login = config
        .login()
        .context("Earthdata credentials are required for archive access")?;
    let archive = archive::ArchiveClient::new(config.archive_url.clone())?;
    let credentials = credentials::CredentialClient::new()?;
    let source = ArchiveSource::connect(archive, credentials, login).await?;

    Ok(Arc::new(source))
}
