//! Per-day processing: list, read, filter, grid, combine, export.

use anyhow::{Context, Result};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument, Span};

use aerosol_common::{AerosolError, ProcessingDay, Product, Satellite, SampleStream};
use grid_processor::{
    aggregate_samples, combine_products, DailyProduct, GridDomain, L3WriteResult, L3Writer,
    ProductMetadata,
};
use netcdf_parser::{read_granule_bytes, read_granule_file};

use crate::config::RunConfig;
use crate::sources::{GranuleData, GranuleSource};

/// Granules fetched and parsed at once within one product.
const GRANULE_CONCURRENCY: usize = 4;

/// What a successful day produced.
#[derive(Debug, Clone)]
pub struct DayOutput {
    pub day: ProcessingDay,
    pub path: PathBuf,
    pub bytes_written: u64,
    pub db_granules: usize,
    pub dt_granules: usize,
    pub db_samples: usize,
    pub dt_samples: usize,
}

/// Samples of one product for one day, plus the granules they came from.
struct ProductInput {
    samples: SampleStream,
    files: Vec<String>,
    skipped: Vec<String>,
}

/// Runs the daily chain for every day of a run.
pub struct DayProcessor {
    source: Arc<dyn GranuleSource>,
    domain: GridDomain,
    satellite: Satellite,
    min_value: f32,
    max_value: f32,
    output_dir: PathBuf,
    writer: Arc<L3Writer>,
}

impl DayProcessor {
    pub fn new(source: Arc<dyn GranuleSource>, config: &RunConfig) -> Result<Self> {
        let domain = config.domain().context("Invalid grid domain")?;

        Ok(Self {
            source,
            domain,
            satellite: config.satellite,
            min_value: config.min_value,
            max_value: config.max_value,
            output_dir: config.output_dir.clone(),
            writer: Arc::new(L3Writer::new(config.export.clone())),
        })
    }

    pub fn domain(&self) -> &GridDomain {
        &self.domain
    }

    /// Produce the daily file for `day`.
    ///
    /// Fails when either product has no granules listed or none readable.
    pub async fn process_day(&self, day: ProcessingDay) -> Result<DayOutput> {
        info!(source = %self.source.describe(), "Processing day");

        let db_collection = Product::DeepBlue.collection(self.satellite);
        let dt_collection = Product::DarkTarget.collection(self.satellite);

        let db_files = self.list(&db_collection, day).await?;
        let dt_files = self.list(&dt_collection, day).await?;

        let db = self
            .load_product(Product::DeepBlue, &db_collection, day, &db_files)
            .instrument(info_span!("product", product = %Product::DeepBlue))
            .await?;
        let dt = self
            .load_product(Product::DarkTarget, &dt_collection, day, &dt_files)
            .instrument(info_span!("product", product = %Product::DarkTarget))
            .await?;

        let db_granules = db.files.len();
        let dt_granules = dt.files.len();
        let db_samples = db.samples.len();
        let dt_samples = dt.samples.len();

        let domain = self.domain;
        let satellite = self.satellite;
        let writer = Arc::clone(&self.writer);
        let output_dir = self.output_dir.clone();
        let span = Span::current();

        let written = tokio::task::spawn_blocking(move || {
            let _guard = span.enter();
            grid_and_export(&domain, &writer, &output_dir, day, satellite, db, dt)
        })
        .await
        .context("Gridding task failed")??;

        Ok(DayOutput {
            day,
            path: written.path,
            bytes_written: written.bytes_written,
            db_granules,
            dt_granules,
            db_samples,
            dt_samples,
        })
    }

    async fn list(&self, collection: &str, day: ProcessingDay) -> Result<Vec<String>> {
        let files = self
            .source
            .list_granules(collection, day)
            .await
            .with_context(|| format!("Failed to list {} granules", collection))?;

        if files.is_empty() {
            return Err(AerosolError::NoGranules {
                collection: collection.to_string(),
                day: day.year_doy(),
            }
            .into());
        }
        Ok(files)
    }

    async fn load_product(
        &self,
        product: Product,
        collection: &str,
        day: ProcessingDay,
        files: &[String],
    ) -> Result<ProductInput> {
        let results: Vec<(&String, Result<SampleStream>)> = stream::iter(files)
            .map(|name| async move {
                let result = self.read_granule(product, collection, day, name).await;
                (name, result)
            })
            .buffered(GRANULE_CONCURRENCY)
            .collect()
            .await;

        let mut samples = SampleStream::new();
        let mut used = Vec::with_capacity(files.len());
        let mut skipped = Vec::new();
        for (name, result) in results {
            match result {
                Ok(mut granule) => {
                    debug!(granule = %name, samples = granule.len(), "Read granule");
                    samples.append(&mut granule);
                    used.push(name.clone());
                }
                Err(e) => {
                    warn!(granule = %name, error = %format!("{:#}", e), "Skipping granule");
                    skipped.push(name.clone());
                }
            }
        }

        if used.is_empty() {
            return Err(AerosolError::DataReadError(format!(
                "none of the {} {} granules could be read",
                files.len(),
                collection
            ))
            .into());
        }

        let read = samples.len();
        samples.retain_value_range(self.min_value, self.max_value);
        info!(
            granules = used.len(),
            skipped = skipped.len(),
            samples = samples.len(),
            out_of_range = read - samples.len(),
            "Loaded product samples"
        );

        Ok(ProductInput {
            samples,
            files: used,
            skipped,
        })
    }

    async fn read_granule(
        &self,
        product: Product,
        collection: &str,
        day: ProcessingDay,
        name: &str,
    ) -> Result<SampleStream> {
        let data = self.source.fetch_granule(collection, day, name).await?;

        let span = Span::current();
        let samples = tokio::task::spawn_blocking(move || {
            let _guard = span.enter();
            match data {
                GranuleData::Bytes(bytes) => read_granule_bytes(&bytes, product),
                GranuleData::File(path) => read_granule_file(&path, product),
            }
        })
        .await
        .context("Granule reader task failed")??;

        Ok(samples)
    }
}

/// The blocking half of a day: both aggregations, the combiner and the export.
fn grid_and_export(
    domain: &GridDomain,
    writer: &L3Writer,
    output_dir: &Path,
    day: ProcessingDay,
    satellite: Satellite,
    db: ProductInput,
    dt: ProductInput,
) -> Result<L3WriteResult> {
    let db_grid = aggregate_samples(domain, &db.samples)?;
    drop(db.samples);
    let dt_grid = aggregate_samples(domain, &dt.samples)?;
    drop(dt.samples);

    let combined = combine_products(&db_grid, &dt_grid)?;
    info!(
        db_cells = db_grid.occupied_cells(),
        dt_cells = dt_grid.occupied_cells(),
        "Gridded products"
    );
    debug!(
        db_binned = db_grid.binned_samples(),
        db_out_of_domain = db_grid.out_of_domain,
        dt_binned = dt_grid.binned_samples(),
        dt_out_of_domain = dt_grid.out_of_domain,
        "Binned samples"
    );

    let metadata = ProductMetadata {
        day,
        satellite,
        production_time: Utc::now(),
        input_files: db.files.into_iter().chain(dt.files).collect(),
        skipped_files: db.skipped.into_iter().chain(dt.skipped).collect(),
    };
    let product = DailyProduct {
        db: &db_grid,
        dt: &dt_grid,
        combined: &combined,
    };

    writer
        .write(output_dir, &product, &metadata)
        .context("Failed to export daily product")
}
