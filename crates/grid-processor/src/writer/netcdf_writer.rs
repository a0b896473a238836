//! NetCDF-4 writer for the daily combined DB/DT product.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::ExportConfig;
use crate::error::{GridProcessorError, Result};
use crate::types::{CombinedProduct, GridDomain, GriddedProduct, FILL_COUNT, FILL_VALUE};
use crate::writer::metadata::{
    variable_specs, AttrValue, ProductMetadata, VariableKind, COORDINATES,
};

const DIMS: [&str; 3] = ["Time", "Longitude", "Latitude"];

/// Everything exported for one day.
#[derive(Debug, Clone, Copy)]
pub struct DailyProduct<'a> {
    pub db: &'a GriddedProduct,
    pub dt: &'a GriddedProduct,
    pub combined: &'a CombinedProduct,
}

impl DailyProduct<'_> {
    /// Both products share one domain and every array has one entry per cell.
    fn validate(&self) -> Result<GridDomain> {
        let domain = self.db.domain;
        if self.dt.domain != domain {
            return Err(GridProcessorError::DomainMismatch(format!(
                "DB on {} vs DT on {}",
                domain, self.dt.domain
            )));
        }
        for len in [
            self.combined.db_preferred.len(),
            self.combined.dt_preferred.len(),
            self.combined.averaged.len(),
        ] {
            if len != domain.len() {
                return Err(GridProcessorError::ShapeMismatch {
                    left: domain.len(),
                    right: len,
                });
            }
        }
        Ok(domain)
    }

    fn float_field(&self, name: &str) -> Option<&[f32]> {
        let field = match name {
            "DT_AOD_550_AVG" => &self.dt.mean,
            "DT_AOD_550_STD" => &self.dt.std,
            "DB_AOD_550_AVG" => &self.db.mean,
            "DB_AOD_550_STD" => &self.db.std,
            "DT_DB_AOD_550_AVG" => &self.combined.dt_preferred,
            "DB_DT_AOD_550_AVG" => &self.combined.db_preferred,
            "COMBINE_AOD_550_AVG" => &self.combined.averaged,
            "Sensor_Zenith_Angle" => &self.dt.mean_angle,
            _ => return None,
        };
        Some(field.as_slice())
    }

    fn count_field(&self, name: &str) -> Option<&[i32]> {
        match name {
            "DT_Number_Of_Pixels" => Some(self.dt.count.as_slice()),
            "DB_Number_Of_Pixels" => Some(self.db.count.as_slice()),
            _ => None,
        }
    }
}

/// Result of writing a daily file.
#[derive(Debug, Clone)]
pub struct L3WriteResult {
    /// Full path of the written file.
    pub path: PathBuf,
    /// File name without directory.
    pub file_name: String,
    /// Size on disk.
    pub bytes_written: u64,
}

/// Writer for the daily Level 3 NetCDF file.
pub struct L3Writer {
    config: ExportConfig,
}

impl L3Writer {
    /// Create a new writer with the given configuration.
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Write one day's product into `output_dir`.
    ///
    /// A partially written file is removed on failure.
    pub fn write(
        &self,
        output_dir: &Path,
        product: &DailyProduct<'_>,
        metadata: &ProductMetadata,
    ) -> Result<L3WriteResult> {
        self.config
            .validate()
            .map_err(GridProcessorError::ConfigError)?;
        let domain = product.validate()?;

        std::fs::create_dir_all(output_dir)?;
        let file_name = metadata.file_name();
        let path = output_dir.join(&file_name);

        if let Err(e) = self.write_file(&path, &domain, product, metadata) {
            let _ = std::fs::remove_file(&path);
            return Err(e);
        }

        let bytes_written = std::fs::metadata(&path)?.len();
        info!(
            file = %file_name,
            bytes = bytes_written,
            xdim = domain.xdim(),
            ydim = domain.ydim(),
            "Wrote daily L3 file"
        );

        Ok(L3WriteResult {
            path,
            file_name,
            bytes_written,
        })
    }

    fn write_file(
        &self,
        path: &Path,
        domain: &GridDomain,
        product: &DailyProduct<'_>,
        metadata: &ProductMetadata,
    ) -> Result<()> {
        let mut file = netcdf::create(path)?;

        file.add_dimension("Time", 1)?;
        file.add_dimension("Longitude", domain.xdim())?;
        file.add_dimension("Latitude", domain.ydim())?;

        let bbox = domain.bbox();

        let mut time = file.add_variable::<i32>("Time", &["Time"])?;
        time.put_attribute("long_name", "time")?;
        time.put_attribute("standard_name", "time")?;
        time.put_attribute("units", "days since 1990-01-01 00:00:00")?;
        time.put_values(&[metadata.day.days_since_epoch()], ..)?;

        let mut lon = file.add_variable::<f64>("Longitude", &["Longitude"])?;
        lon.put_attribute("valid_range", vec![bbox.min_lon, bbox.max_lon])?;
        lon.put_attribute("standard_name", "longitude")?;
        lon.put_attribute("long_name", "Geodetic Longitude")?;
        lon.put_attribute("units", "degree_east")?;
        lon.put_attribute("_CoordinateAxisType", "Lon")?;
        lon.put_values(&round_axis(domain.lon_axis()), ..)?;

        let mut lat = file.add_variable::<f64>("Latitude", &["Latitude"])?;
        lat.put_attribute("valid_range", vec![bbox.min_lat, bbox.max_lat])?;
        lat.put_attribute("standard_name", "latitude")?;
        lat.put_attribute("long_name", "Geodetic Latitude")?;
        lat.put_attribute("units", "degree_north")?;
        lat.put_attribute("_CoordinateAxisType", "Lat")?;
        lat.put_values(&round_axis(domain.lat_axis()), ..)?;

        let chunks = self.config.chunk_shape(domain.xdim(), domain.ydim());

        for spec in variable_specs(metadata.satellite) {
            debug!(variable = spec.name, "Writing variable");
            match spec.kind {
                VariableKind::Count => {
                    let data = product.count_field(spec.name).ok_or_else(|| {
                        GridProcessorError::export_failed(format!("no data for {}", spec.name))
                    })?;
                    let mut var = file.add_variable::<i32>(spec.name, &DIMS)?;
                    var.set_fill_value(FILL_COUNT)?;
                    var.set_chunking(&chunks)?;
                    if self.config.compression_level > 0 {
                        var.set_compression(self.config.compression_level as i32, self.config.shuffle)?;
                    }
                    var.put_attribute("long_name", spec.long_name.as_str())?;
                    var.put_attribute("coordinates", COORDINATES)?;
                    var.put_values(data, ..)?;
                }
                VariableKind::Float => {
                    let data = product.float_field(spec.name).ok_or_else(|| {
                        GridProcessorError::export_failed(format!("no data for {}", spec.name))
                    })?;
                    let mut var = file.add_variable::<f32>(spec.name, &DIMS)?;
                    var.set_fill_value(FILL_VALUE)?;
                    var.set_chunking(&chunks)?;
                    if self.config.compression_level > 0 {
                        var.set_compression(self.config.compression_level as i32, self.config.shuffle)?;
                    }
                    if let Some(range) = spec.valid_range {
                        var.put_attribute("valid_range", range.to_vec())?;
                    }
                    var.put_attribute("long_name", spec.long_name.as_str())?;
                    if let Some(units) = spec.units {
                        var.put_attribute("units", units)?;
                    }
                    var.put_attribute("coordinates", COORDINATES)?;
                    var.put_values(data, ..)?;
                }
            }
        }

        for (name, value) in metadata.global_attributes(domain) {
            match value {
                AttrValue::Text(s) => file.add_attribute(name, s.as_str())?,
                AttrValue::Number(v) => file.add_attribute(name, v)?,
            };
        }

        Ok(())
    }
}

/// Round coordinates to 7 decimals, ties to even.
fn round_axis(axis: Vec<f64>) -> Vec<f64> {
    axis.into_iter()
        .map(|v| (v * 1e7).round_ties_even() / 1e7)
        .collect()
}
