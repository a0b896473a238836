//! Run configuration for the gridder.
//!
//! Values come from three layers, later ones winning: built-in defaults
//! (or a `--config` YAML/JSON file), environment variables, then CLI flags.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use aerosol_common::{AerosolError, BoundingBox, DateRange, Satellite};
use grid_processor::{ExportConfig, GridDomain};

use crate::archive::DEFAULT_ARCHIVE_URL;
use crate::credentials::{EarthdataLogin, Secret};
use crate::logging::LogFormat;

#[derive(Parser, Debug)]
#[command(name = "gridder")]
#[command(about = "Daily Level 3 gridding of VIIRS Deep Blue and Dark Target aerosol retrievals")]
pub struct Args {
    /// YAML or JSON file with run parameters
    #[arg(short, long, env = "GRIDDER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Grid cell size in degrees [default: 0.1]
    #[arg(long)]
    pub grid_size: Option<f64>,

    /// First day to process, YYYYMMDD or YYYYDDD [default: 20240101]
    #[arg(long)]
    pub start_date: Option<String>,

    /// Last day to process (inclusive) [default: 20240105]
    #[arg(long)]
    pub end_date: Option<String>,

    /// Directory for daily NetCDF files [default: ./output]
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Domain as min_lon,min_lat,max_lon,max_lat; single-bound flags take precedence
    #[arg(long, allow_hyphen_values = true, value_parser = parse_bbox)]
    pub bbox: Option<BoundingBox>,

    #[arg(long, allow_hyphen_values = true)]
    pub min_lon: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    pub max_lon: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    pub min_lat: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    pub max_lat: Option<f64>,

    /// Days processed concurrently [default: 4]
    #[arg(short = 'j', long)]
    pub num_workers: Option<usize>,

    /// Platform: snpp or noaa20 [default: snpp]
    #[arg(long)]
    pub satellite: Option<Satellite>,

    /// Smallest AOD kept [default: -0.05]
    #[arg(long, allow_hyphen_values = true)]
    pub min_value: Option<f32>,

    /// Largest AOD kept [default: 5.0]
    #[arg(long, allow_hyphen_values = true)]
    pub max_value: Option<f32>,

    /// Base URL of the LAADS archive listing
    #[arg(long, env = "LAADS_ARCHIVE_URL")]
    pub archive_url: Option<String>,

    #[arg(long, env = "EARTHDATA_USERNAME")]
    pub earthdata_username: Option<String>,

    #[arg(long, env = "EARTHDATA_PASSWORD", hide_env_values = true)]
    pub earthdata_password: Option<String>,

    /// Read granules from {dir}/{collection}/{year}/{doy}/ instead of the archive
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Deflate level 0-9 [default: 6]
    #[arg(long)]
    pub compression_level: Option<u8>,

    /// Log level
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Also write the run log to a file in this directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

fn parse_bbox(s: &str) -> Result<BoundingBox, String> {
    BoundingBox::from_str_list(s).map_err(|e| e.to_string())
}

/// Resolved parameters for one gridding run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Cell size in degrees.
    pub grid_size: f64,
    pub start_date: String,
    pub end_date: String,
    pub output_dir: PathBuf,
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
    /// Days processed concurrently.
    pub num_workers: usize,
    pub satellite: Satellite,
    /// Inclusive AOD range kept before gridding.
    pub min_value: f32,
    pub max_value: f32,
    pub archive_url: String,
    pub earthdata_username: Option<String>,
    #[serde(skip_serializing)]
    pub earthdata_password: Option<Secret>,
    /// Local granule tree; bypasses listing and credentials when set.
    pub input_dir: Option<PathBuf>,
    pub export: ExportConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            grid_size: 0.1,
            start_date: "20240101".to_string(),
            end_date: "20240105".to_string(),
            output_dir: PathBuf::from("./output"),
            min_lon: -180.0,
            max_lon: 180.0,
            min_lat: -90.0,
            max_lat: 90.0,
            num_workers: 4,
            satellite: Satellite::Snpp,
            min_value: -0.05,
            max_value: 5.0,
            archive_url: DEFAULT_ARCHIVE_URL.to_string(),
            earthdata_username: None,
            earthdata_password: None,
            input_dir: None,
            export: ExportConfig::default(),
        }
    }
}

impl RunConfig {
    /// Build the configuration for a CLI invocation and validate it.
    pub fn load(args: &Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self {
                export: ExportConfig::from_env(),
                ..Default::default()
            },
        };

        config.apply_args(args);
        config.validate().map_err(|e| anyhow!("Invalid configuration: {}", e))?;
        Ok(config)
    }

    /// Load from a file; `.json` is parsed as JSON, anything else as YAML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        }
    }

    /// Overlay every flag that was given.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(v) = args.grid_size {
            self.grid_size = v;
        }
        if let Some(v) = &args.start_date {
            self.start_date = v.clone();
        }
        if let Some(v) = &args.end_date {
            self.end_date = v.clone();
        }
        if let Some(v) = &args.output_dir {
            self.output_dir = v.clone();
        }
        if let Some(bbox) = args.bbox {
            self.min_lon = bbox.min_lon;
            self.min_lat = bbox.min_lat;
            self.max_lon = bbox.max_lon;
            self.max_lat = bbox.max_lat;
        }
        if let Some(v) = args.min_lon {
            self.min_lon = v;
        }
        if let Some(v) = args.max_lon {
            self.max_lon = v;
        }
        if let Some(v) = args.min_lat {
            self.min_lat = v;
        }
        if let Some(v) = args.max_lat {
            self.max_lat = v;
        }
        if let Some(v) = args.num_workers {
            self.num_workers = v;
        }
        if let Some(v) = args.satellite {
            self.satellite = v;
        }
        if let Some(v) = args.min_value {
            self.min_value = v;
        }
        if let Some(v) = args.max_value {
            self.max_value = v;
        }
        if let Some(v) = &args.archive_url {
            self.archive_url = v.clone();
        }
        if let Some(v) = &args.earthdata_username {
            self.earthdata_username = Some(v.clone());
        }
        if let Some(v) = &args.earthdata_password {
            self.earthdata_password = Some(Secret::new(v.clone()));
        }
        if let Some(v) = &args.input_dir {
            self.input_dir = Some(v.clone());
        }
        if let Some(v) = args.compression_level {
            self.export.compression_level = v;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.grid_size.is_finite() && self.grid_size > 0.0) {
            return Err(AerosolError::invalid_parameter(
                "grid_size",
                format!("must be > 0, got {}", self.grid_size),
            )
            .to_string());
        }

        self.bbox().validate().map_err(|e| e.to_string())?;
        self.domain().map_err(|e| e.to_string())?;

        if self.num_workers == 0 {
            return Err(AerosolError::invalid_parameter("num_workers", "must be > 0").to_string());
        }

        self.date_range().map_err(|e| e.to_string())?;

        if !(self.min_value.is_finite() && self.max_value.is_finite())
            || self.min_value >= self.max_value
        {
            return Err(AerosolError::invalid_parameter(
                "min_value/max_value",
                format!(
                    "need finite min < max, got [{}, {}]",
                    self.min_value, self.max_value
                ),
            )
            .to_string());
        }

        self.export.validate()?;

        if self.input_dir.is_none() && self.login().is_none() {
            return Err(
                "Earthdata credentials are required (EARTHDATA_USERNAME / EARTHDATA_PASSWORD) unless --input-dir is set"
                    .to_string(),
            );
        }

        Ok(())
    }

    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(self.min_lon, self.min_lat, self.max_lon, self.max_lat)
    }

    pub fn domain(&self) -> grid_processor::Result<GridDomain> {
        GridDomain::new(self.bbox(), self.grid_size)
    }

    pub fn date_range(&self) -> aerosol_common::AerosolResult<DateRange> {
        DateRange::parse(&self.start_date, &self.end_date)
    }

    /// Earthdata login, if both parts are present and non-empty.
    pub fn login(&self) -> Option<EarthdataLogin> {
        match (&self.earthdata_username, &self.earthdata_password) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Some(EarthdataLogin {
                    username: username.clone(),
                    password: password.clone(),
                })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline() -> RunConfig {
        RunConfig {
            input_dir: Some(PathBuf::from("/data/l2")),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_run_parameters() {
        let config = RunConfig::default();
        assert_eq!(config.grid_size, 0.1);
        assert_eq!(config.start_date, "20240101");
        assert_eq!(config.end_date, "20240105");
        assert_eq!(config.num_workers, 4);
        assert_eq!(config.bbox(), BoundingBox::global());
        assert_eq!(config.min_value, -0.05);
        assert_eq!(config.max_value, 5.0);
        assert_eq!(config.date_range().unwrap().len(), 5);
    }

    #[test]
    fn test_offline_config_needs_no_credentials() {
        assert!(offline().validate().is_ok());
    }

    #[test]
    fn test_archive_config_requires_credentials() {
        let mut config = RunConfig::default();
        assert!(config.validate().unwrap_err().contains("credentials"));

        config.earthdata_username = Some("user".into());
        config.earthdata_password = Some(Secret::new(""));
        assert!(config.validate().is_err());

        config.earthdata_password = Some(Secret::new("pass"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let cases: Vec<Box<dyn Fn(&mut RunConfig)>> = vec![
            Box::new(|c| c.grid_size = 0.0),
            Box::new(|c| c.grid_size = -0.1),
            Box::new(|c| c.grid_size = f64::NAN),
            Box::new(|c| {
                c.min_lon = 10.0;
                c.max_lon = 5.0;
            }),
            Box::new(|c| {
                c.min_lat = 30.0;
                c.max_lat = 30.0;
            }),
            Box::new(|c| c.num_workers = 0),
            Box::new(|c| c.start_date = "20240110".into()),
            Box::new(|c| c.end_date = "2024-01-05".into()),
            Box::new(|c| c.min_value = 6.0),
            Box::new(|c| c.max_value = f32::INFINITY),
            Box::new(|c| c.export.compression_level = 10),
        ];

        for (i, mutate) in cases.iter().enumerate() {
            let mut config = offline();
            mutate(&mut config);
            assert!(config.validate().is_err(), "case {} should be rejected", i);
        }
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.yaml");
        std::fs::write(
            &path,
            "grid_size: 0.25\nstart_date: \"20230301\"\nend_date: \"20230302\"\nnum_workers: 2\nsatellite: noaa20\ninput_dir: /data/l2\nexport:\n  compression_level: 4\n",
        )
        .unwrap();

        let args = Args::parse_from([
            "gridder",
            "--config",
            path.to_str().unwrap(),
            "--num-workers",
            "8",
            "--min-lon",
            "-20",
            "--max-lon",
            "60",
        ]);
        let config = RunConfig::load(&args).unwrap();

        assert_eq!(config.grid_size, 0.25);
        assert_eq!(config.start_date, "20230301");
        assert_eq!(config.num_workers, 8);
        assert_eq!(config.satellite, Satellite::Noaa20);
        assert_eq!(config.min_lon, -20.0);
        assert_eq!(config.max_lon, 60.0);
        assert_eq!(config.export.compression_level, 4);
        assert!(config.export.shuffle);
    }

    #[test]
    fn test_bbox_flag_and_single_bound_override() {
        let args = Args::parse_from([
            "gridder",
            "--input-dir",
            "/data/l2",
            "--bbox=-17,10,35,35",
            "--max-lat",
            "30",
        ]);
        let config = RunConfig::load(&args).unwrap();
        assert_eq!(config.bbox(), BoundingBox::new(-17.0, 10.0, 35.0, 30.0));

        assert!(Args::try_parse_from(["gridder", "--bbox", "1,2,3"]).is_err());
    }

    #[test]
    fn test_json_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(
            &path,
            r#"{"grid_size": 1.0, "min_value": 0.0, "max_value": 3.0, "input_dir": "/data/l2"}"#,
        )
        .unwrap();

        let config = RunConfig::from_file(&path).unwrap();
        assert_eq!(config.grid_size, 1.0);
        assert_eq!(config.max_value, 3.0);
        assert_eq!(config.num_workers, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_password_is_not_serialized() {
        let config = RunConfig {
            earthdata_username: Some("user".into()),
            earthdata_password: Some(Secret::new("hunter2")),
            ..Default::default()
        };
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("user"));
        assert!(!yaml.contains("hunter2"));
        assert!(!format!("{:?}", config).contains("hunter2"));
    }
}
