//! File naming and the attribute dictionary of the daily L3 product.

use aerosol_common::{ProcessingDay, Satellite};
use chrono::{DateTime, Datelike, Utc};

use crate::types::GridDomain;

/// Product version written into file names and attributes.
pub const VERSION_ID: &str = "001";

/// Collection short name, e.g. `AER_DBDT_D10KM_L3_VIIRS_SNPP`.
pub fn product_short_name(satellite: Satellite) -> String {
    format!("AER_DBDT_D10KM_L3_VIIRS_{}", satellite.archive_name())
}

/// Output file name for one day.
///
/// `AER_DBDT_D10KM_L3_VIIRS_{SAT}.{YYYYDDD}.V001.{YYYYDDDHHMMSS}.nc`, where
/// the last component is the production time in UTC.
pub fn product_file_name(
    day: ProcessingDay,
    satellite: Satellite,
    production_time: DateTime<Utc>,
) -> String {
    format!(
        "{}.{}.V{}.{}{:03}{}.nc",
        product_short_name(satellite),
        day.year_doy(),
        VERSION_ID,
        production_time.year(),
        production_time.ordinal(),
        production_time.format("%H%M%S"),
    )
}

/// A global attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Number(f64),
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Text(s)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Number(v)
    }
}

/// Storage type of a data variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// i32 sample counts.
    Count,
    /// f32 statistics.
    Float,
}

/// Name and attributes of one exported data variable.
#[derive(Debug, Clone)]
pub struct VariableSpec {
    pub name: &'static str,
    pub kind: VariableKind,
    pub long_name: String,
    pub valid_range: Option<[f32; 2]>,
    pub units: Option<&'static str>,
}

/// Axis order shared by every data variable.
pub const COORDINATES: &str = "Time Longitude Latitude";

const AOD_RANGE: [f32; 2] = [-0.05, 5.0];

const DB_AOD: &str =
    "Deep Blue/SOAR Aerosol Optical Depth (AOD) at 550 nm over land and ocean, QA-filtered";
const DT_AOD: &str = "Aerosol Optical Depth (AOD) at 0.55 micron for both ocean (Average) \
     (Quality flag = 1, 2, 3) and land (corrected) (Quality flag = 3)";

/// The ten data variables in file order.
pub fn variable_specs(satellite: Satellite) -> Vec<VariableSpec> {
    let float = |name, long_name: String, valid_range| VariableSpec {
        name,
        kind: VariableKind::Float,
        long_name,
        valid_range,
        units: None,
    };
    let count = |name, long_name: String| VariableSpec {
        name,
        kind: VariableKind::Count,
        long_name,
        valid_range: None,
        units: None,
    };

    vec![
        count(
            "DT_Number_Of_Pixels",
            format!("Number of samples for {}, for the grid", DT_AOD),
        ),
        float(
            "DT_AOD_550_AVG",
            format!("{}, mean for the grid", DT_AOD),
            Some(AOD_RANGE),
        ),
        float(
            "DT_AOD_550_STD",
            format!("{}, standard deviation for the grid", DT_AOD),
            None,
        ),
        count(
            "DB_Number_Of_Pixels",
            format!("Number of samples for {}, for the grids", DB_AOD),
        ),
        float(
            "DB_AOD_550_AVG",
            format!("{}, mean for the grid", DB_AOD),
            Some(AOD_RANGE),
        ),
        float(
            "DB_AOD_550_STD",
            format!("{}, standard deviation for the grid", DB_AOD),
            None,
        ),
        float(
            "DT_DB_AOD_550_AVG",
            "Aerosol Optical Depth (AOD) at 550 nm, derived using DT as preferred source, \
             falling back to DB if DT is invalid. Values are averaged over the grid."
                .to_string(),
            Some(AOD_RANGE),
        ),
        float(
            "DB_DT_AOD_550_AVG",
            "Aerosol Optical Depth (AOD) at 550 nm, derived using DB as preferred source, \
             falling back to DT if DB is invalid. Values are averaged over the grid."
                .to_string(),
            Some(AOD_RANGE),
        ),
        float(
            "COMBINE_AOD_550_AVG",
            "Aerosol Optical Depth (AOD) at 550 nm, combined average from DT and DB sources. \
             Values are averaged over the grid, using valid values from both DT and DB."
                .to_string(),
            Some(AOD_RANGE),
        ),
        VariableSpec {
            name: "Sensor_Zenith_Angle",
            kind: VariableKind::Float,
            long_name: format!(
                "{} VIIRS Sensor Viewing Angle, mean for the grid",
                satellite.archive_name()
            ),
            valid_range: Some([0.0, 90.0]),
            units: Some("degree"),
        },
    ]
}

fn platform_long_name(satellite: Satellite) -> &'static str {
    match satellite {
        Satellite::Snpp => "Suomi National Polar-Orbiting Partnership (SNPP)",
        Satellite::Noaa20 => "NOAA-20 (JPSS-1)",
    }
}

/// Everything the global attributes depend on besides the grid.
#[derive(Debug, Clone)]
pub struct ProductMetadata {
    pub day: ProcessingDay,
    pub satellite: Satellite,
    pub production_time: DateTime<Utc>,
    /// Deep Blue granules followed by Dark Target granules.
    pub input_files: Vec<String>,
    /// Listed granules that could not be read, in the same order.
    pub skipped_files: Vec<String>,
}

impl ProductMetadata {
    /// Output file name, also used for `GranuleID` and `product_name`.
    pub fn file_name(&self) -> String {
        product_file_name(self.day, self.satellite, self.production_time)
    }

    /// Global attributes in file order.
    pub fn global_attributes(&self, domain: &GridDomain) -> Vec<(&'static str, AttrValue)> {
        let sat = self.satellite.archive_name();
        let bbox = domain.bbox();
        let res = domain.cell_size();
        let file_name = self.file_name();
        let date = self.day.iso();
        let title = format!(
            "{} VIIRS High Resolution Level 3 daily aerosol data, {}x{} degree grid",
            sat, res, res
        );

        vec![
            (
                "description",
                format!(
                    "{} Visible Infrared Imaging Radiometer Suite (VIIRS) Deep Blue (DB) & Dark Target (DT) \
                     combined Level 3 daily aerosol data, {}x{} degree grid",
                    platform_long_name(self.satellite),
                    res,
                    res
                )
                .into(),
            ),
            (
                "comment",
                format!(
                    "Data are the arithmetic mean of all {} VIIRS Deep Blue/SOAR & Dark Target Level 2 data \
                     located in each grid element after filtering by confidence flag. The averaging is \
                     performed using different combinations and conditions on DT and DB products and \
                     derived multiple parameters.",
                    sat
                )
                .into(),
            ),
            ("references", "https://doi.org/10.3390/rs12172847".into()),
            (
                "institution",
                "Biospheric Sciences Laboratory, NASA Goddard Space Flight Center".into(),
            ),
            ("LongName", title.clone().into()),
            (
                "ProductionDateTime",
                self.production_time
                    .format("%Y-%m-%dT%H:%M:%S%.6fZ")
                    .to_string()
                    .into(),
            ),
            ("NorthernmostLatitude", bbox.max_lat.into()),
            ("WesternmostLongitude", bbox.min_lon.into()),
            ("SouthernmostLatitude", bbox.min_lat.into()),
            ("EasternmostLongitude", bbox.max_lon.into()),
            ("latitude_resolution", res.into()),
            ("longitude_resolution", res.into()),
            (
                "related_url",
                "https://deepblue.gsfc.nasa.gov & https://darktarget.gsfc.nasa.gov/".into(),
            ),
            (
                "keywords",
                "aerosol optical depth, thickness, land, ocean, high resolution, gridded, viirs".into(),
            ),
            ("data_set_language", "en".into()),
            ("Format", "NetCDF4".into()),
            ("ProcessingLevel", "Level 3".into()),
            (
                "keywords_vocabulary",
                "NASA Global Change Master Directory (GCMD) Science Keywords".into(),
            ),
            (
                "license",
                "http://science.nasa.gov/earth-science/earth-science-data/data-information-policy/".into(),
            ),
            (
                "stdname_vocabulary",
                "NetCDF Climate and Forecast (CF) Metadata Convention".into(),
            ),
            ("VersionID", VERSION_ID.into()),
            ("pge_version", VERSION_ID.into()),
            ("title", title.into()),
            ("DayNightFlag", "Day".into()),
            ("GranuleID", file_name.clone().into()),
            ("platform", self.satellite.platform().into()),
            ("instrument", "VIIRS".into()),
            ("Conventions", "CF-1.7, ACDD-1.3".into()),
            ("history", "".into()),
            ("RangeBeginningDate", date.clone().into()),
            ("RangeBeginningTime", "00:00:00.000000".into()),
            ("RangeEndingDate", date.into()),
            ("RangeEndingTime", "23:59:59.000000".into()),
            ("source", "AERDB_L2 2.0.2,AERDT_L2 2.0.2".into()),
            (
                "date_created",
                self.production_time
                    .format("%Y-%m-%dT%H:%M:%SZ")
                    .to_string()
                    .into(),
            ),
            ("product_name", file_name.into()),
            ("ShortName", product_short_name(self.satellite).into()),
            ("product_version", "1.0".into()),
            ("AlgorithmType", "OPS".into()),
            (
                "IdentifierProductDOI",
                format!("10.5067/VIIRS/{}.{}", product_short_name(self.satellite), VERSION_ID).into(),
            ),
            ("IdentifierProductDOIAuthority", "https://www.doi.org/".into()),
            ("input_files", self.input_files.join(", ").into()),
            ("skipped_input_files", self.skipped_files.join(", ").into()),
            ("ancillary_files", "".into()),
            ("DataCenterId", "GES-DISC".into()),
            ("project", "NASA Terra, Aqua and SNPP ROSES 2016".into()),
            ("creator_name", "Pawan Gupta".into()),
            (
                "creator_url",
                "https://science.gsfc.nasa.gov/sci/bio/pawan.gupta".into(),
            ),
            ("creator_email", "pawan.gupta@nasa.gov".into()),
            (
                "creator_institution",
                "Biospheric Sciences Laboratory, NASA Goddard Space Flight Center".into(),
            ),
            (
                "publisher_institution",
                "NASA Goddard Earth Sciences (GES) Data and Information Services Center (DISC)".into(),
            ),
            (
                "DataSetQuality",
                "The gridded data are validated against AERONET measurements and found comparable \
                 in quality as level 2 original dataset"
                    .into(),
            ),
        ]
    }
}
