//! Readers for VIIRS Level 2 aerosol granules (AERDB and AERDT).

use std::path::Path;

use aerosol_common::{Product, SampleStream};
use tracing::debug;

use crate::error::{NetCdfError, NetCdfResult};
use crate::native::{open, read_unpacked, silence_hdf5_errors, with_temp_file};

/// Where a product keeps its four per-pixel fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GranuleSchema {
    /// Group holding the AOD variable, `None` for the root group.
    pub value_group: Option<&'static str>,
    /// Group holding the geolocation variables, `None` for the root group.
    pub geo_group: Option<&'static str>,
    pub value: &'static str,
    pub lat: &'static str,
    pub lon: &'static str,
    pub angle: &'static str,
}

impl GranuleSchema {
    /// Deep Blue: everything at the root.
    pub const DEEP_BLUE: GranuleSchema = GranuleSchema {
        value_group: None,
        geo_group: None,
        value: "Aerosol_Optical_Thickness_550_Land_Ocean_Best_Estimate",
        lat: "Latitude",
        lon: "Longitude",
        angle: "Viewing_Zenith_Angle",
    };

    /// Dark Target: AOD under `geophysical_data`, geolocation under
    /// `geolocation_data`.
    pub const DARK_TARGET: GranuleSchema = GranuleSchema {
        value_group: Some("geophysical_data"),
        geo_group: Some("geolocation_data"),
        value: "Optical_Depth_Land_And_Ocean",
        lat: "latitude",
        lon: "longitude",
        angle: "sensor_zenith_angle",
    };

    pub fn for_product(product: Product) -> Self {
        match product {
            Product::DeepBlue => Self::DEEP_BLUE,
            Product::DarkTarget => Self::DARK_TARGET,
        }
    }
}

/// Read one granule from a path.
///
/// Samples whose value, latitude or longitude is missing are dropped. The
/// viewing angle is carried through unchecked.
pub fn read_granule_file(path: &Path, product: Product) -> NetCdfResult<SampleStream> {
    silence_hdf5_errors();

    let file = open(path)?;
    let schema = GranuleSchema::for_product(product);

    let values = read_field(&file, schema.value_group, schema.value)?;
    let lats = read_field(&file, schema.geo_group, schema.lat)?;
    let lons = read_field(&file, schema.geo_group, schema.lon)?;
    let angles = read_field(&file, schema.geo_group, schema.angle)?;

    let n = values.len();
    if lats.len() != n || lons.len() != n || angles.len() != n {
        return Err(NetCdfError::InvalidFormat(format!(
            "{} fields differ in size: {}={}, {}={}, {}={}, {}={}",
            product,
            schema.value,
            n,
            schema.lat,
            lats.len(),
            schema.lon,
            lons.len(),
            schema.angle,
            angles.len()
        )));
    }

    let mut samples = SampleStream::with_capacity(n);
    for k in 0..n {
        if values[k].is_finite() && lats[k].is_finite() && lons[k].is_finite() {
            samples.push(values[k], lats[k], lons[k], angles[k]);
        }
    }

    debug!(
        product = %product,
        pixels = n,
        retained = samples.len(),
        "Read granule"
    );

    Ok(samples)
}

/// Read one granule held in memory.
pub fn read_granule_bytes(data: &[u8], product: Product) -> NetCdfResult<SampleStream> {
    with_temp_file(data, |path| read_granule_file(path, product))
}

fn read_field(file: &netcdf::File, group: Option<&str>, name: &str) -> NetCdfResult<Vec<f32>> {
    match group {
        None => {
            let var = file
                .variable(name)
                .ok_or_else(|| NetCdfError::MissingData(format!("{} variable", name)))?;
            read_unpacked(&var)
        }
        Some(group_name) => {
            let group = file
                .group(group_name)?
                .ok_or_else(|| NetCdfError::MissingData(format!("{} group", group_name)))?;
            let var = group.variable(name).ok_or_else(|| {
                NetCdfError::MissingData(format!("{}/{} variable", group_name, name))
            })?;
            read_unpacked(&var)
        }
    }
}
