//! Common test fixtures: domains, synthetic Level 2 granules and archive
//! listings.

use std::path::{Path, PathBuf};

use aerosol_common::SampleStream;

/// Common bounding boxes as `(min_lon, min_lat, max_lon, max_lat)`.
pub mod bbox {
    /// Global bounding box.
    pub const GLOBAL: (f64, f64, f64, f64) = (-180.0, -90.0, 180.0, 90.0);

    /// Sahara and the Sahel, a dust hot spot with dense DB coverage.
    pub const SAHARA: (f64, f64, f64, f64) = (-17.0, 10.0, 35.0, 35.0);

    /// A 2x2 degree box cut into 3x3 cells at 1 degree.
    pub const UNIT: (f64, f64, f64, f64) = (0.0, 0.0, 2.0, 2.0);
}

/// Raw fill value of synthetic DB floats and all geolocation floats.
pub const GRANULE_FLOAT_FILL: f32 = -999.0;

/// Raw fill value of synthetic DT packed integers.
pub const GRANULE_PACKED_FILL: i16 = -9999;

/// Scale factor of the synthetic DT AOD.
pub const DT_AOD_SCALE: f32 = 0.001;

/// Scale factor of the synthetic DT zenith angle.
pub const DT_ANGLE_SCALE: f32 = 0.01;

/// Split `n` samples into a 2-D `(rows, cols)` swath when possible.
fn swath_shape(n: usize) -> (usize, usize) {
    if n >= 4 && n % 2 == 0 {
        (2, n / 2)
    } else {
        (1, n.max(1))
    }
}

fn float_or_fill(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        GRANULE_FLOAT_FILL
    }
}

fn pack(v: f32, scale: f32) -> i16 {
    if v.is_finite() {
        (v / scale).round() as i16
    } else {
        GRANULE_PACKED_FILL
    }
}

/// Write a Deep Blue style granule: all variables at the root.
///
/// Non-finite entries in `samples` are stored as the float fill value.
pub fn write_db_granule(path: &Path, samples: &SampleStream) -> Result<(), netcdf::Error> {
    let (rows, cols) = swath_shape(samples.len());
    let pad = rows * cols - samples.len();

    let mut file = netcdf::create(path)?;
    file.add_dimension("Idx_Atrack", rows)?;
    file.add_dimension("Idx_Xtrack", cols)?;
    let dims = ["Idx_Atrack", "Idx_Xtrack"];

    for (name, data) in [
        (
            "Aerosol_Optical_Thickness_550_Land_Ocean_Best_Estimate",
            samples.values(),
        ),
        ("Latitude", samples.lats()),
        ("Longitude", samples.lons()),
        ("Viewing_Zenith_Angle", samples.angles()),
    ] {
        let mut values: Vec<f32> = data.iter().copied().map(float_or_fill).collect();
        values.extend(std::iter::repeat(GRANULE_FLOAT_FILL).take(pad));

        let mut var = file.add_variable::<f32>(name, &dims)?;
        var.set_fill_value(GRANULE_FLOAT_FILL)?;
        var.put_values(&values, ..)?;
    }

    file.add_attribute("title", "VIIRS/SNPP Deep Blue Aerosol L2 6-Min Swath 6 km")?;
    Ok(())
}

/// Write a Dark Target style granule with `geophysical_data` and
/// `geolocation_data` groups.
///
/// AOD and zenith angle are packed as scaled i16, geolocation as f32.
pub fn write_dt_granule(path: &Path, samples: &SampleStream) -> Result<(), netcdf::Error> {
    let (rows, cols) = swath_shape(samples.len());
    let pad = rows * cols - samples.len();
    let dims = ["number_of_lines", "number_of_pixels"];

    let mut file = netcdf::create(path)?;
    file.add_attribute("title", "VIIRS/SNPP Dark Target Aerosol L2 6-Min Swath 6 km")?;

    {
        let mut geo = file.add_group("geolocation_data")?;
        geo.add_dimension(dims[0], rows)?;
        geo.add_dimension(dims[1], cols)?;

        for (name, data) in [("latitude", samples.lats()), ("longitude", samples.lons())] {
            let mut values: Vec<f32> = data.iter().copied().map(float_or_fill).collect();
            values.extend(std::iter::repeat(GRANULE_FLOAT_FILL).take(pad));

            let mut var = geo.add_variable::<f32>(name, &dims)?;
            var.set_fill_value(GRANULE_FLOAT_FILL)?;
            var.put_values(&values, ..)?;
        }

        let mut angles: Vec<i16> = samples
            .angles()
            .iter()
            .map(|&v| pack(v, DT_ANGLE_SCALE))
            .collect();
        angles.extend(std::iter::repeat(GRANULE_PACKED_FILL).take(pad));

        let mut var = geo.add_variable::<i16>("sensor_zenith_angle", &dims)?;
        var.set_fill_value(GRANULE_PACKED_FILL)?;
        var.put_attribute("scale_factor", DT_ANGLE_SCALE)?;
        var.put_attribute("add_offset", 0.0f32)?;
        var.put_values(&angles, ..)?;
    }

    {
        let mut phys = file.add_group("geophysical_data")?;
        phys.add_dimension(dims[0], rows)?;
        phys.add_dimension(dims[1], cols)?;

        let mut aod: Vec<i16> = samples
            .values()
            .iter()
            .map(|&v| pack(v, DT_AOD_SCALE))
            .collect();
        aod.extend(std::iter::repeat(GRANULE_PACKED_FILL).take(pad));

        let mut var = phys.add_variable::<i16>("Optical_Depth_Land_And_Ocean", &dims)?;
        var.set_fill_value(GRANULE_PACKED_FILL)?;
        var.put_attribute("scale_factor", DT_AOD_SCALE)?;
        var.put_attribute("add_offset", 0.0f32)?;
        var.put_values(&aod, ..)?;
    }

    Ok(())
}

/// Granule file name in the archive's naming scheme.
pub fn granule_name(collection: &str, year_doy: &str, hhmm: &str) -> String {
    format!("{}.A{}.{}.002.2023100000000.nc", collection, year_doy, hhmm)
}

/// Path of a granule in a local archive: `{root}/{collection}/{year}/{doy}/{name}`.
pub fn local_granule_path(root: &Path, collection: &str, year_doy: &str, name: &str) -> PathBuf {
    let (year, doy) = year_doy.split_at(4);
    root.join(collection).join(year).join(doy).join(name)
}

/// An HTML directory listing in the style of the LAADS archive pages.
///
/// Every file is linked twice (name column and download link), along with
/// navigation links that must be ignored.
pub fn archive_listing_html(collection: &str, year_doy: &str, files: &[&str]) -> String {
    let (year, doy) = year_doy.split_at(4);
    let base = format!("/archive/allData/5200/{}/{}/{}", collection, year, doy);

    let mut html = String::from("<!DOCTYPE html>\n<html>\n<head><title>Index</title></head>\n<body>\n");
    html.push_str("<a href=\"/archive/allData/5200/\">Parent Directory</a>\n");
    html.push_str("<table>\n");
    for file in files {
        html.push_str(&format!(
            "<tr><td><a href=\"{base}/{file}\">{file}</a></td>\n<td><a class=\"dl\" href=\"{file}\">download</a></td></tr>\n",
        ));
    }
    html.push_str(&format!(
        "<tr><td><a href=\"{base}/{year_doy}.json\">metadata</a></td></tr>\n",
    ));
    html.push_str("</table>\n</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swath_shape() {
        assert_eq!(swath_shape(0), (1, 1));
        assert_eq!(swath_shape(3), (1, 3));
        assert_eq!(swath_shape(8), (2, 4));
    }

    #[test]
    fn test_pack() {
        assert_eq!(pack(0.25, DT_AOD_SCALE), 250);
        assert_eq!(pack(f32::NAN, DT_AOD_SCALE), GRANULE_PACKED_FILL);
    }

    #[test]
    fn test_granule_name_and_path() {
        let name = granule_name("AERDB_L2_VIIRS_SNPP", "2022205", "0012");
        assert_eq!(name, "AERDB_L2_VIIRS_SNPP.A2022205.0012.002.2023100000000.nc");

        let path = local_granule_path(Path::new("/data"), "AERDB_L2_VIIRS_SNPP", "2022205", &name);
        assert_eq!(
            path,
            PathBuf::from("/data/AERDB_L2_VIIRS_SNPP/2022/205").join(&name)
        );
    }

    #[test]
    fn test_archive_listing_html_links_files() {
        let html = archive_listing_html("AERDB_L2_VIIRS_SNPP", "2022205", &["a.nc", "b.nc"]);
        assert_eq!(html.matches("a.nc").count(), 3);
        assert!(html.contains("2022205.json"));
    }
}
