//! Read synthetic AERDB/AERDT granules back into sample streams.

use aerosol_common::{Product, SampleStream};
use netcdf_parser::{read_granule_bytes, read_granule_file, NetCdfError};
use test_utils::{assert_approx_eq, require_test_file, write_db_granule, write_dt_granule};

fn swath() -> SampleStream {
    let mut samples = SampleStream::new();
    samples.push(0.25, 10.0, 20.0, 12.5);
    samples.push(f32::NAN, 10.1, 20.1, 13.0);
    samples.push(1.5, f32::NAN, 20.2, 14.0);
    samples.push(-0.04, 10.3, 20.3, 15.25);
    samples.push(3.0, 10.4, f32::NAN, 16.0);
    samples.push(0.8, -45.5, 170.0, f32::NAN);
    samples
}

#[test]
fn test_read_deep_blue_granule() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("AERDB_L2_VIIRS_SNPP.A2022205.0000.002.nc");
    write_db_granule(&path, &swath()).unwrap();

    let samples = read_granule_file(&path, Product::DeepBlue).unwrap();

    // Rows with a missing value, latitude or longitude are dropped.
    assert_eq!(samples.len(), 3);
    assert_eq!(samples.values(), &[0.25, -0.04, 0.8]);
    assert_eq!(samples.lats(), &[10.0, 10.3, -45.5]);
    assert_eq!(samples.lons(), &[20.0, 20.3, 170.0]);
    assert_eq!(samples.angles()[0], 12.5);
    // The angle is not checked.
    assert!(samples.angles()[2].is_nan());
}

#[test]
fn test_read_dark_target_granule_unpacks_scaled_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("AERDT_L2_VIIRS_SNPP.A2022205.0000.002.nc");
    write_dt_granule(&path, &swath()).unwrap();

    let samples = read_granule_file(&path, Product::DarkTarget).unwrap();

    assert_eq!(samples.len(), 3);
    assert_approx_eq!(samples.values()[0], 0.25, 1e-6);
    assert_approx_eq!(samples.values()[1], -0.04, 1e-6);
    assert_approx_eq!(samples.values()[2], 0.8, 1e-6);
    assert_approx_eq!(samples.angles()[1], 15.25, 1e-4);
    assert_eq!(samples.lats()[2], -45.5);
}

#[test]
fn test_read_from_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.nc");
    write_db_granule(&path, &swath()).unwrap();
    let bytes = std::fs::read(&path).unwrap();

    let samples = read_granule_bytes(&bytes, Product::DeepBlue).unwrap();
    assert_eq!(samples.len(), 3);
}

#[test]
fn test_wrong_schema_is_missing_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.nc");
    write_db_granule(&path, &swath()).unwrap();

    let err = read_granule_file(&path, Product::DarkTarget).unwrap_err();
    assert!(matches!(err, NetCdfError::MissingData(_)));
}

#[test]
fn test_garbage_bytes_are_invalid_format() {
    let err = read_granule_bytes(b"this is not hdf5", Product::DeepBlue).unwrap_err();
    assert!(matches!(err, NetCdfError::InvalidFormat(_)));
}

#[test]
fn test_real_deep_blue_granule() {
    let path = require_test_file!("AERDB_L2_VIIRS_SNPP.sample.nc");
    let samples = read_granule_file(&path, Product::DeepBlue).unwrap();
    assert!(!samples.is_empty());
    assert!(samples.values().iter().all(|v| v.is_finite()));
    assert!(samples.lats().iter().all(|v| (-90.0..=90.0).contains(v)));
}
