//! NetCDF parser for VIIRS Level 2 aerosol granules.
//!
//! Reads the Deep Blue (AERDB) and Dark Target (AERDT) swath products into
//! [`SampleStream`](aerosol_common::SampleStream)s ready for gridding.
//!
//! # Granule layout
//!
//! AERDB keeps AOD, latitude, longitude and viewing zenith angle at the root.
//! AERDT splits them between the `geophysical_data` and `geolocation_data`
//! groups and packs AOD and angles as scaled integers. Both are unpacked to
//! `f32` with fill values mapped to NaN, then flattened.

pub mod error;
pub mod granule;
pub mod native;

pub use error::{NetCdfError, NetCdfResult};
pub use granule::{read_granule_bytes, read_granule_file, GranuleSchema};
pub use native::silence_hdf5_errors;
