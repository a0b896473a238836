//! NetCDF writer for the daily Level 3 product.
//!
//! The file holds both per-product grids and the three combined fields on a
//! `Time x Longitude x Latitude` lattice, with the product's naming and
//! attribute conventions.

pub mod metadata;
mod netcdf_writer;

pub use metadata::{product_file_name, product_short_name, AttrValue, ProductMetadata};
pub use netcdf_writer::{DailyProduct, L3WriteResult, L3Writer};
