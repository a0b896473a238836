//! Common types and utilities shared across the aerosol gridding workspace.

pub mod bbox;
pub mod error;
pub mod product;
pub mod samples;
pub mod time;

pub use bbox::BoundingBox;
pub use error::{AerosolError, AerosolResult};
pub use product::{Product, Satellite};
pub use samples::SampleStream;
pub use time::{DateRange, ProcessingDay};
