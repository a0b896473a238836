//! Daily Level 3 gridding engine for VIIRS aerosol retrievals.
//!
//! This crate turns per-pixel Level 2 samples into dense lat/lon grids and
//! writes the daily combined Deep Blue / Dark Target product. It enables:
//!
//! - **Binning aggregation**: count, mean, std, min, max and mean viewing
//!   angle per cell in a single O(N) pass
//! - **Product combination**: DB-preferred, DT-preferred and averaged fields
//!   from the two mean grids
//! - **Export**: compressed, chunked NetCDF-4 with CF/ACDD attributes
//!
//! # Architecture
//!
//! ```text
//! DB samples        DT samples
//!      │                 │
//!      ▼                 ▼
//! aggregate()       aggregate()
//!      │                 │
//!      └───────┬─────────┘
//!              ▼
//!      combine_products()
//!              │
//!              ▼
//!      L3Writer::write()
//!              │
//!              ▼
//!   AER_DBDT_D10KM_L3_VIIRS_*.nc
//! ```
//!
//! The aggregation and combination steps are pure and hold no global state,
//! so separate days can be processed on separate threads.
//!
//! # Example
//!
//! ```ignore
//! use grid_processor::{aggregate_samples, combine_products, GridDomain};
//! use aerosol_common::BoundingBox;
//!
//! let domain = GridDomain::new(BoundingBox::global(), 0.1)?;
//! let db = aggregate_samples(&domain, &db_samples)?;
//! let dt = aggregate_samples(&domain, &dt_samples)?;
//! let combined = combine_products(&db, &dt)?;
//! ```

pub mod aggregate;
pub mod combine;
pub mod config;
pub mod error;
pub mod types;
pub mod writer;

// Re-export commonly used types at crate root
pub use aggregate::{aggregate, aggregate_samples, GridAccumulator};
pub use combine::{combine, combine_products};
pub use config::ExportConfig;
pub use error::{GridProcessorError, Result};
pub use types::{
    is_fill, CellStats, CombinedProduct, GridDomain, GriddedProduct, EMPTY_EXTREMUM, FILL_COUNT,
    FILL_VALUE,
};
pub use writer::{DailyProduct, L3WriteResult, L3Writer, ProductMetadata};
