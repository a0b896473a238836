//! Aerosol retrieval products and the platforms that carry VIIRS.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::AerosolError;

/// One of the two independently derived Level 2 aerosol products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Product {
    /// Deep Blue / SOAR (AERDB).
    DeepBlue,
    /// Dark Target (AERDT).
    DarkTarget,
}

impl Product {
    /// Archive product prefix, e.g. "AERDB".
    pub fn code(&self) -> &'static str {
        match self {
            Product::DeepBlue => "AERDB",
            Product::DarkTarget => "AERDT",
        }
    }

    /// Short label used in output variable names, e.g. "DB".
    pub fn label(&self) -> &'static str {
        match self {
            Product::DeepBlue => "DB",
            Product::DarkTarget => "DT",
        }
    }

    /// Archive collection name for this product on a platform,
    /// e.g. "AERDB_L2_VIIRS_SNPP".
    pub fn collection(&self, satellite: Satellite) -> String {
        format!("{}_L2_VIIRS_{}", self.code(), satellite.archive_name())
    }

    /// Both products in processing order.
    pub fn all() -> [Product; 2] {
        [Product::DeepBlue, Product::DarkTarget]
    }
}

impl std::fmt::Display for Product {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Product {
    type Err = AerosolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "AERDB" | "DB" => Ok(Product::DeepBlue),
            "AERDT" | "DT" => Ok(Product::DarkTarget),
            _ => Err(AerosolError::UnknownProduct(s.to_string())),
        }
    }
}

/// Platform carrying the VIIRS instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Satellite {
    /// Suomi National Polar-orbiting Partnership.
    #[default]
    Snpp,
    /// NOAA-20 (JPSS-1).
    Noaa20,
}

impl Satellite {
    /// Name used in archive collection paths and output file names.
    pub fn archive_name(&self) -> &'static str {
        match self {
            Satellite::Snpp => "SNPP",
            Satellite::Noaa20 => "NOAA20",
        }
    }

    /// Platform name for the `platform` global attribute.
    pub fn platform(&self) -> &'static str {
        match self {
            Satellite::Snpp => "Suomi-NPP",
            Satellite::Noaa20 => "NOAA-20",
        }
    }
}

impl std::fmt::Display for Satellite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.archive_name())
    }
}

impl FromStr for Satellite {
    type Err = AerosolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "snpp" | "suominpp" => Ok(Satellite::Snpp),
            "noaa20" | "jpss1" => Ok(Satellite::Noaa20),
            _ => Err(AerosolError::UnknownSatellite(s.to_string())),
        }
    }
}
