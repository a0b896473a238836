//! Core types for grid processing.

use aerosol_common::BoundingBox;
use serde::{Deserialize, Serialize};

use crate::error::{GridProcessorError, Result};

/// Fill value for every floating-point statistic of an empty cell.
pub const FILL_VALUE: f32 = -999.0;

/// Fill value for the sample count of an empty cell.
pub const FILL_COUNT: i32 = -999;

/// Reported min and max of an empty cell.
pub const EMPTY_EXTREMUM: f32 = -1.0;

/// True if `v` is the floating-point fill sentinel.
#[inline]
pub fn is_fill(v: f32) -> bool {
    v == FILL_VALUE
}

/// A regular lat/lon lattice: a closed bounding box cut into square cells.
///
/// Cells are addressed `(i, j)` with `i` along longitude and `j` along
/// latitude, stored flat at `i * ydim + j`.
///
/// Serialized as `{bbox, cell_size}`; the dims are always recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DomainSpec", into = "DomainSpec")]
pub struct GridDomain {
    bbox: BoundingBox,
    cell_size: f64,
    xdim: usize,
    ydim: usize,
}

impl GridDomain {
    /// Create a domain, rejecting a bad box or cell size.
    ///
    /// `xdim = round(1 + width / cell_size)` and likewise for `ydim`, with
    /// ties rounded to even.
    pub fn new(bbox: BoundingBox, cell_size: f64) -> Result<Self> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(GridProcessorError::InvalidCellSize(cell_size));
        }
        bbox.validate()
            .map_err(|e| GridProcessorError::invalid_domain(e.to_string()))?;

        let xdim = (1.0 + bbox.width() / cell_size).round_ties_even();
        let ydim = (1.0 + bbox.height() / cell_size).round_ties_even();
        if !(xdim.is_finite() && ydim.is_finite()) || xdim * ydim > usize::MAX as f64 {
            return Err(GridProcessorError::invalid_domain(format!(
                "{} at cell size {} is too large",
                bbox, cell_size
            )));
        }

        Ok(Self {
            bbox,
            cell_size,
            xdim: xdim as usize,
            ydim: ydim as usize,
        })
    }

    /// Create a domain from limits in `[min_lat, max_lat, min_lon, max_lon]` order.
    pub fn from_limits(
        min_lat: f64,
        max_lat: f64,
        min_lon: f64,
        max_lon: f64,
        cell_size: f64,
    ) -> Result<Self> {
        Self::new(BoundingBox::new(min_lon, min_lat, max_lon, max_lat), cell_size)
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of cells along longitude.
    pub fn xdim(&self) -> usize {
        self.xdim
    }

    /// Number of cells along latitude.
    pub fn ydim(&self) -> usize {
        self.ydim
    }

    /// `(xdim, ydim)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.xdim, self.ydim)
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.xdim * self.ydim
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat index of cell `(i, j)`.
    #[inline]
    pub fn index(&self, i: usize, j: usize) -> usize {
        i * self.ydim + j
    }

    /// Cell containing a point, or `None` outside the closed box.
    ///
    /// Points on an interior cell edge go to the higher-indexed cell
    /// (floor semantics). A point on the far edge whose floor lands one past
    /// the last cell is kept in the last cell.
    #[inline]
    pub fn cell_of(&self, lon: f64, lat: f64) -> Option<(usize, usize)> {
        if !self.bbox.contains(lon, lat) {
            return None;
        }
        let i = ((lon - self.bbox.min_lon) / self.cell_size).floor() as usize;
        let j = ((lat - self.bbox.min_lat) / self.cell_size).floor() as usize;
        Some((i.min(self.xdim - 1), j.min(self.ydim - 1)))
    }

    /// Longitude of column `i`: `min_lon + i * cell_size`.
    #[inline]
    pub fn cell_lon(&self, i: usize) -> f64 {
        self.bbox.min_lon + i as f64 * self.cell_size
    }

    /// Latitude of row `j`: `min_lat + j * cell_size`.
    #[inline]
    pub fn cell_lat(&self, j: usize) -> f64 {
        self.bbox.min_lat + j as f64 * self.cell_size
    }

    /// One longitude per column.
    pub fn lon_axis(&self) -> Vec<f64> {
        (0..self.xdim).map(|i| self.cell_lon(i)).collect()
    }

    /// One latitude per row.
    pub fn lat_axis(&self) -> Vec<f64> {
        (0..self.ydim).map(|j| self.cell_lat(j)).collect()
    }
}

/// Serialized form of a [`GridDomain`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DomainSpec {
    bbox: BoundingBox,
    cell_size: f64,
}

impl TryFrom<DomainSpec> for GridDomain {
    type Error = GridProcessorError;

    fn try_from(spec: DomainSpec) -> Result<Self> {
        GridDomain::new(spec.bbox, spec.cell_size)
    }
}

impl From<GridDomain> for DomainSpec {
    fn from(domain: GridDomain) -> Self {
        Self {
            bbox: domain.bbox,
            cell_size: domain.cell_size,
        }
    }
}

impl std::fmt::Display for GridDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}° ({}x{} cells)",
            self.bbox, self.cell_size, self.xdim, self.ydim
        )
    }
}

/// Finalised statistics of one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellStats {
    pub count: i32,
    pub mean: f32,
    pub std: f32,
    pub min: f32,
    pub max: f32,
    pub mean_angle: f32,
}

impl CellStats {
    /// What an unobserved cell reports.
    pub const EMPTY: CellStats = CellStats {
        count: FILL_COUNT,
        mean: FILL_VALUE,
        std: FILL_VALUE,
        min: EMPTY_EXTREMUM,
        max: EMPTY_EXTREMUM,
        mean_angle: FILL_VALUE,
    };

    pub fn is_empty(&self) -> bool {
        self.count == FILL_COUNT
    }
}

/// Per-cell statistics of one product on one day.
///
/// Every vector has `domain.len()` entries in `(i, j)` flat order.
#[derive(Debug, Clone)]
pub struct GriddedProduct {
    pub domain: GridDomain,
    pub count: Vec<i32>,
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
    pub min: Vec<f32>,
    pub max: Vec<f32>,
    pub mean_angle: Vec<f32>,
    /// Samples that fell outside the domain and were not binned.
    pub out_of_domain: u64,
    /// Cell longitude lattice, filled for every cell.
    pub lon: Vec<f64>,
    /// Cell latitude lattice, filled for every cell.
    pub lat: Vec<f64>,
}

impl GriddedProduct {
    /// Statistics of cell `(i, j)`, or `None` out of range.
    pub fn cell(&self, i: usize, j: usize) -> Option<CellStats> {
        if i >= self.domain.xdim() || j >= self.domain.ydim() {
            return None;
        }
        let k = self.domain.index(i, j);
        Some(CellStats {
            count: self.count[k],
            mean: self.mean[k],
            std: self.std[k],
            min: self.min[k],
            max: self.max[k],
            mean_angle: self.mean_angle[k],
        })
    }

    /// Number of cells holding at least one sample.
    pub fn occupied_cells(&self) -> usize {
        self.count.iter().filter(|&&c| c != FILL_COUNT).count()
    }

    /// Total number of samples that were binned.
    pub fn binned_samples(&self) -> u64 {
        self.count
            .iter()
            .filter(|&&c| c != FILL_COUNT)
            .map(|&c| c as u64)
            .sum()
    }
}

/// The three fields derived from the DB and DT mean grids.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedProduct {
    /// DB where valid, otherwise DT.
    pub db_preferred: Vec<f32>,
    /// DT where valid, otherwise DB.
    pub dt_preferred: Vec<f32>,
    /// Mean of both where both are valid, otherwise whichever is valid.
    pub averaged: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_dimensions() {
        let domain = GridDomain::from_limits(0.0, 2.0, 0.0, 2.0, 1.0).unwrap();
        assert_eq!(domain.shape(), (3, 3));
        assert_eq!(domain.len(), 9);

        let global = GridDomain::new(BoundingBox::global(), 0.1).unwrap();
        assert_eq!(global.shape(), (3601, 1801));
    }

    #[test]
    fn test_domain_rounds_ties_to_even() {
        // 1 + 1.5 / 1.0 = 2.5 -> 2
        let domain = GridDomain::from_limits(0.0, 2.5, 0.0, 1.5, 1.0).unwrap();
        assert_eq!(domain.xdim(), 2);
        // 1 + 2.5 / 1.0 = 3.5 -> 4
        assert_eq!(domain.ydim(), 4);
    }

    #[test]
    fn test_domain_rejects_bad_input() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        assert!(matches!(
            GridDomain::new(bbox, 0.0),
            Err(GridProcessorError::InvalidCellSize(_))
        ));
        assert!(matches!(
            GridDomain::new(bbox, -0.1),
            Err(GridProcessorError::InvalidCellSize(_))
        ));
        assert!(matches!(
            GridDomain::new(bbox, f64::NAN),
            Err(GridProcessorError::InvalidCellSize(_))
        ));
        assert!(matches!(
            GridDomain::from_limits(5.0, 1.0, 0.0, 1.0, 0.5),
            Err(GridProcessorError::InvalidDomain(_))
        ));
    }

    #[test]
    fn test_cell_of_uses_floor() {
        let domain = GridDomain::from_limits(0.0, 2.0, 0.0, 2.0, 1.0).unwrap();
        assert_eq!(domain.cell_of(0.0, 0.0), Some((0, 0)));
        assert_eq!(domain.cell_of(0.999, 0.5), Some((0, 0)));
        assert_eq!(domain.cell_of(1.0, 0.5), Some((1, 0)));
        assert_eq!(domain.cell_of(2.0, 2.0), Some((2, 2)));
        assert_eq!(domain.cell_of(2.01, 1.0), None);
        assert_eq!(domain.cell_of(1.0, -0.01), None);
    }

    #[test]
    fn test_axes() {
        let domain = GridDomain::from_limits(-10.0, -8.0, 100.0, 101.0, 0.5).unwrap();
        assert_eq!(domain.lon_axis(), vec![100.0, 100.5, 101.0]);
        assert_eq!(domain.lat_axis(), vec![-10.0, -9.5, -9.0, -8.5, -8.0]);
    }

    #[test]
    fn test_domain_serializes_without_dims() {
        let domain = GridDomain::from_limits(0.0, 2.0, 0.0, 2.0, 1.0).unwrap();
        let json = serde_json::to_value(domain).unwrap();
        assert_eq!(json["cell_size"], 1.0);
        assert!(json.get("xdim").is_none());

        let back: GridDomain = serde_json::from_value(json).unwrap();
        assert_eq!(back, domain);
        assert_eq!(back.shape(), (3, 3));
    }

    #[test]
    fn test_deserialized_domain_is_validated() {
        let bbox = r#"{"min_lon": 0.0, "min_lat": 0.0, "max_lon": 2.0, "max_lat": 2.0}"#;

        let forged = format!(r#"{{"bbox": {}, "cell_size": 1.0, "xdim": 0, "ydim": 0}}"#, bbox);
        assert!(serde_json::from_str::<GridDomain>(&forged).is_err());

        let zero_cell = format!(r#"{{"bbox": {}, "cell_size": 0.0}}"#, bbox);
        let err = serde_json::from_str::<GridDomain>(&zero_cell).unwrap_err();
        assert!(err.to_string().contains("cell size"));

        let inverted = r#"{"bbox": {"min_lon": 2.0, "min_lat": 0.0, "max_lon": 0.0, "max_lat": 2.0}, "cell_size": 1.0}"#;
        assert!(serde_json::from_str::<GridDomain>(inverted).is_err());
    }

    #[test]
    fn test_empty_cell_stats() {
        assert!(CellStats::EMPTY.is_empty());
        assert_eq!(CellStats::EMPTY.min, -1.0);
        assert!(is_fill(CellStats::EMPTY.mean));
    }
}
