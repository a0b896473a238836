//! Binning aggregation of scattered samples into a regular lattice.
//!
//! Each sample inside the domain is dropped into the cell found by floor
//! division of its offset from the south-west corner. Cells accumulate count,
//! sum, sum of squares, angle sum and running min/max in a single pass; the
//! statistics are finalised once every sample has been seen.
//!
//! # Standard deviation policy
//!
//! The population standard deviation uses the one-pass identity
//! `sqrt(sum_sq / n - mean²)`. Floating-point cancellation can drive that
//! radicand to zero or below for cells whose values are nearly equal. Such a
//! cell reports `std = FILL_VALUE` ("no data"), not `0.0`. The one exception
//! is a cell whose samples are all identical (`min == max`): its variance is
//! exactly zero and it reports `std = 0.0`.

use aerosol_common::SampleStream;

use crate::error::{GridProcessorError, Result};
use crate::types::{CellStats, GridDomain, GriddedProduct, EMPTY_EXTREMUM, FILL_COUNT, FILL_VALUE};

/// Running sums for one cell.
#[derive(Debug, Clone, Copy)]
struct CellAccumulator {
    count: u32,
    sum: f64,
    sum_sq: f64,
    angle_sum: f64,
    min: f32,
    max: f32,
}

impl CellAccumulator {
    const fn new() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            sum_sq: 0.0,
            angle_sum: 0.0,
            min: f32::INFINITY,
            max: f32::NEG_INFINITY,
        }
    }

    #[inline]
    fn push(&mut self, value: f32, angle: f32) {
        let v = value as f64;
        self.count += 1;
        self.sum += v;
        self.sum_sq += v * v;
        self.angle_sum += angle as f64;
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    fn finish(&self) -> CellStats {
        if self.count == 0 {
            return CellStats::EMPTY;
        }

        let n = self.count as f64;
        let mean = self.sum / n;
        let radicand = self.sum_sq / n - mean * mean;

        let std = if self.min == self.max {
            0.0
        } else if radicand > 0.0 {
            radicand.sqrt() as f32
        } else {
            FILL_VALUE
        };

        CellStats {
            count: i32::try_from(self.count).unwrap_or(i32::MAX),
            mean: mean as f32,
            std,
            min: self.min,
            max: self.max,
            mean_angle: (self.angle_sum / n) as f32,
        }
    }
}

/// Accumulates samples for one product on one domain.
///
/// Samples may be fed in any order and in any number of batches; the result
/// depends only on the multiset of samples.
#[derive(Debug, Clone)]
pub struct GridAccumulator {
    domain: GridDomain,
    cells: Vec<CellAccumulator>,
    binned: u64,
    skipped: u64,
}

impl GridAccumulator {
    /// Create an accumulator with every cell empty.
    pub fn new(domain: GridDomain) -> Self {
        Self {
            domain,
            cells: vec![CellAccumulator::new(); domain.len()],
            binned: 0,
            skipped: 0,
        }
    }

    pub fn domain(&self) -> &GridDomain {
        &self.domain
    }

    /// Add one sample. Returns `false` if it lies outside the domain.
    #[inline]
    pub fn add(&mut self, value: f32, lat: f32, lon: f32, angle: f32) -> bool {
        match self.domain.cell_of(lon as f64, lat as f64) {
            Some((i, j)) => {
                let k = self.domain.index(i, j);
                self.cells[k].push(value, angle);
                self.binned += 1;
                true
            }
            None => {
                self.skipped += 1;
                false
            }
        }
    }

    /// Add four parallel sequences, rejecting ragged input before binning.
    pub fn add_all(
        &mut self,
        values: &[f32],
        lats: &[f32],
        lons: &[f32],
        angles: &[f32],
    ) -> Result<()> {
        let n = values.len();
        if lats.len() != n || lons.len() != n || angles.len() != n {
            return Err(GridProcessorError::LengthMismatch {
                values: n,
                lats: lats.len(),
                lons: lons.len(),
                angles: angles.len(),
            });
        }

        for k in 0..n {
            self.add(values[k], lats[k], lons[k], angles[k]);
        }
        Ok(())
    }

    /// Samples that landed in a cell so far.
    pub fn binned(&self) -> u64 {
        self.binned
    }

    /// Samples that fell outside the domain so far.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Finalise every cell and build the coordinate lattice.
    pub fn finish(self) -> GriddedProduct {
        let domain = self.domain;
        let n = domain.len();

        let mut product = GriddedProduct {
            domain,
            count: vec![FILL_COUNT; n],
            mean: vec![FILL_VALUE; n],
            std: vec![FILL_VALUE; n],
            min: vec![EMPTY_EXTREMUM; n],
            max: vec![EMPTY_EXTREMUM; n],
            mean_angle: vec![FILL_VALUE; n],
            out_of_domain: self.skipped,
            lon: vec![0.0; n],
            lat: vec![0.0; n],
        };

        for i in 0..domain.xdim() {
            let lon = domain.cell_lon(i);
            for j in 0..domain.ydim() {
                let k = domain.index(i, j);
                product.lon[k] = lon;
                product.lat[k] = domain.cell_lat(j);

                let stats = self.cells[k].finish();
                product.count[k] = stats.count;
                product.mean[k] = stats.mean;
                product.std[k] = stats.std;
                product.min[k] = stats.min;
                product.max[k] = stats.max;
                product.mean_angle[k] = stats.mean_angle;
            }
        }

        product
    }
}

/// Bin four parallel sample sequences onto `domain`.
///
/// Samples outside the closed bounding box are ignored and counted in
/// [`GriddedProduct::out_of_domain`]. Empty input yields an all-empty grid
/// with a complete coordinate lattice.
pub fn aggregate(
    domain: &GridDomain,
    values: &[f32],
    lats: &[f32],
    lons: &[f32],
    angles: &[f32],
) -> Result<GriddedProduct> {
    let mut acc = GridAccumulator::new(*domain);
    acc.add_all(values, lats, lons, angles)?;
    Ok(acc.finish())
}

/// Bin a [`SampleStream`] onto `domain`.
pub fn aggregate_samples(domain: &GridDomain, samples: &SampleStream) -> Result<GriddedProduct> {
    aggregate(
        domain,
        samples.values(),
        samples.lats(),
        samples.lons(),
        samples.angles(),
    )
}
