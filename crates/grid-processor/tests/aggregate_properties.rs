//! Properties of the binning aggregator and combiner over synthetic swaths.

use aerosol_common::{BoundingBox, SampleStream};
use grid_processor::{
    aggregate, aggregate_samples, combine_products, GridDomain, EMPTY_EXTREMUM, FILL_COUNT,
    FILL_VALUE,
};
use test_utils::{assert_approx_eq, constant_samples, lattice_samples, outside_samples, scattered_samples};

fn unit_domain() -> GridDomain {
    let (min_lon, min_lat, max_lon, max_lat) = test_utils::bbox::UNIT;
    GridDomain::new(BoundingBox::new(min_lon, min_lat, max_lon, max_lat), 1.0).unwrap()
}

#[test]
fn test_empty_input_yields_full_lattice() {
    let domain = unit_domain();
    let grid = aggregate_samples(&domain, &SampleStream::new()).unwrap();

    assert_eq!(grid.occupied_cells(), 0);
    assert!(grid.count.iter().all(|&c| c == FILL_COUNT));
    assert!(grid.mean.iter().all(|&v| v == FILL_VALUE));
    assert!(grid.std.iter().all(|&v| v == FILL_VALUE));
    assert!(grid.mean_angle.iter().all(|&v| v == FILL_VALUE));
    assert!(grid.min.iter().all(|&v| v == EMPTY_EXTREMUM));
    assert!(grid.max.iter().all(|&v| v == EMPTY_EXTREMUM));

    for i in 0..domain.xdim() {
        for j in 0..domain.ydim() {
            let k = domain.index(i, j);
            assert_eq!(grid.lon[k], i as f64);
            assert_eq!(grid.lat[k], j as f64);
        }
    }
}

#[test]
fn test_boundary_sample_lands_in_next_cell() {
    let domain = unit_domain();
    let grid = aggregate(&domain, &[0.7], &[0.5], &[1.0], &[12.0]).unwrap();

    assert_eq!(grid.cell(1, 0).unwrap().count, 1);
    assert_eq!(grid.cell(0, 0).unwrap().count, FILL_COUNT);
}

#[test]
fn test_outside_samples_never_affect_cells() {
    let domain = unit_domain();
    let inside = constant_samples(3, 0.4, 1.5, 0.5, 20.0);
    let baseline = aggregate_samples(&domain, &inside).unwrap();

    let mut mixed = inside.clone();
    mixed.append(&mut outside_samples(domain.bbox(), 4.0));
    let grid = aggregate_samples(&domain, &mixed).unwrap();

    assert_eq!(grid.count, baseline.count);
    assert_eq!(grid.mean, baseline.mean);
    assert_eq!(grid.max, baseline.max);
    assert_eq!(grid.binned_samples(), 3);
}

#[test]
fn test_identical_samples_have_exact_mean_and_zero_std() {
    let domain = unit_domain();
    let grid = aggregate_samples(&domain, &constant_samples(5, 0.37, 0.2, 1.2, 33.0)).unwrap();
    let cell = grid.cell(1, 0).unwrap();

    assert_eq!(cell.count, 5);
    assert_eq!(cell.mean, 0.37);
    assert_eq!(cell.std, 0.0);
    assert_eq!(cell.min, 0.37);
    assert_eq!(cell.max, 0.37);
    assert_eq!(cell.mean_angle, 33.0);
}

#[test]
fn test_every_sample_is_counted_once() {
    let bbox = BoundingBox::new(-20.0, -10.0, 20.0, 10.0);
    let domain = GridDomain::new(bbox, 0.5).unwrap();
    let samples = scattered_samples(&bbox, 5_000, 42);
    let grid = aggregate_samples(&domain, &samples).unwrap();

    assert_eq!(grid.binned_samples(), 5_000);

    for k in 0..domain.len() {
        if grid.count[k] == FILL_COUNT {
            continue;
        }
        assert!(grid.min[k] <= grid.mean[k] && grid.mean[k] <= grid.max[k]);
        assert!(grid.std[k] >= 0.0 || grid.std[k] == FILL_VALUE);
    }
}

#[test]
fn test_lattice_one_sample_per_cell() {
    let bbox = BoundingBox::new(100.0, -10.0, 110.0, 0.0);
    let domain = GridDomain::new(bbox, 1.0).unwrap();
    let samples = lattice_samples(&bbox, 10, 10, 0.1);
    let grid = aggregate_samples(&domain, &samples).unwrap();

    // The outer row and column of cells sit on the far edge and stay empty.
    assert_eq!(domain.shape(), (11, 11));
    assert_eq!(grid.occupied_cells(), 100);

    let cell = grid.cell(3, 4).unwrap();
    assert_eq!(cell.count, 1);
    assert_approx_eq!(cell.mean, 0.107, 1e-6);
    assert_eq!(cell.std, 0.0);
}

#[test]
fn test_combine_on_aggregated_grids() {
    let domain = unit_domain();
    let db = aggregate(&domain, &[1.0, 3.0], &[0.5, 0.5], &[1.5, 1.5], &[0.0, 0.0]).unwrap();
    let dt = aggregate(&domain, &[4.0, 0.5], &[0.5, 1.5], &[1.5, 0.5], &[0.0, 0.0]).unwrap();
    let combined = combine_products(&db, &dt).unwrap();

    let shared = domain.index(1, 0);
    assert_eq!(combined.db_preferred[shared], 2.0);
    assert_eq!(combined.dt_preferred[shared], 4.0);
    assert_eq!(combined.averaged[shared], 3.0);

    let dt_only = domain.index(0, 1);
    assert_eq!(combined.db_preferred[dt_only], 0.5);
    assert_eq!(combined.averaged[dt_only], 0.5);

    let neither = domain.index(2, 2);
    assert_eq!(combined.averaged[neither], FILL_VALUE);
}
