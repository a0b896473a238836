//! Cell-wise merge of the Deep Blue and Dark Target mean grids.

use crate::error::{GridProcessorError, Result};
use crate::types::{is_fill, CombinedProduct, GriddedProduct, FILL_VALUE};

/// `a`, or `b` where `a` is fill.
#[inline]
fn prefer(a: f32, b: f32) -> f32 {
    if is_fill(a) {
        b
    } else {
        a
    }
}

/// Mean of both where both are valid, otherwise whichever is valid.
#[inline]
fn average(a: f32, b: f32) -> f32 {
    match (is_fill(a), is_fill(b)) {
        (false, false) => (a + b) / 2.0,
        (false, true) => a,
        (true, false) => b,
        (true, true) => FILL_VALUE,
    }
}

/// Merge two same-shaped mean grids.
///
/// `a` is the Deep Blue mean and `b` the Dark Target mean, so
/// `db_preferred` prefers `a` and `dt_preferred` prefers `b`.
pub fn combine(a: &[f32], b: &[f32]) -> Result<CombinedProduct> {
    if a.len() != b.len() {
        return Err(GridProcessorError::ShapeMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let n = a.len();
    let mut db_preferred = Vec::with_capacity(n);
    let mut dt_preferred = Vec::with_capacity(n);
    let mut averaged = Vec::with_capacity(n);

    for (&x, &y) in a.iter().zip(b) {
        db_preferred.push(prefer(x, y));
        dt_preferred.push(prefer(y, x));
        averaged.push(average(x, y));
    }

    Ok(CombinedProduct {
        db_preferred,
        dt_preferred,
        averaged,
    })
}

/// Merge the mean grids of two products gridded on the same domain.
pub fn combine_products(db: &GriddedProduct, dt: &GriddedProduct) -> Result<CombinedProduct> {
    if db.domain != dt.domain {
        return Err(GridProcessorError::DomainMismatch(format!(
            "DB on {} vs DT on {}",
            db.domain, dt.domain
        )));
    }
    combine(&db.mean, &dt.mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::types::GridDomain;

    fn triple(a: f32, b: f32) -> (f32, f32, f32) {
        let c = combine(&[a], &[b]).unwrap();
        (c.db_preferred[0], c.dt_preferred[0], c.averaged[0])
    }

    #[test]
    fn test_only_db_valid() {
        assert_eq!(triple(5.0, -999.0), (5.0, 5.0, 5.0));
    }

    #[test]
    fn test_only_dt_valid() {
        assert_eq!(triple(-999.0, 3.0), (3.0, 3.0, 3.0));
    }

    #[test]
    fn test_both_valid() {
        assert_eq!(triple(2.0, 4.0), (2.0, 4.0, 3.0));
    }

    #[test]
    fn test_neither_valid() {
        assert_eq!(triple(-999.0, -999.0), (-999.0, -999.0, -999.0));
    }

    #[test]
    fn test_averaged_of_values_near_fill() {
        // Neither input is the sentinel, so the plain mean is reported even
        // though it equals it.
        assert_eq!(triple(-998.0, -1000.0), (-998.0, -1000.0, -999.0));
    }

    #[test]
    fn test_shape_mismatch() {
        let err = combine(&[1.0, 2.0], &[1.0]).unwrap_err();
        assert!(matches!(
            err,
            GridProcessorError::ShapeMismatch { left: 2, right: 1 }
        ));
    }

    #[test]
    fn test_combine_products_rejects_other_domain() {
        let a = GridDomain::from_limits(0.0, 2.0, 0.0, 2.0, 1.0).unwrap();
        let b = GridDomain::from_limits(0.0, 2.0, 0.0, 2.0, 0.5).unwrap();
        let db = aggregate(&a, &[], &[], &[], &[]).unwrap();
        let dt = aggregate(&b, &[], &[], &[], &[]).unwrap();
        assert!(matches!(
            combine_products(&db, &dt),
            Err(GridProcessorError::DomainMismatch(_))
        ));
    }

    #[test]
    fn test_combine_products() {
        let domain = GridDomain::from_limits(0.0, 2.0, 0.0, 2.0, 1.0).unwrap();
        let db = aggregate(&domain, &[0.2], &[0.5], &[0.5], &[0.0]).unwrap();
        let dt = aggregate(&domain, &[0.4, 0.6], &[0.5, 1.5], &[0.5, 1.5], &[0.0, 0.0]).unwrap();

        let combined = combine_products(&db, &dt).unwrap();
        let k00 = domain.index(0, 0);
        let k11 = domain.index(1, 1);
        assert!((combined.averaged[k00] - 0.3).abs() < 1e-6);
        assert_eq!(combined.db_preferred[k00], 0.2);
        assert_eq!(combined.dt_preferred[k00], 0.4);
        assert_eq!(combined.db_preferred[k11], 0.6);
        assert_eq!(combined.averaged[domain.index(2, 2)], FILL_VALUE);
    }
}
