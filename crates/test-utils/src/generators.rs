//! Synthetic sample generators.
//!
//! Every generator is deterministic so tests can assert exact counts.

use aerosol_common::{BoundingBox, SampleStream};

/// `n` samples of one value at one point.
pub fn constant_samples(n: usize, value: f32, lat: f32, lon: f32, angle: f32) -> SampleStream {
    let mut samples = SampleStream::with_capacity(n);
    for _ in 0..n {
        samples.push(value, lat, lon, angle);
    }
    samples
}

/// Samples on a regular `nx x ny` lattice strictly inside `bbox`.
///
/// Point `(c, r)` sits at the centre of the `c`-th column and `r`-th row of an
/// even split of the box, with value `base + 0.001 * (c + r)` and angle
/// `(c + r) % 70`.
pub fn lattice_samples(bbox: &BoundingBox, nx: usize, ny: usize, base: f32) -> SampleStream {
    let mut samples = SampleStream::with_capacity(nx * ny);
    let dx = bbox.width() / nx.max(1) as f64;
    let dy = bbox.height() / ny.max(1) as f64;
    for c in 0..nx {
        for r in 0..ny {
            let lon = bbox.min_lon + (c as f64 + 0.5) * dx;
            let lat = bbox.min_lat + (r as f64 + 0.5) * dy;
            samples.push(
                base + 0.001 * (c + r) as f32,
                lat as f32,
                lon as f32,
                ((c + r) % 70) as f32,
            );
        }
    }
    samples
}

/// Pseudo-random samples inside `bbox` from a fixed seed.
///
/// Values fall in `[0, 2)` and angles in `[0, 70)`.
pub fn scattered_samples(bbox: &BoundingBox, n: usize, seed: u64) -> SampleStream {
    let mut rng = SplitMix64(seed);
    let mut samples = SampleStream::with_capacity(n);
    for _ in 0..n {
        let lon = bbox.min_lon + rng.next_unit() * bbox.width();
        let lat = bbox.min_lat + rng.next_unit() * bbox.height();
        let value = (rng.next_unit() * 2.0) as f32;
        let angle = (rng.next_unit() * 70.0) as f32;
        samples.push(value, lat as f32, lon as f32, angle);
    }
    samples
}

/// Samples that lie just outside every edge of `bbox`.
pub fn outside_samples(bbox: &BoundingBox, value: f32) -> SampleStream {
    let mid_lon = ((bbox.min_lon + bbox.max_lon) / 2.0) as f32;
    let mid_lat = ((bbox.min_lat + bbox.max_lat) / 2.0) as f32;
    let eps = 0.01f32;
    let mut samples = SampleStream::new();
    samples.push(value, mid_lat, bbox.min_lon as f32 - eps, 0.0);
    samples.push(value, mid_lat, bbox.max_lon as f32 + eps, 0.0);
    samples.push(value, bbox.min_lat as f32 - eps, mid_lon, 0.0);
    samples.push(value, bbox.max_lat as f32 + eps, mid_lon, 0.0);
    samples
}

struct SplitMix64(u64);

impl SplitMix64 {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`.
    fn next_unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lattice_samples_stay_inside() {
        let bbox = BoundingBox::new(-10.0, -5.0, 10.0, 5.0);
        let samples = lattice_samples(&bbox, 8, 4, 0.2);
        assert_eq!(samples.len(), 32);
        for k in 0..samples.len() {
            assert!(bbox.contains(samples.lons()[k] as f64, samples.lats()[k] as f64));
        }
    }

    #[test]
    fn test_scattered_samples_are_reproducible() {
        let bbox = BoundingBox::global();
        let a = scattered_samples(&bbox, 100, 7);
        let b = scattered_samples(&bbox, 100, 7);
        assert_eq!(a, b);
        assert!(a.values().iter().all(|v| (0.0..2.0).contains(v)));
    }

    #[test]
    fn test_outside_samples() {
        let bbox = BoundingBox::new(0.0, 0.0, 2.0, 2.0);
        let samples = outside_samples(&bbox, 1.0);
        assert_eq!(samples.len(), 4);
        for k in 0..samples.len() {
            assert!(!bbox.contains(samples.lons()[k] as f64, samples.lats()[k] as f64));
        }
    }
}
