//! Per-pixel sample streams handed from the granule readers to the gridder.

/// Four parallel sequences, one entry per retained pixel.
///
/// Index `k` of every vector describes the same pixel. The fields are private
/// so the lengths can only change together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleStream {
    values: Vec<f32>,
    lats: Vec<f32>,
    lons: Vec<f32>,
    angles: Vec<f32>,
}

impl SampleStream {
    /// Create an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty stream with room for `capacity` samples.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            lats: Vec::with_capacity(capacity),
            lons: Vec::with_capacity(capacity),
            angles: Vec::with_capacity(capacity),
        }
    }

    /// Build a stream from four vectors.
    ///
    /// Returns `None` when the lengths differ.
    pub fn from_parts(
        values: Vec<f32>,
        lats: Vec<f32>,
        lons: Vec<f32>,
        angles: Vec<f32>,
    ) -> Option<Self> {
        let n = values.len();
        if lats.len() != n || lons.len() != n || angles.len() != n {
            return None;
        }
        Some(Self {
            values,
            lats,
            lons,
            angles,
        })
    }

    /// Append one sample.
    pub fn push(&mut self, value: f32, lat: f32, lon: f32, angle: f32) {
        self.values.push(value);
        self.lats.push(lat);
        self.lons.push(lon);
        self.angles.push(angle);
    }

    /// Append every sample of `other`.
    pub fn append(&mut self, other: &mut SampleStream) {
        self.values.append(&mut other.values);
        self.lats.append(&mut other.lats);
        self.lons.append(&mut other.lons);
        self.angles.append(&mut other.angles);
    }

    /// Keep only the samples whose value lies in `[min_value, max_value]`.
    pub fn retain_value_range(&mut self, min_value: f32, max_value: f32) {
        let mut keep = 0;
        for k in 0..self.values.len() {
            let v = self.values[k];
            if v >= min_value && v <= max_value {
                self.values[keep] = v;
                self.lats[keep] = self.lats[k];
                self.lons[keep] = self.lons[k];
                self.angles[keep] = self.angles[k];
                keep += 1;
            }
        }
        self.values.truncate(keep);
        self.lats.truncate(keep);
        self.lons.truncate(keep);
        self.angles.truncate(keep);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn lats(&self) -> &[f32] {
        &self.lats
    }

    pub fn lons(&self) -> &[f32] {
        &self.lons
    }

    pub fn angles(&self) -> &[f32] {
        &self.angles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_rejects_ragged_input() {
        assert!(SampleStream::from_parts(vec![1.0], vec![0.0], vec![0.0], vec![]).is_none());
        assert!(SampleStream::from_parts(vec![1.0], vec![0.0], vec![0.0], vec![5.0]).is_some());
    }

    #[test]
    fn test_retain_value_range_keeps_arrays_aligned() {
        let mut samples = SampleStream::new();
        samples.push(-0.1, 10.0, 20.0, 1.0);
        samples.push(-0.05, 11.0, 21.0, 2.0);
        samples.push(2.5, 12.0, 22.0, 3.0);
        samples.push(5.0, 13.0, 23.0, 4.0);
        samples.push(5.01, 14.0, 24.0, 5.0);

        samples.retain_value_range(-0.05, 5.0);

        assert_eq!(samples.len(), 3);
        assert_eq!(samples.values(), &[-0.05, 2.5, 5.0]);
        assert_eq!(samples.lats(), &[11.0, 12.0, 13.0]);
        assert_eq!(samples.lons(), &[21.0, 22.0, 23.0]);
        assert_eq!(samples.angles(), &[2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_append() {
        let mut a = SampleStream::new();
        a.push(1.0, 0.0, 0.0, 10.0);
        let mut b = SampleStream::new();
        b.push(2.0, 1.0, 1.0, 20.0);
        b.push(3.0, 2.0, 2.0, 30.0);

        a.append(&mut b);
        assert_eq!(a.len(), 3);
        assert!(b.is_empty());
        assert_eq!(a.values(), &[1.0, 2.0, 3.0]);
    }
}
