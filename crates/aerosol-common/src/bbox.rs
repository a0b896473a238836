//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

use crate::error::{AerosolError, AerosolResult};

/// A geographic bounding box in degrees (WGS84).
///
/// Containment is closed on all four edges, so a sample lying exactly on
/// `max_lon` or `max_lat` is inside the box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// The whole globe.
    pub fn global() -> Self {
        Self::new(-180.0, -90.0, 180.0, 90.0)
    }

    /// Parse a "min_lon,min_lat,max_lon,max_lat" string.
    pub fn from_str_list(s: &str) -> Result<Self, BboxParseError> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 4 {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }

        let parse = |p: &str| {
            p.trim()
                .parse::<f64>()
                .map_err(|_| BboxParseError::InvalidNumber(p.to_string()))
        };

        Ok(Self {
            min_lon: parse(parts[0])?,
            min_lat: parse(parts[1])?,
            max_lon: parse(parts[2])?,
            max_lat: parse(parts[3])?,
        })
    }

    /// Width in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Height in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Check if a point lies inside the closed box.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }

    /// Reject non-finite corners and inverted or zero-extent boxes.
    pub fn validate(&self) -> AerosolResult<()> {
        let corners = [self.min_lon, self.min_lat, self.max_lon, self.max_lat];
        if corners.iter().any(|c| !c.is_finite()) {
            return Err(AerosolError::InvalidBbox(format!(
                "non-finite corner in {}",
                self
            )));
        }
        if self.min_lon >= self.max_lon {
            return Err(AerosolError::InvalidBbox(format!(
                "min_lon {} must be less than max_lon {}",
                self.min_lon, self.max_lon
            )));
        }
        if self.min_lat >= self.max_lat {
            return Err(AerosolError::InvalidBbox(format!(
                "min_lat {} must be less than max_lat {}",
                self.min_lat, self.max_lat
            )));
        }
        Ok(())
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::global()
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "lon [{}, {}] lat [{}, {}]",
            self.min_lon, self.max_lon, self.min_lat, self.max_lat
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid bounding box format: {0}. Expected 'min_lon,min_lat,max_lon,max_lat'")]
    InvalidFormat(String),

    #[error("Invalid number in bounding box: {0}")]
    InvalidNumber(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bbox() {
        let bbox = BoundingBox::from_str_list("-125.0,24.0,-66.0,50.0").unwrap();
        assert_eq!(bbox.min_lon, -125.0);
        assert_eq!(bbox.min_lat, 24.0);
        assert_eq!(bbox.max_lon, -66.0);
        assert_eq!(bbox.max_lat, 50.0);
    }

    #[test]
    fn test_parse_bbox_invalid() {
        assert!(matches!(
            BoundingBox::from_str_list("0,0,10"),
            Err(BboxParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            BoundingBox::from_str_list("a,0,10,10"),
            Err(BboxParseError::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_contains_is_closed() {
        let bbox = BoundingBox::new(0.0, 0.0, 2.0, 2.0);
        assert!(bbox.contains(0.0, 0.0));
        assert!(bbox.contains(2.0, 2.0));
        assert!(bbox.contains(1.0, 1.5));
        assert!(!bbox.contains(2.000001, 1.0));
        assert!(!bbox.contains(1.0, -0.000001));
    }

    #[test]
    fn test_validate() {
        assert!(BoundingBox::global().validate().is_ok());
        assert!(BoundingBox::new(10.0, 0.0, 5.0, 1.0).validate().is_err());
        assert!(BoundingBox::new(0.0, 1.0, 5.0, 1.0).validate().is_err());
        assert!(BoundingBox::new(f64::NAN, 0.0, 5.0, 1.0).validate().is_err());
    }

    #[test]
    fn test_dimensions() {
        let bbox = BoundingBox::new(-100.0, 30.0, -90.0, 45.0);
        assert_eq!(bbox.width(), 10.0);
        assert_eq!(bbox.height(), 15.0);
    }
}
