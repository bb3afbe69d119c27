//! Geographic coordinates and viewport bounds

use crate::error::{RecordError, RecordResult};
use serde::{Deserialize, Serialize};

/// A validated WGS84 coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    /// Latitude in degrees, -90..=90
    pub lat: f64,
    /// Longitude in degrees, -180..=180
    pub lon: f64,
}

impl LatLon {
    /// Create a coordinate, rejecting non-finite or out-of-range values
    pub fn new(lat: f64, lon: f64) -> RecordResult<Self> {
        let valid = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);
        if valid {
            Ok(Self { lat, lon })
        } else {
            Err(RecordError::InvalidCoordinate { lat, lon })
        }
    }
}

/// Rectangular map viewport
///
/// Does not wrap across the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// South-west corner
    pub south_west: LatLon,
    /// North-east corner
    pub north_east: LatLon,
}

impl Bounds {
    /// Build bounds from two arbitrary corners
    #[must_use]
    pub fn from_corners(a: LatLon, b: LatLon) -> Self {
        Self {
            south_west: LatLon {
                lat: a.lat.min(b.lat),
                lon: a.lon.min(b.lon),
            },
            north_east: LatLon {
                lat: a.lat.max(b.lat),
                lon: a.lon.max(b.lon),
            },
        }
    }

    /// Whole-world bounds
    #[must_use]
    pub fn world() -> Self {
        Self {
            south_west: LatLon {
                lat: -90.0,
                lon: -180.0,
            },
            north_east: LatLon {
                lat: 90.0,
                lon: 180.0,
            },
        }
    }

    /// Inclusive containment test
    #[inline]
    #[must_use]
    pub fn contains(&self, point: LatLon) -> bool {
        point.lat >= self.south_west.lat
            && point.lat <= self.north_east.lat
            && point.lon >= self.south_west.lon
            && point.lon <= self.north_east.lon
    }
}
