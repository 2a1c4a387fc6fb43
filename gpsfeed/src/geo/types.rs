//! Geographic value types

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Valid latitude range
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Longest dwell a waypoint will honour, in seconds (one day).
pub const MAX_HOLD_SECONDS: f64 = 86_400.0;

/// Errors raised when a coordinate falls outside the valid WGS-84 range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    #[error("Invalid latitude: {0} (must be between -90 and 90)")]
    InvalidLatitude(f64),

    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),
}

/// A latitude/longitude pair in decimal degrees.
///
/// Range validity is not enforced on construction; route generation and the
/// streaming client both produce values that are valid by construction, and
/// `validated()` is available where input comes from outside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, positive north.
    pub latitude: f64,
    /// Longitude in degrees, positive east.
    pub longitude: f64,
}

impl Coordinate {
    /// Create a new coordinate.
    #[inline]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns true when both axes are inside the valid range.
    pub fn is_valid(&self) -> bool {
        (MIN_LAT..=MAX_LAT).contains(&self.latitude)
            && (MIN_LON..=MAX_LON).contains(&self.longitude)
    }

    /// Returns the coordinate unchanged, or the first axis that is out of range.
    pub fn validated(self) -> Result<Self, GeoError> {
        if !(MIN_LAT..=MAX_LAT).contains(&self.latitude) {
            return Err(GeoError::InvalidLatitude(self.latitude));
        }
        if !(MIN_LON..=MAX_LON).contains(&self.longitude) {
            return Err(GeoError::InvalidLongitude(self.longitude));
        }
        Ok(self)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// A route vertex with a dwell time.
///
/// When the simulator reaches a waypoint it pauses there for `hold_seconds`
/// before moving on to the next one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Waypoint position.
    #[serde(flatten)]
    pub coordinate: Coordinate,
    /// Dwell time in seconds (>= 0).
    #[serde(rename = "holdSeconds")]
    pub hold_seconds: f64,
}

impl Waypoint {
    /// Create a waypoint. Negative hold times are treated as zero.
    pub fn new(coordinate: Coordinate, hold_seconds: f64) -> Self {
        Self {
            coordinate,
            hold_seconds: hold_seconds.max(0.0),
        }
    }

    /// The dwell time as a `Duration`, capped at [`MAX_HOLD_SECONDS`].
    pub fn hold(&self) -> Duration {
        if !self.has_hold() {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.hold_seconds.min(MAX_HOLD_SECONDS))
    }

    /// True when the simulator should pause at this waypoint.
    pub fn has_hold(&self) -> bool {
        self.hold_seconds > 0.0
    }
}
