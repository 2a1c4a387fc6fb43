//! Spherical-earth geometry helpers.
//!
//! Distance, bearing projection and metre/degree conversions used by route
//! generation, jitter sampling and the route simulator. Everything here is a
//! pure function of its inputs.
//!
//! # Accuracy
//!
//! The earth is modelled as a sphere of radius [`EARTH_RADIUS_M`]. Metre to
//! degree conversions use the equirectangular small-offset approximation
//! (111 320 m per degree of latitude), which is what the route and jitter
//! generators are defined against.
//!
//! # Known edge case
//!
//! [`meters_to_lon_degrees`] divides by `cos(latitude)`. Near the poles the
//! cosine tends to zero and the result grows without bound (it is infinite
//! at exactly ±90°). Callers that may operate at extreme latitudes must guard
//! against this themselves; no clamping is performed here.

mod types;

pub use types::{
    Coordinate, GeoError, Waypoint, MAX_HOLD_SECONDS, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON,
};

/// Mean earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Metres per degree of latitude (equirectangular approximation).
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Great-circle distance between two coordinates, in metres.
pub fn haversine_distance(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();

    let s = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * s.sqrt().atan2((1.0 - s).sqrt())
}

/// Convert a north/south offset in metres to degrees of latitude.
#[inline]
pub fn meters_to_lat_degrees(meters: f64) -> f64 {
    meters / METERS_PER_DEGREE
}

/// Convert an east/west offset in metres to degrees of longitude at the given latitude.
///
/// Unbounded as `latitude` approaches ±90°; see the module docs.
#[inline]
pub fn meters_to_lon_degrees(meters: f64, latitude: f64) -> f64 {
    meters / (METERS_PER_DEGREE * latitude.to_radians().cos())
}

/// Offset a coordinate by metres north and east using the small-offset approximation.
pub fn offset_meters(base: Coordinate, north_m: f64, east_m: f64) -> Coordinate {
    Coordinate::new(
        base.latitude + meters_to_lat_degrees(north_m),
        base.longitude + meters_to_lon_degrees(east_m, base.latitude),
    )
}

/// Linear interpolation of each axis independently.
///
/// Not geodesically exact; adequate for the short segments between
/// consecutive route waypoints.
#[inline]
pub fn lerp(a: Coordinate, b: Coordinate, t: f64) -> Coordinate {
    Coordinate::new(
        a.latitude + (b.latitude - a.latitude) * t,
        a.longitude + (b.longitude - a.longitude) * t,
    )
}

/// Project a point from `origin` along an initial bearing.
///
/// # Arguments
///
/// * `origin` - Start point
/// * `bearing_rad` - Initial bearing in radians, clockwise from north
/// * `angular_distance_rad` - Distance travelled divided by [`EARTH_RADIUS_M`]
pub fn destination_point(
    origin: Coordinate,
    bearing_rad: f64,
    angular_distance_rad: f64,
) -> Coordinate {
    let phi1 = origin.latitude.to_radians();
    let lambda1 = origin.longitude.to_radians();
    let delta = angular_distance_rad;

    let sin_phi2 = phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * bearing_rad.cos();
    let phi2 = sin_phi2.asin();
    let y = bearing_rad.sin() * delta.sin() * phi1.cos();
    let x = delta.cos() - phi1.sin() * sin_phi2;
    let lambda2 = lambda1 + y.atan2(x);

    Coordinate::new(phi2.to_degrees(), lambda2.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const HYDERABAD: Coordinate = Coordinate::new(17.3850, 78.4867);

    #[test]
    fn test_haversine_zero_for_identical_points() {
        assert_eq!(haversine_distance(HYDERABAD, HYDERABAD), 0.0);
    }

    #[test]
    fn test_haversine_one_degree_of_latitude() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(1.0, 0.0);
        let expected = EARTH_RADIUS_M * 1.0_f64.to_radians();
        assert!((haversine_distance(a, b) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_haversine_known_city_pair() {
        // Hyderabad to Bengaluru, roughly 500 km
        let bengaluru = Coordinate::new(12.9716, 77.5946);
        let d = haversine_distance(HYDERABAD, bengaluru);
        assert!((490_000.0..510_000.0).contains(&d), "got {}", d);
    }

    #[test]
    fn test_meter_degree_conversions() {
        assert!((meters_to_lat_degrees(111_320.0) - 1.0).abs() < 1e-12);
        assert!((meters_to_lon_degrees(111_320.0, 0.0) - 1.0).abs() < 1e-12);
        // Longitude degrees stretch with latitude
        assert!((meters_to_lon_degrees(111_320.0, 60.0) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_meters_to_lon_degrees_blows_up_at_pole() {
        let deg = meters_to_lon_degrees(1.0, 90.0);
        assert!(deg.abs() > 1e9, "expected a huge value near the pole, got {}", deg);
    }

    #[test]
    fn test_lerp_endpoints_and_midpoint() {
        let a = Coordinate::new(10.0, 20.0);
        let b = Coordinate::new(12.0, 24.0);
        assert_eq!(lerp(a, b, 0.0), a);
        assert_eq!(lerp(a, b, 1.0), b);
        assert_eq!(lerp(a, b, 0.5), Coordinate::new(11.0, 22.0));
    }

    #[test]
    fn test_destination_point_due_north() {
        let origin = Coordinate::new(0.0, 0.0);
        let p = destination_point(origin, 0.0, 1.0_f64.to_radians());
        assert!((p.latitude - 1.0).abs() < 1e-9);
        assert!(p.longitude.abs() < 1e-9);
    }

    #[test]
    fn test_offset_meters_moves_both_axes() {
        let p = offset_meters(Coordinate::new(0.0, 0.0), 111_320.0, -111_320.0);
        assert!((p.latitude - 1.0).abs() < 1e-12);
        assert!((p.longitude + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(HYDERABAD.is_valid());
        assert_eq!(
            Coordinate::new(91.0, 0.0).validated(),
            Err(GeoError::InvalidLatitude(91.0))
        );
        assert_eq!(
            Coordinate::new(0.0, -180.5).validated(),
            Err(GeoError::InvalidLongitude(-180.5))
        );
    }

    #[test]
    fn test_waypoint_hold_is_capped() {
        let wp = Waypoint::new(HYDERABAD, 1e30);
        assert_eq!(wp.hold(), Duration::from_secs(86_400));

        let wp = Waypoint::new(HYDERABAD, f64::INFINITY);
        assert_eq!(wp.hold(), Duration::from_secs(86_400));

        let wp = Waypoint {
            coordinate: HYDERABAD,
            hold_seconds: f64::NAN,
        };
        assert!(!wp.has_hold());
        assert_eq!(wp.hold(), Duration::ZERO);
    }

    #[test]
    fn test_waypoint_clamps_negative_hold() {
        let wp = Waypoint::new(HYDERABAD, -3.0);
        assert_eq!(wp.hold_seconds, 0.0);
        assert!(!wp.has_hold());
    }

    // Property-based tests using proptest
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_destination_point_distance_matches_radius(
                lat in -80.0..80.0_f64,
                lon in -179.0..179.0_f64,
                bearing in 0.0..std::f64::consts::TAU,
                meters in 1.0..200_000.0_f64,
            ) {
                let origin = Coordinate::new(lat, lon);
                let p = destination_point(origin, bearing, meters / EARTH_RADIUS_M);
                let d = haversine_distance(origin, p);
                prop_assert!(
                    (d - meters).abs() < 1e-3,
                    "expected {} m, got {} m", meters, d
                );
            }

            #[test]
            fn test_haversine_is_symmetric(
                lat1 in -90.0..90.0_f64,
                lon1 in -180.0..180.0_f64,
                lat2 in -90.0..90.0_f64,
                lon2 in -180.0..180.0_f64,
            ) {
                let a = Coordinate::new(lat1, lon1);
                let b = Coordinate::new(lat2, lon2);
                prop_assert!((haversine_distance(a, b) - haversine_distance(b, a)).abs() < 1e-6);
            }
        }
    }
}
