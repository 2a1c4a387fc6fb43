//! Closed-loop route generation.
//!
//! Both generators produce a [`Route`] whose last waypoint repeats the first,
//! so the simulator can loop without special-casing the wrap-around.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Route;
use crate::geo::{
    destination_point, lerp, meters_to_lat_degrees, meters_to_lon_degrees, Coordinate, Waypoint,
    EARTH_RADIUS_M,
};

/// Geometric shape of a generated route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum RouteShape {
    /// Great-circle ring of `points` vertices at `radius_m` from the center.
    Circle { radius_m: f64, points: usize },
    /// Axis-aligned square of side `side_m` with `points_per_side` vertices per edge.
    Square { side_m: f64, points_per_side: usize },
}

/// Everything needed to build one route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteSpec {
    pub center: Coordinate,
    pub shape: RouteShape,
    pub hold_seconds: f64,
    pub clockwise: bool,
}

impl RouteSpec {
    /// Build the route described by this spec.
    pub fn build(&self) -> Route {
        match self.shape {
            RouteShape::Circle { radius_m, points } => build_circle(
                self.center,
                radius_m,
                points,
                self.hold_seconds,
                self.clockwise,
            ),
            RouteShape::Square {
                side_m,
                points_per_side,
            } => build_square(
                self.center,
                side_m,
                points_per_side,
                self.hold_seconds,
                self.clockwise,
            ),
        }
    }
}

/// Generate a circular route around `center`.
///
/// Places `point_count` waypoints evenly by bearing (`2π·i/n`, mirrored when
/// counter-clockwise) and appends a copy of the first one. A zero point count
/// yields an empty route, which the simulator treats as nothing to animate.
pub fn build_circle(
    center: Coordinate,
    radius_m: f64,
    point_count: usize,
    hold_seconds: f64,
    clockwise: bool,
) -> Route {
    if point_count == 0 {
        return Route::default();
    }

    let angular_distance = radius_m / EARTH_RADIUS_M;
    let mut waypoints = Vec::with_capacity(point_count + 1);

    for i in 0..point_count {
        let frac = i as f64 / point_count as f64;
        let mut bearing = TAU * frac;
        if !clockwise {
            bearing = TAU - bearing;
        }
        let point = destination_point(center, bearing, angular_distance);
        waypoints.push(Waypoint::new(point, hold_seconds));
    }

    waypoints.push(waypoints[0]);

    debug!(
        waypoints = waypoints.len(),
        radius_m, clockwise, "Generated circle route"
    );
    Route::new(waypoints)
}

/// Generate a square route centred on `center`.
///
/// Corners are placed at ± half a side converted to degrees at the center
/// latitude, starting at the north-west corner. Each edge contributes
/// `points_per_side` waypoints with `t` in `[0, 1)`, so the far corner of an
/// edge is emitted once, as the first point of the next edge.
pub fn build_square(
    center: Coordinate,
    side_m: f64,
    points_per_side: usize,
    hold_seconds: f64,
    clockwise: bool,
) -> Route {
    if points_per_side == 0 {
        return Route::default();
    }

    let corners = square_corners(center, side_m, clockwise);
    let mut waypoints = Vec::with_capacity(4 * points_per_side + 1);

    for side in 0..4 {
        let start = corners[side];
        let end = corners[(side + 1) % 4];
        for i in 0..points_per_side {
            let t = i as f64 / points_per_side as f64;
            waypoints.push(Waypoint::new(lerp(start, end, t), hold_seconds));
        }
    }

    waypoints.push(waypoints[0]);

    debug!(
        waypoints = waypoints.len(),
        side_m, clockwise, "Generated square route"
    );
    Route::new(waypoints)
}

/// The four corners of a square in traversal order, north-west first.
pub fn square_corners(center: Coordinate, side_m: f64, clockwise: bool) -> [Coordinate; 4] {
    let half_side = side_m / 2.0;
    let top = center.latitude + meters_to_lat_degrees(half_side);
    let bottom = center.latitude - meters_to_lat_degrees(half_side);
    let right = center.longitude + meters_to_lon_degrees(half_side, center.latitude);
    let left = center.longitude - meters_to_lon_degrees(half_side, center.latitude);

    if clockwise {
        [
            Coordinate::new(top, left),
            Coordinate::new(top, right),
            Coordinate::new(bottom, right),
            Coordinate::new(bottom, left),
        ]
    } else {
        [
            Coordinate::new(top, left),
            Coordinate::new(bottom, left),
            Coordinate::new(bottom, right),
            Coordinate::new(top, right),
        ]
    }
}
