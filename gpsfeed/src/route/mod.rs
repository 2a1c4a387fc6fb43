//! Route generation and kinematic simulation.
//!
//! # Architecture
//!
//! ```text
//! RouteSpec ──build()──► Route ──► RouteSimulator ──tick(now)──► position
//!  (center, shape)     (closed      (speed = length / lap time,
//!                       polyline)    next-deadline state machine)
//! ```
//!
//! The builder is pure and runs once per mode switch. The simulator owns the
//! route and all progress state; it never schedules itself. Whoever drives it
//! calls [`RouteSimulator::tick`] and receives the delay before the next call.

mod builder;
mod simulator;

pub use builder::{build_circle, build_square, square_corners, RouteShape, RouteSpec};
pub use simulator::{RouteSimulator, SimulatorState, DEFAULT_LAP_TIME, DEFAULT_TICK_INTERVAL};

use serde::Serialize;

use crate::geo::{haversine_distance, Waypoint};

/// A closed polyline of waypoints.
///
/// Generated routes repeat their first waypoint at the end. At least two
/// waypoints are needed for any motion to happen.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Route {
    waypoints: Vec<Waypoint>,
}

impl Route {
    /// Wrap a list of waypoints.
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self { waypoints }
    }

    /// Number of waypoints, including the closing repeat.
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// True when the route has enough points to move along.
    pub fn can_animate(&self) -> bool {
        self.waypoints.len() >= 2
    }

    pub fn first(&self) -> Option<&Waypoint> {
        self.waypoints.first()
    }

    pub fn last(&self) -> Option<&Waypoint> {
        self.waypoints.last()
    }

    /// Waypoint at `index` modulo the route length.
    ///
    /// # Panics
    ///
    /// Panics if the route is empty.
    pub fn wrapped(&self, index: usize) -> &Waypoint {
        &self.waypoints[index % self.waypoints.len()]
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn iter(&self) -> impl Iterator<Item = &Waypoint> {
        self.waypoints.iter()
    }

    /// Sum of great-circle distances between consecutive waypoints, in metres.
    pub fn total_distance_m(&self) -> f64 {
        self.waypoints
            .windows(2)
            .map(|pair| haversine_distance(pair[0].coordinate, pair[1].coordinate))
            .sum()
    }
}
