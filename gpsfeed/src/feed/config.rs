//! Location feed configuration.

use std::time::Duration;

use super::FeedMode;
use crate::geo::Coordinate;
use crate::route::{RouteShape, RouteSpec, DEFAULT_LAP_TIME, DEFAULT_TICK_INTERVAL};

/// Default route center (Hyderabad).
pub const DEFAULT_CENTER: Coordinate = Coordinate::new(17.3850, 78.4867);

/// Default circle radius: 50 miles.
pub const DEFAULT_CIRCLE_RADIUS_M: f64 = 80_467.2;

/// Default circle vertex count: one every 5 degrees.
pub const DEFAULT_CIRCLE_POINTS: usize = 72;

/// Default square side: 100 miles.
pub const DEFAULT_SQUARE_SIDE_M: f64 = 160_934.4;

/// Default square vertices per edge.
pub const DEFAULT_SQUARE_POINTS_PER_SIDE: usize = 25;

/// Default broadcast rate.
pub const DEFAULT_STREAM_HZ: u32 = 1;

/// Broadcast rate bounds.
pub const MIN_STREAM_HZ: u32 = 1;
pub const MAX_STREAM_HZ: u32 = 10;

/// Default jitter radius in metres.
pub const DEFAULT_JITTER_RADIUS_M: f64 = 10.0;

/// Clamp a requested broadcast rate into the supported range.
pub fn clamp_stream_hz(hz: u32) -> u32 {
    hz.clamp(MIN_STREAM_HZ, MAX_STREAM_HZ)
}

/// Geometry of the circle and square routes.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteConfig {
    pub center: Coordinate,
    pub circle_radius_m: f64,
    pub circle_points: usize,
    pub square_side_m: f64,
    pub square_points_per_side: usize,
    pub hold_seconds: f64,
    pub clockwise: bool,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            circle_radius_m: DEFAULT_CIRCLE_RADIUS_M,
            circle_points: DEFAULT_CIRCLE_POINTS,
            square_side_m: DEFAULT_SQUARE_SIDE_M,
            square_points_per_side: DEFAULT_SQUARE_POINTS_PER_SIDE,
            hold_seconds: 0.0,
            clockwise: true,
        }
    }
}

impl RouteConfig {
    /// The route to build for `mode`, or `None` for modes without a route.
    pub fn spec_for(&self, mode: FeedMode) -> Option<RouteSpec> {
        let shape = match mode {
            FeedMode::Circle => RouteShape::Circle {
                radius_m: self.circle_radius_m,
                points: self.circle_points,
            },
            FeedMode::Square => RouteShape::Square {
                side_m: self.square_side_m,
                points_per_side: self.square_points_per_side,
            },
            FeedMode::Static | FeedMode::Jitter => return None,
        };
        Some(RouteSpec {
            center: self.center,
            shape,
            hold_seconds: self.hold_seconds,
            clockwise: self.clockwise,
        })
    }
}

/// Configuration for a [`LocationFeed`](super::LocationFeed).
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    /// Initial mode.
    pub mode: FeedMode,
    /// Broadcast rate in Hz, clamped to [1, 10] when applied.
    pub stream_hz: u32,
    /// Noise radius for jitter mode, in metres.
    pub jitter_radius_m: f64,
    /// Position reported in static and jitter modes.
    pub base: Coordinate,
    /// Route geometry for circle and square modes.
    pub route: RouteConfig,
    /// Time for one full lap of any route.
    pub lap_time: Duration,
    /// Nominal delay between simulator ticks.
    pub tick_interval: Duration,
    /// Fixed seed for the jitter generator; `None` seeds from the OS.
    pub rng_seed: Option<u64>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            mode: FeedMode::default(),
            stream_hz: DEFAULT_STREAM_HZ,
            jitter_radius_m: DEFAULT_JITTER_RADIUS_M,
            base: DEFAULT_CENTER,
            route: RouteConfig::default(),
            lap_time: DEFAULT_LAP_TIME,
            tick_interval: DEFAULT_TICK_INTERVAL,
            rng_seed: None,
        }
    }
}

impl FeedConfig {
    /// Set the initial mode.
    pub fn with_mode(mut self, mode: FeedMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the broadcast rate (clamped).
    pub fn with_stream_hz(mut self, hz: u32) -> Self {
        self.stream_hz = clamp_stream_hz(hz);
        self
    }

    /// Use a fixed jitter seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }
}
