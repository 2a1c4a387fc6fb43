//! Kinematic route simulator.
//!
//! Advances a position along a closed [`Route`] in proportion to elapsed
//! wall-clock time.
//!
//! # State Machine
//!
//! ```text
//! Idle --[start(now), route.len() >= 2]--> Moving
//! Moving --[tick(now)]--> Moving (returns delay until next tick)
//! Moving --[stop()]--> Idle
//! ```
//!
//! # Timing
//!
//! Speed is normalised so that one full lap takes `lap_time` regardless of
//! the route's length. Each tick measures the actual time since the previous
//! tick instead of trusting the nominal tick interval, so late ticks do not
//! accumulate drift. Distance left over after reaching a waypoint without a
//! hold is carried into the next segment within the same tick; reaching a
//! waypoint with a hold starts the dwell and drops the remainder.
//!
//! The simulator never schedules anything itself. A stopped simulator simply
//! answers `None` to a late `tick()`, which is how a stale timer is told not
//! to reschedule.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::Route;
use crate::geo::{haversine_distance, lerp, Coordinate};

/// Wall-clock duration of one full lap of any route.
pub const DEFAULT_LAP_TIME: Duration = Duration::from_secs(30);

/// Nominal delay between ticks while travelling along a segment.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(200);

/// Simulator run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatorState {
    /// Not moving; ticks are ignored.
    Idle,
    /// Tick loop active.
    Moving,
}

/// Moves a position around a route.
#[derive(Debug, Clone)]
pub struct RouteSimulator {
    route: Route,
    lap_time: Duration,
    tick_interval: Duration,
    state: SimulatorState,
    route_index: usize,
    /// Progress between `route_index` and the next waypoint, in `[0, 1)`.
    route_fraction: f64,
    speed_mps: f64,
    position: Coordinate,
    /// Reference point for elapsed-time measurement. Pushed forward past a
    /// dwell so that hold time is not converted into travel.
    last_tick: Option<Instant>,
    dwelling: bool,
    laps_completed: u64,
}

impl RouteSimulator {
    /// Create an idle simulator positioned on the route's first waypoint.
    pub fn new(route: Route) -> Self {
        Self::with_timing(route, DEFAULT_LAP_TIME, DEFAULT_TICK_INTERVAL)
    }

    /// Create with custom lap time and tick interval.
    pub fn with_timing(route: Route, lap_time: Duration, tick_interval: Duration) -> Self {
        let position = route
            .first()
            .map(|wp| wp.coordinate)
            .unwrap_or(Coordinate::new(0.0, 0.0));
        Self {
            route,
            lap_time,
            tick_interval,
            state: SimulatorState::Idle,
            route_index: 0,
            route_fraction: 0.0,
            speed_mps: 0.0,
            position,
            last_tick: None,
            dwelling: false,
            laps_completed: 0,
        }
    }

    /// Start moving from the first waypoint.
    ///
    /// Returns the delay before the first tick (always zero), or `None` if the
    /// simulator is already moving, the route is too short to animate, or the
    /// lap time is zero. In those cases nothing changes.
    pub fn start(&mut self, now: Instant) -> Option<Duration> {
        if self.state == SimulatorState::Moving || !self.route.can_animate() {
            return None;
        }

        let total_distance = self.route.total_distance_m();
        let speed_mps = total_distance / self.lap_time.as_secs_f64();
        if !speed_mps.is_finite() {
            warn!(
                lap_time_ms = self.lap_time.as_millis() as u64,
                total_distance_m = total_distance,
                "Lap time too short to move along the route"
            );
            return None;
        }
        self.speed_mps = speed_mps;
        self.state = SimulatorState::Moving;
        self.route_index = 0;
        self.route_fraction = 0.0;
        self.laps_completed = 0;
        self.dwelling = false;
        self.last_tick = Some(now);
        self.position = self.route.wrapped(0).coordinate;

        info!(
            waypoints = self.route.len(),
            total_distance_m = format!("{:.2}", total_distance),
            speed_mps = format!("{:.2}", self.speed_mps),
            speed_kmh = format!("{:.2}", self.speed_mps * 3.6),
            "Route started"
        );

        Some(Duration::ZERO)
    }

    /// Stop moving. The position stays where it is.
    pub fn stop(&mut self) {
        if self.state == SimulatorState::Moving {
            debug!(route_index = self.route_index, "Route stopped");
        }
        self.state = SimulatorState::Idle;
        self.dwelling = false;
        self.last_tick = None;
    }

    /// Stop and swap in a new route, snapping to its first waypoint.
    pub fn replace_route(&mut self, route: Route) {
        self.stop();
        self.route = route;
        self.route_index = 0;
        self.route_fraction = 0.0;
        self.speed_mps = 0.0;
        self.laps_completed = 0;
        if let Some(first) = self.route.first() {
            self.position = first.coordinate;
        }
    }

    /// Advance the position to `now`.
    ///
    /// Returns the delay until the next tick should run, or `None` when the
    /// simulator is idle and must not be rescheduled.
    pub fn tick(&mut self, now: Instant) -> Option<Duration> {
        if self.state != SimulatorState::Moving || !self.route.can_animate() {
            return None;
        }

        let since = self.last_tick.unwrap_or(now);
        let mut budget = now.saturating_duration_since(since).as_secs_f64();
        self.last_tick = Some(now);
        self.dwelling = false;

        let len = self.route.len();
        // A route whose points all coincide would otherwise spin here forever.
        let mut hops = 0;

        loop {
            if hops > len {
                return Some(self.tick_interval);
            }

            let a = *self.route.wrapped(self.route_index);
            let b = *self.route.wrapped(self.route_index + 1);
            let distance = haversine_distance(a.coordinate, b.coordinate);

            if distance == 0.0 {
                self.advance_index();
                self.route_fraction = 0.0;
                self.position = a.coordinate;
                hops += 1;
                if a.has_hold() {
                    return Some(self.dwell(now, a.hold()));
                }
                continue;
            }

            let remaining_secs = (1.0 - self.route_fraction) * distance / self.speed_mps;
            if budget < remaining_secs {
                self.route_fraction += self.speed_mps * budget / distance;
                self.position = lerp(a.coordinate, b.coordinate, self.route_fraction);
                return Some(self.tick_interval);
            }

            budget -= remaining_secs;
            self.advance_index();
            self.route_fraction = 0.0;
            self.position = b.coordinate;
            hops = 0;

            if b.has_hold() {
                return Some(self.dwell(now, b.hold()));
            }
        }
    }

    fn advance_index(&mut self) {
        self.route_index = (self.route_index + 1) % self.route.len();
        if self.route_index == 0 {
            self.laps_completed += 1;
            debug!(laps = self.laps_completed, "Lap completed");
        }
    }

    fn dwell(&mut self, now: Instant, hold: Duration) -> Duration {
        self.dwelling = true;
        self.last_tick = Some(now + hold);
        hold
    }

    pub fn state(&self) -> SimulatorState {
        self.state
    }

    pub fn is_moving(&self) -> bool {
        self.state == SimulatorState::Moving
    }

    /// Current position.
    pub fn position(&self) -> Coordinate {
        self.position
    }

    /// Index of the waypoint the current segment starts from.
    pub fn route_index(&self) -> usize {
        self.route_index
    }

    /// Progress along the current segment, in `[0, 1)`.
    pub fn route_fraction(&self) -> f64 {
        self.route_fraction
    }

    /// Configured travel speed (route length / lap time), set on start.
    pub fn speed_mps(&self) -> f64 {
        self.speed_mps
    }

    /// Instantaneous speed: zero while idle or dwelling at a waypoint.
    pub fn velocity_mps(&self) -> f64 {
        if self.is_moving() && !self.dwelling {
            self.speed_mps
        } else {
            0.0
        }
    }

    /// Number of times the simulator has wrapped back to waypoint 0 since start.
    pub fn laps_completed(&self) -> u64 {
        self.laps_completed
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn lap_time(&self) -> Duration {
        self.lap_time
    }
}
