//! Feed state machine.
//!
//! [`FeedEngine`] holds everything a location feed needs to decide what to do
//! next, but owns no timers. It keeps two independent deadlines:
//!
//! ```text
//! next_tick       route simulator tick     (circle / square only)
//! next_broadcast  position broadcast       (every 1000 / stream_hz ms)
//! ```
//!
//! The driver sleeps until [`FeedEngine::next_deadline`] and then calls
//! [`FeedEngine::on_timer`]. Every mutation goes through `&mut self`, so a
//! single owner serializes ticks, broadcasts and control calls. A stopped
//! engine has no deadlines, which is how stale wakeups are discarded.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info};

use super::config::{clamp_stream_hz, FeedConfig, RouteConfig};
use super::jitter::JitterSampler;
use super::FeedMode;
use crate::geo::Coordinate;
use crate::route::{Route, RouteSimulator};

/// Point-in-time view of a feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedSnapshot {
    pub mode: FeedMode,
    pub streaming: bool,
    /// Route position in route modes, the base coordinate otherwise
    /// (without jitter applied).
    pub position: Coordinate,
    pub route_index: usize,
    pub velocity_mps: f64,
    pub stream_hz: u32,
    pub laps_completed: u64,
}

/// Mode dispatcher and broadcast scheduler.
#[derive(Debug)]
pub struct FeedEngine {
    mode: FeedMode,
    base: Coordinate,
    route_config: RouteConfig,
    simulator: RouteSimulator,
    streaming: bool,
    stream_hz: u32,
    jitter_radius_m: f64,
    sampler: JitterSampler,
    next_tick: Option<Instant>,
    next_broadcast: Option<Instant>,
}

impl FeedEngine {
    /// Build an engine in the configured mode, not streaming.
    pub fn new(config: FeedConfig) -> Self {
        let route = build_route(&config.route, config.mode);
        let sampler = match config.rng_seed {
            Some(seed) => JitterSampler::seeded(seed),
            None => JitterSampler::new(),
        };
        Self {
            mode: config.mode,
            base: config.base,
            simulator: RouteSimulator::with_timing(route, config.lap_time, config.tick_interval),
            route_config: config.route,
            streaming: false,
            stream_hz: clamp_stream_hz(config.stream_hz),
            jitter_radius_m: config.jitter_radius_m.max(0.0),
            sampler,
            next_tick: None,
            next_broadcast: None,
        }
    }

    /// Begin broadcasting, and moving along the route in route modes.
    ///
    /// The first broadcast is due immediately. Returns `false` without
    /// changing anything if the feed is already streaming.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.streaming {
            return false;
        }
        self.streaming = true;
        self.next_broadcast = Some(now);
        self.start_motion(now);
        info!(mode = %self.mode, stream_hz = self.stream_hz, "Location feed started");
        true
    }

    /// Cancel both schedules.
    pub fn stop(&mut self) {
        if self.streaming {
            info!(mode = %self.mode, "Location feed stopped");
        }
        self.streaming = false;
        self.simulator.stop();
        self.next_tick = None;
        self.next_broadcast = None;
    }

    /// Switch mode, rebuilding the route.
    ///
    /// Motion restarts from the new route's first waypoint when the feed is
    /// streaming. The broadcast schedule is left as it is.
    pub fn set_mode(&mut self, mode: FeedMode, now: Instant) {
        let was_streaming = self.streaming;
        self.simulator.stop();
        self.next_tick = None;
        self.simulator.replace_route(build_route(&self.route_config, mode));
        self.mode = mode;
        if was_streaming {
            self.start_motion(now);
        }
        info!(mode = %mode, streaming = was_streaming, "Feed mode changed");
    }

    /// Change the broadcast rate. Takes effect after the next broadcast.
    pub fn set_stream_hz(&mut self, hz: u32) {
        self.stream_hz = clamp_stream_hz(hz);
        debug!(stream_hz = self.stream_hz, "Stream rate changed");
    }

    pub fn set_jitter_radius(&mut self, radius_m: f64) {
        self.jitter_radius_m = radius_m.max(0.0);
    }

    /// Move the point reported in static and jitter modes.
    pub fn set_base_coordinate(&mut self, base: Coordinate) {
        self.base = base;
    }

    /// Earliest pending deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.next_tick, self.next_broadcast) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Run whatever is due at `now`.
    ///
    /// The simulator tick runs before the broadcast so a broadcast due at the
    /// same instant reports the freshly advanced position. Returns the
    /// broadcast coordinate when one was due.
    pub fn on_timer(&mut self, now: Instant) -> Option<Coordinate> {
        if self.next_tick.is_some_and(|t| t <= now) {
            self.on_tick(now);
        }
        if self.next_broadcast.is_some_and(|t| t <= now) {
            return self.on_broadcast(now);
        }
        None
    }

    /// Advance the simulator and reschedule it.
    pub fn on_tick(&mut self, now: Instant) {
        self.next_tick = if self.streaming {
            self.simulator.tick(now).map(|delay| now + delay)
        } else {
            None
        };
    }

    /// Produce the coordinate to broadcast and schedule the next broadcast.
    ///
    /// Returns `None` when the feed is not streaming.
    pub fn on_broadcast(&mut self, now: Instant) -> Option<Coordinate> {
        if !self.streaming {
            self.next_broadcast = None;
            return None;
        }
        let period = self.broadcast_period();
        // Fixed rate from the previous deadline; resync if we fell behind.
        let next = self.next_broadcast.unwrap_or(now) + period;
        self.next_broadcast = Some(if next <= now { now + period } else { next });
        Some(self.current_position())
    }

    /// The coordinate a broadcast would report right now.
    ///
    /// Draws a fresh sample in jitter mode.
    pub fn current_position(&mut self) -> Coordinate {
        match self.mode {
            FeedMode::Static => self.base,
            FeedMode::Jitter => self.sampler.sample(self.base, self.jitter_radius_m),
            FeedMode::Circle | FeedMode::Square => self.simulator.position(),
        }
    }

    pub fn broadcast_period(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.stream_hz))
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        let position = if self.mode.is_route() {
            self.simulator.position()
        } else {
            self.base
        };
        FeedSnapshot {
            mode: self.mode,
            streaming: self.streaming,
            position,
            route_index: self.simulator.route_index(),
            velocity_mps: self.velocity_mps(),
            stream_hz: self.stream_hz,
            laps_completed: self.simulator.laps_completed(),
        }
    }

    /// Current speed; zero outside route modes, while stopped or dwelling.
    pub fn velocity_mps(&self) -> f64 {
        if self.mode.is_route() {
            self.simulator.velocity_mps()
        } else {
            0.0
        }
    }

    pub fn mode(&self) -> FeedMode {
        self.mode
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn stream_hz(&self) -> u32 {
        self.stream_hz
    }

    pub fn jitter_radius_m(&self) -> f64 {
        self.jitter_radius_m
    }

    pub fn base(&self) -> Coordinate {
        self.base
    }

    pub fn simulator(&self) -> &RouteSimulator {
        &self.simulator
    }

    fn start_motion(&mut self, now: Instant) {
        if self.mode.is_route() {
            self.next_tick = self.simulator.start(now).map(|delay| now + delay);
        }
    }
}

fn build_route(config: &RouteConfig, mode: FeedMode) -> Route {
    config
        .spec_for(mode)
        .map(|spec| spec.build())
        .unwrap_or_default()
}
