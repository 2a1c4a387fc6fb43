//! GpsFeed - simulated and relayed GPS location feeds
//!
//! This library produces a continuous stream of coordinates for a map
//! display, either synthesized along a geometric path or received from a
//! remote location server.
//!
//! # Modules
//!
//! - [`geo`] - spherical-earth distance, offset and interpolation helpers
//! - [`route`] - circle/square route builders and the kinematic simulator
//! - [`feed`] - the [`LocationFeed`](feed::LocationFeed) mode dispatcher
//! - [`stream`] - the [`StreamingLocationClient`](stream::StreamingLocationClient)
//! - [`config`] - INI configuration file
//! - [`logging`] - tracing subscriber setup

pub mod config;
pub mod feed;
pub mod geo;
pub mod logging;
pub mod route;
pub mod stream;

mod timer;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
