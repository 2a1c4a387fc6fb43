//! Simulated location feed.
//!
//! Unifies the static, jitter, circle and square behaviours behind a single
//! streamed position source.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        LocationFeed task                      │
//! │                                                               │
//! │  commands ──► FeedEngine ──► next_deadline() ──► sleep_until  │
//! │  (mpsc)         │   ▲                               │         │
//! │                 │   └──────── on_timer(now) ◄───────┘         │
//! │                 │                                             │
//! │                 ├── RouteSimulator  (tick schedule)           │
//! │                 └── JitterSampler   (broadcast schedule)      │
//! │                                                               │
//! │  on_timer ──► LocationListener::on_location_update            │
//! │  every step ──► watch<FeedSnapshot>                           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use gpsfeed::feed::{FeedConfig, FeedMode, LocationFeed};
//!
//! let feed = LocationFeed::spawn(
//!     FeedConfig::default().with_mode(FeedMode::Square),
//!     Arc::new(|lat: f64, lon: f64| println!("{lat:.6}, {lon:.6}")),
//! );
//! feed.start();
//! // ...
//! feed.dispose().await;
//! ```

mod config;
mod engine;
mod jitter;
mod mode;
mod service;

pub use config::{
    clamp_stream_hz, FeedConfig, RouteConfig, DEFAULT_CENTER, DEFAULT_CIRCLE_POINTS,
    DEFAULT_CIRCLE_RADIUS_M, DEFAULT_JITTER_RADIUS_M, DEFAULT_SQUARE_POINTS_PER_SIDE,
    DEFAULT_SQUARE_SIDE_M, DEFAULT_STREAM_HZ, MAX_STREAM_HZ, MIN_STREAM_HZ,
};
pub use engine::{FeedEngine, FeedSnapshot};
pub use jitter::JitterSampler;
pub use mode::{FeedMode, ParseModeError};
pub use service::LocationFeed;

/// Receives broadcast positions.
///
/// Called from the feed task; implementations should return quickly.
pub trait LocationListener: Send + Sync {
    fn on_location_update(&self, latitude: f64, longitude: f64);
}

impl<F> LocationListener for F
where
    F: Fn(f64, f64) + Send + Sync,
{
    fn on_location_update(&self, latitude: f64, longitude: f64) {
        self(latitude, longitude)
    }
}
