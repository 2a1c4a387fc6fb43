//! Integration tests for the location feed.
//!
//! These tests drive a spawned [`LocationFeed`] on tokio's paused clock, so
//! every sleep advances virtual time deterministically:
//! - Broadcast cadence at different stream rates
//! - Lap timing along generated routes
//! - Mode switches, stop, idempotent start and dispose
//!
//! Run with: `cargo test --test location_feed`

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use gpsfeed::feed::{FeedConfig, FeedMode, LocationFeed, LocationListener};
use gpsfeed::geo::{haversine_distance, Coordinate};

// ============================================================================
// Helper Functions
// ============================================================================

/// Listener that forwards every broadcast into a channel.
fn channel_listener() -> (Arc<dyn LocationListener>, mpsc::UnboundedReceiver<Coordinate>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let listener = move |lat: f64, lon: f64| {
        let _ = tx.send(Coordinate::new(lat, lon));
    };
    (Arc::new(listener), rx)
}

/// Collect everything broadcast so far.
fn drain(rx: &mut mpsc::UnboundedReceiver<Coordinate>) -> Vec<Coordinate> {
    let mut out = Vec::new();
    while let Ok(c) = rx.try_recv() {
        out.push(c);
    }
    out
}

async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

// ============================================================================
// Cadence
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_default_rate_is_one_hertz() {
    let (listener, mut rx) = channel_listener();
    let feed = LocationFeed::spawn(FeedConfig::default().with_mode(FeedMode::Static), listener);
    feed.start();

    advance(4500).await;
    // t = 0, 1, 2, 3, 4 s
    assert_eq!(drain(&mut rx).len(), 5);

    feed.dispose().await;
}

#[tokio::test(start_paused = true)]
async fn test_four_hertz_cadence() {
    let (listener, mut rx) = channel_listener();
    let feed = LocationFeed::spawn(
        FeedConfig::default()
            .with_mode(FeedMode::Static)
            .with_stream_hz(4),
        listener,
    );
    feed.start();

    advance(1100).await;
    // t = 0, 250, 500, 750, 1000 ms
    assert_eq!(drain(&mut rx).len(), 5);
    assert_eq!(feed.snapshot().stream_hz, 4);

    feed.dispose().await;
}

#[tokio::test(start_paused = true)]
async fn test_rate_is_clamped() {
    let (listener, mut rx) = channel_listener();
    let feed = LocationFeed::spawn(FeedConfig::default().with_mode(FeedMode::Static), listener);
    feed.set_stream_hz(50);
    feed.start();

    advance(950).await;
    // 10 Hz ceiling: t = 0, 100, ..., 900 ms
    assert_eq!(drain(&mut rx).len(), 10);
    assert_eq!(feed.snapshot().stream_hz, 10);

    feed.dispose().await;
}

// ============================================================================
// Route motion
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_circle_starts_at_first_waypoint() {
    let config = FeedConfig::default().with_mode(FeedMode::Circle);
    let first = config
        .route
        .spec_for(FeedMode::Circle)
        .and_then(|spec| spec.build().first().copied())
        .map(|wp| wp.coordinate)
        .unwrap();

    let (listener, mut rx) = channel_listener();
    let feed = LocationFeed::spawn(config, listener);
    feed.start();
    advance(10).await;

    let received = drain(&mut rx);
    assert_eq!(received, vec![first]);

    feed.dispose().await;
}

#[tokio::test(start_paused = true)]
async fn test_circle_lap_takes_lap_time() {
    let config = FeedConfig::default().with_mode(FeedMode::Circle);
    let route = config.route.spec_for(FeedMode::Circle).unwrap().build();
    let expected_speed = route.total_distance_m() / config.lap_time.as_secs_f64();

    let (listener, _rx) = channel_listener();
    let feed = LocationFeed::spawn(config, listener);
    feed.start();

    advance(29_500).await;
    let snapshot = feed.snapshot();
    assert_eq!(snapshot.laps_completed, 0);
    assert!(snapshot.route_index > 0);
    assert!((feed.velocity_mps() - expected_speed).abs() < 1e-6 * expected_speed);

    advance(1_000).await;
    assert_eq!(feed.snapshot().laps_completed, 1);

    feed.dispose().await;
}

#[tokio::test(start_paused = true)]
async fn test_broadcasts_follow_the_route() {
    let (listener, mut rx) = channel_listener();
    let feed = LocationFeed::spawn(FeedConfig::default().with_mode(FeedMode::Square), listener);
    feed.start();

    advance(5_500).await;
    let received = drain(&mut rx);
    assert_eq!(received.len(), 6);
    for pair in received.windows(2) {
        assert!(haversine_distance(pair[0], pair[1]) > 0.0);
    }

    feed.dispose().await;
}

#[tokio::test(start_paused = true)]
async fn test_static_mode_reports_zero_velocity() {
    let (listener, _rx) = channel_listener();
    let feed = LocationFeed::spawn(FeedConfig::default().with_mode(FeedMode::Static), listener);
    feed.start();
    advance(2_000).await;
    assert_eq!(feed.velocity_mps(), 0.0);
    feed.dispose().await;
}

// ============================================================================
// Mode switching
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_mode_switch_restarts_on_new_route() {
    let config = FeedConfig::default().with_mode(FeedMode::Circle);
    let square_first = config
        .route
        .spec_for(FeedMode::Square)
        .and_then(|spec| spec.build().first().copied())
        .map(|wp| wp.coordinate)
        .unwrap();

    let (listener, _rx) = channel_listener();
    let feed = LocationFeed::spawn(config, listener);
    feed.start();
    advance(10_000).await;
    assert!(feed.snapshot().route_index > 0);

    feed.set_mode(FeedMode::Square);
    advance(10).await;

    let snapshot = feed.snapshot();
    assert_eq!(snapshot.mode, FeedMode::Square);
    assert!(snapshot.streaming);
    assert_eq!(snapshot.route_index, 0);
    assert_eq!(snapshot.laps_completed, 0);
    assert_eq!(snapshot.position, square_first);

    feed.dispose().await;
}

#[tokio::test(start_paused = true)]
async fn test_switch_to_static_reports_base() {
    let base = Coordinate::new(51.5, -0.12);
    let (listener, mut rx) = channel_listener();
    let feed = LocationFeed::spawn(FeedConfig::default().with_mode(FeedMode::Circle), listener);
    feed.set_base_coordinate(base);
    feed.start();
    advance(1_500).await;

    feed.set_mode(FeedMode::Static);
    drain(&mut rx);
    advance(2_000).await;

    let received = drain(&mut rx);
    assert_eq!(received, vec![base; 2]);
    assert_eq!(feed.velocity_mps(), 0.0);

    feed.dispose().await;
}

#[tokio::test(start_paused = true)]
async fn test_jitter_stays_within_radius() {
    let base = Coordinate::new(17.385, 78.4867);
    let (listener, mut rx) = channel_listener();
    let feed = LocationFeed::spawn(
        FeedConfig::default()
            .with_mode(FeedMode::Jitter)
            .with_stream_hz(10)
            .with_seed(7),
        listener,
    );
    feed.set_base_coordinate(base);
    feed.set_jitter_radius(25.0);
    feed.start();

    advance(5_000).await;
    let received = drain(&mut rx);
    assert!(received.len() >= 50);
    for c in &received {
        assert!(haversine_distance(base, *c) <= 25.0 * 1.01);
    }
    assert!(received.iter().any(|c| *c != base));

    feed.dispose().await;
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_start_is_idempotent() {
    let (listener, mut rx) = channel_listener();
    let feed = LocationFeed::spawn(FeedConfig::default().with_mode(FeedMode::Static), listener);
    feed.start();
    advance(300).await;
    feed.start();
    feed.start();

    advance(2_200).await;
    // t = 0, 1, 2 s; later start calls neither reset nor duplicate the schedule.
    assert_eq!(drain(&mut rx).len(), 3);

    feed.dispose().await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_cancels_broadcasts_and_motion() {
    let (listener, mut rx) = channel_listener();
    let feed = LocationFeed::spawn(FeedConfig::default().with_mode(FeedMode::Circle), listener);
    feed.start();
    advance(1_500).await;
    feed.stop();
    advance(10).await;

    drain(&mut rx);
    let stopped_at = feed.snapshot();
    assert!(!stopped_at.streaming);
    assert_eq!(stopped_at.velocity_mps, 0.0);

    advance(10_000).await;
    assert!(drain(&mut rx).is_empty());
    assert_eq!(feed.snapshot().position, stopped_at.position);

    feed.dispose().await;
}

#[tokio::test(start_paused = true)]
async fn test_restart_after_stop() {
    let (listener, mut rx) = channel_listener();
    let feed = LocationFeed::spawn(FeedConfig::default().with_mode(FeedMode::Static), listener);
    feed.start();
    advance(500).await;
    feed.stop();
    advance(3_000).await;
    drain(&mut rx);

    feed.start();
    advance(1_500).await;
    assert_eq!(drain(&mut rx).len(), 2);

    feed.dispose().await;
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_see_state_changes() {
    let (listener, _rx) = channel_listener();
    let feed = LocationFeed::spawn(FeedConfig::default(), listener);
    let mut snapshots = feed.subscribe();
    assert!(!snapshots.borrow_and_update().streaming);

    feed.start();
    snapshots.changed().await.unwrap();
    assert!(snapshots.borrow_and_update().streaming);

    feed.dispose().await;
    assert!(!snapshots.borrow().streaming);
}
