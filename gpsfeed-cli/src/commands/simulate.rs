//! `gpsfeed simulate` - run a location feed and print its broadcasts.

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use gpsfeed::config::ConfigFile;
use gpsfeed::feed::{FeedMode, LocationFeed};

use super::common::{override_coordinate, parse_seconds, wait_for_exit};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Feed mode: static, jitter, circle or square
    #[arg(long)]
    pub mode: Option<FeedMode>,

    /// Broadcasts per second (1-10)
    #[arg(long)]
    pub hz: Option<u32>,

    /// Base latitude for static/jitter modes
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Base longitude for static/jitter modes
    #[arg(long, allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Jitter radius in metres
    #[arg(long)]
    pub jitter: Option<f64>,

    /// Fixed random seed for jitter
    #[arg(long)]
    pub seed: Option<u64>,

    /// Stop after this many seconds (default: run until Ctrl-C)
    #[arg(long, value_parser = parse_seconds)]
    pub duration: Option<Duration>,

    /// Print each update as a JSON object
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: SimulateArgs, config: &ConfigFile) -> Result<(), CliError> {
    let mut feed_config = config.feed_config();
    if let Some(mode) = args.mode {
        feed_config.mode = mode;
    }
    if let Some(hz) = args.hz {
        feed_config = feed_config.with_stream_hz(hz);
    }
    if let Some(radius) = args.jitter {
        if radius < 0.0 {
            return Err(CliError::InvalidArgument(
                "--jitter must not be negative".to_string(),
            ));
        }
        feed_config.jitter_radius_m = radius;
    }
    if let Some(seed) = args.seed {
        feed_config = feed_config.with_seed(seed);
    }
    feed_config.base = override_coordinate(feed_config.base, args.lat, args.lon)?;

    tracing::info!(
        mode = %feed_config.mode,
        stream_hz = feed_config.stream_hz,
        base = %feed_config.base,
        "Starting simulation"
    );

    let json = args.json;
    let feed = LocationFeed::spawn(
        feed_config,
        Arc::new(move |latitude: f64, longitude: f64| {
            if json {
                println!(
                    "{}",
                    serde_json::json!({ "latitude": latitude, "longitude": longitude })
                );
            } else {
                println!("{:.6}, {:.6}", latitude, longitude);
            }
        }),
    );
    feed.start();

    wait_for_exit(args.duration).await;

    let snapshot = feed.snapshot();
    feed.dispose().await;

    tracing::info!(
        laps = snapshot.laps_completed,
        route_index = snapshot.route_index,
        "Simulation finished"
    );
    Ok(())
}
