//! `gpsfeed route` - print a generated route as JSON.

use clap::{Args, ValueEnum};
use gpsfeed::config::ConfigFile;
use gpsfeed::route::{RouteShape, RouteSpec};

use super::common::override_coordinate;
use crate::error::CliError;

/// Route shape selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum ShapeArg {
    /// Great-circle ring around the center
    Circle,
    /// Square centered on the center
    Square,
}

#[derive(Debug, Args)]
pub struct RouteArgs {
    /// Shape to generate
    #[arg(long, value_enum, default_value = "circle")]
    pub shape: ShapeArg,

    /// Center latitude
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Center longitude
    #[arg(long, allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Circle radius in metres
    #[arg(long)]
    pub radius: Option<f64>,

    /// Circle point count
    #[arg(long)]
    pub points: Option<usize>,

    /// Square side length in metres
    #[arg(long)]
    pub side: Option<f64>,

    /// Square points per edge
    #[arg(long)]
    pub points_per_side: Option<usize>,

    /// Dwell time at every waypoint, in seconds
    #[arg(long)]
    pub hold: Option<f64>,

    /// Wind counter-clockwise
    #[arg(long)]
    pub counter_clockwise: bool,

    /// Print waypoint count and length instead of the waypoints
    #[arg(long)]
    pub summary: bool,
}

pub fn run(args: RouteArgs, config: &ConfigFile) -> Result<(), CliError> {
    let spec = build_spec(&args, config)?;
    let route = spec.build();

    if args.summary {
        let summary = serde_json::json!({
            "waypoints": route.len(),
            "totalDistanceMeters": route.total_distance_m(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&route)?);
    }
    Ok(())
}

fn build_spec(args: &RouteArgs, config: &ConfigFile) -> Result<RouteSpec, CliError> {
    let defaults = &config.feed.route;

    let shape = match args.shape {
        ShapeArg::Circle => RouteShape::Circle {
            radius_m: positive("--radius", args.radius.unwrap_or(defaults.circle_radius_m))?,
            points: args.points.unwrap_or(defaults.circle_points),
        },
        ShapeArg::Square => RouteShape::Square {
            side_m: positive("--side", args.side.unwrap_or(defaults.square_side_m))?,
            points_per_side: args
                .points_per_side
                .unwrap_or(defaults.square_points_per_side),
        },
    };

    let hold_seconds = args.hold.unwrap_or(defaults.hold_seconds);
    if hold_seconds < 0.0 {
        return Err(CliError::InvalidArgument(
            "--hold must not be negative".to_string(),
        ));
    }

    Ok(RouteSpec {
        center: override_coordinate(defaults.center, args.lat, args.lon)?,
        shape,
        hold_seconds,
        clockwise: defaults.clockwise && !args.counter_clockwise,
    })
}

fn positive(flag: &str, value: f64) -> Result<f64, CliError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(CliError::InvalidArgument(format!(
            "{} must be a positive number",
            flag
        )))
    }
}
