//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.
//!
//! ```ini
//! [feed]
//! mode = circle            ; static | jitter | circle | square
//! stream_hz = 1            ; clamped to 1..=10
//! jitter_radius_m = 10
//! base_latitude = 17.3850
//! base_longitude = 78.4867
//! lap_seconds = 30
//! tick_ms = 200
//! seed = 42                ; optional, fixed jitter seed
//!
//! [route]
//! center_latitude = 17.3850
//! center_longitude = 78.4867
//! circle_radius_m = 80467.2
//! circle_points = 72
//! square_side_m = 160934.4
//! square_points_per_side = 25
//! hold_seconds = 0         ; 0..=86400
//! clockwise = true
//!
//! [stream]
//! endpoint = ws://localhost:3000/getCoordinates
//! reconnect_delay_ms = 5000 ; > 0
//! connect_timeout_secs = 10
//! keepalive_secs = 30      ; 0 disables pings
//! subscribe_hz = 1
//! ```

use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};

use super::file::{ConfigFile, ConfigFileError};
use crate::feed::clamp_stream_hz;
use crate::geo::{MAX_HOLD_SECONDS, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [feed] section
    if let Some(section) = ini.section(Some("feed")) {
        let s = Section::new("feed", section);
        if let Some(v) = section.get("mode") {
            config.feed.mode = v
                .parse()
                .map_err(|_| s.invalid("mode", v, "must be one of: static, jitter, circle, square"))?;
        }
        if let Some(hz) = s.parse::<u32>("stream_hz", "must be a positive integer (Hz)")? {
            config.feed.stream_hz = clamp_stream_hz(hz);
        }
        if let Some(r) = s.non_negative("jitter_radius_m")? {
            config.feed.jitter_radius_m = r;
        }
        if let Some(lat) = s.latitude("base_latitude")? {
            config.feed.base.latitude = lat;
        }
        if let Some(lon) = s.longitude("base_longitude")? {
            config.feed.base.longitude = lon;
        }
        if let Some(lap) = s.duration("lap_seconds")? {
            config.feed.lap_time = lap;
        }
        if let Some(ms) = s.parse::<u64>("tick_ms", "must be a positive integer (milliseconds)")? {
            if ms == 0 {
                return Err(s.invalid("tick_ms", "0", "must be greater than zero"));
            }
            config.feed.tick_interval = Duration::from_millis(ms);
        }
        if let Some(seed) = s.parse::<u64>("seed", "must be an unsigned integer")? {
            config.feed.rng_seed = Some(seed);
        }
    }

    // [route] section
    if let Some(section) = ini.section(Some("route")) {
        let s = Section::new("route", section);
        let route = &mut config.feed.route;
        if let Some(lat) = s.latitude("center_latitude")? {
            route.center.latitude = lat;
        }
        if let Some(lon) = s.longitude("center_longitude")? {
            route.center.longitude = lon;
        }
        if let Some(r) = s.positive("circle_radius_m")? {
            route.circle_radius_m = r;
        }
        if let Some(n) = s.parse::<usize>("circle_points", "must be a non-negative integer")? {
            route.circle_points = n;
        }
        if let Some(side) = s.positive("square_side_m")? {
            route.square_side_m = side;
        }
        if let Some(n) =
            s.parse::<usize>("square_points_per_side", "must be a non-negative integer")?
        {
            route.square_points_per_side = n;
        }
        if let Some(hold) = s.ranged(
            "hold_seconds",
            |v| (0.0..=MAX_HOLD_SECONDS).contains(&v),
            "must be between 0 and 86400 seconds",
        )? {
            route.hold_seconds = hold;
        }
        if let Some(v) = section.get("clockwise") {
            route.clockwise = parse_bool(v)
                .ok_or_else(|| s.invalid("clockwise", v, "must be true or false"))?;
        }
    }

    // [stream] section
    if let Some(section) = ini.section(Some("stream")) {
        let s = Section::new("stream", section);
        if let Some(v) = section.get("endpoint") {
            let v = v.trim();
            if !v.is_empty() {
                config.stream.endpoint = v.to_string();
            }
        }
        if let Some(ms) =
            s.parse::<u64>("reconnect_delay_ms", "must be a positive integer (milliseconds)")?
        {
            if ms == 0 {
                return Err(s.invalid("reconnect_delay_ms", "0", "must be greater than zero"));
            }
            config.stream.reconnect_delay = Duration::from_millis(ms);
        }
        if let Some(secs) =
            s.parse::<u64>("connect_timeout_secs", "must be a positive integer (seconds)")?
        {
            config.stream.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = s.parse::<u64>("keepalive_secs", "must be an integer (seconds)")? {
            config.stream.keepalive_interval = Duration::from_secs(secs);
        }
        if let Some(hz) = s.parse::<u32>("subscribe_hz", "must be a positive integer (Hz)")? {
            config.stream.subscribe_hz = hz.max(1);
        }
    }

    Ok(config)
}

/// A named INI section with typed accessors.
struct Section<'a> {
    name: &'static str,
    props: &'a Properties,
}

impl<'a> Section<'a> {
    fn new(name: &'static str, props: &'a Properties) -> Self {
        Self { name, props }
    }

    fn invalid(&self, key: &str, value: &str, reason: &str) -> ConfigFileError {
        ConfigFileError::InvalidValue {
            section: self.name.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    fn parse<T: FromStr>(&self, key: &str, reason: &str) -> Result<Option<T>, ConfigFileError> {
        match self.props.get(key) {
            Some(v) => v
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| self.invalid(key, v, reason)),
            None => Ok(None),
        }
    }

    fn ranged(
        &self,
        key: &str,
        accept: impl Fn(f64) -> bool,
        reason: &str,
    ) -> Result<Option<f64>, ConfigFileError> {
        match self.parse::<f64>(key, reason)? {
            Some(v) if v.is_finite() && accept(v) => Ok(Some(v)),
            Some(v) => Err(self.invalid(key, &v.to_string(), reason)),
            None => Ok(None),
        }
    }

    fn latitude(&self, key: &str) -> Result<Option<f64>, ConfigFileError> {
        self.ranged(
            key,
            |v| (MIN_LAT..=MAX_LAT).contains(&v),
            "must be a latitude between -90 and 90",
        )
    }

    fn longitude(&self, key: &str) -> Result<Option<f64>, ConfigFileError> {
        self.ranged(
            key,
            |v| (MIN_LON..=MAX_LON).contains(&v),
            "must be a longitude between -180 and 180",
        )
    }

    fn positive(&self, key: &str) -> Result<Option<f64>, ConfigFileError> {
        self.ranged(key, |v| v > 0.0, "must be a positive number")
    }

    /// A positive number of seconds that converts to a non-zero `Duration`.
    fn duration(&self, key: &str) -> Result<Option<Duration>, ConfigFileError> {
        let reason = "must be a positive number of seconds";
        match self.ranged(key, |v| v > 0.0, reason)? {
            Some(secs) => match Duration::try_from_secs_f64(secs) {
                Ok(d) if !d.is_zero() => Ok(Some(d)),
                _ => Err(self.invalid(key, &secs.to_string(), reason)),
            },
            None => Ok(None),
        }
    }

    fn non_negative(&self, key: &str) -> Result<Option<f64>, ConfigFileError> {
        self.ranged(key, |v| v >= 0.0, "must be zero or a positive number")
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}
