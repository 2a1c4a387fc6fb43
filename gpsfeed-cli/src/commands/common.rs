//! Common types and utilities shared across CLI commands.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use gpsfeed::config::ConfigFile;
use gpsfeed::geo::Coordinate;
use gpsfeed::logging::{self, LoggingGuard};

use crate::error::CliError;

/// Load the config file given with `--config`, or the default one.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let config = match path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    Ok(config)
}

/// Install a subscriber: file + stdout with `--log-file`, stderr otherwise.
pub fn init_logging(
    log_file: Option<&Path>,
    verbose: bool,
) -> Result<Option<LoggingGuard>, CliError> {
    let Some(path) = log_file else {
        logging::init_console_logging(verbose);
        return Ok(None);
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new(logging::DEFAULT_LOG_DIR));
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(logging::DEFAULT_LOG_FILE);

    logging::init_logging(dir, name)
        .map(Some)
        .map_err(CliError::LoggingInit)
}

/// Build a multi-threaded runtime and block on `future`.
pub fn block_on<F: Future>(future: F) -> Result<F::Output, CliError> {
    let runtime = tokio::runtime::Runtime::new().map_err(CliError::Runtime)?;
    Ok(runtime.block_on(future))
}

/// Combine optional `--lat`/`--lon` overrides with a configured coordinate.
pub fn override_coordinate(
    base: Coordinate,
    lat: Option<f64>,
    lon: Option<f64>,
) -> Result<Coordinate, CliError> {
    Coordinate::new(lat.unwrap_or(base.latitude), lon.unwrap_or(base.longitude))
        .validated()
        .map_err(|e| CliError::InvalidArgument(e.to_string()))
}

/// Wait for Ctrl-C, or until `limit` elapses when one is given.
pub async fn wait_for_exit(limit: Option<Duration>) {
    let limit = async {
        match limit {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Ctrl-C handler failed");
            }
        }
        _ = limit => {}
    }
}

/// Parse a non-negative duration in seconds.
pub fn parse_seconds(s: &str) -> Result<Duration, String> {
    let secs: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a number of seconds", s))?;
    Duration::try_from_secs_f64(secs).map_err(|_| format!("'{}' is not a valid duration", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_coordinate() {
        let base = Coordinate::new(1.0, 2.0);
        assert_eq!(
            override_coordinate(base, None, Some(5.0)).unwrap(),
            Coordinate::new(1.0, 5.0)
        );
        assert!(override_coordinate(base, Some(95.0), None).is_err());
    }

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_seconds("2.5").unwrap(), Duration::from_millis(2500));
        assert!(parse_seconds("-1").is_err());
        assert!(parse_seconds("soon").is_err());
    }
}
