//! Feed mode selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the feed produces positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedMode {
    /// Fixed base coordinate.
    Static,
    /// Base coordinate with random noise inside the jitter radius.
    Jitter,
    /// Moving around a great-circle ring.
    #[default]
    Circle,
    /// Moving around a square.
    Square,
}

impl FeedMode {
    /// True for the modes that drive the route simulator.
    pub fn is_route(&self) -> bool {
        matches!(self, FeedMode::Circle | FeedMode::Square)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedMode::Static => "static",
            FeedMode::Jitter => "jitter",
            FeedMode::Circle => "circle",
            FeedMode::Square => "square",
        }
    }
}

impl fmt::Display for FeedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown mode name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown feed mode '{0}' (expected static, jitter, circle or square)")]
pub struct ParseModeError(pub String);

impl FromStr for FeedMode {
    type Err = ParseModeError;

    /// Accepts `route` as an alias for `circle`, matching the location server's naming.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "static" => Ok(FeedMode::Static),
            "jitter" => Ok(FeedMode::Jitter),
            "circle" | "route" => Ok(FeedMode::Circle),
            "square" => Ok(FeedMode::Square),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}
