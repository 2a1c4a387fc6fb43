//! Wire protocol of the location server.
//!
//! # Inbound frames
//!
//! ```text
//! {"type":"location","payload":{"latitude":..,"longitude":..}}  -> Location
//! {"type":"status","message":".."}                               -> Status
//! {"type":"error","message":".."}                                -> Error
//! {"type":"health","mode":"..","clients":N}                      -> Health
//! {"latitude":..,"longitude":..}                                 -> Location (legacy)
//! {"lat":..,"lon":..}                                            -> Location (legacy)
//! anything else                                                  -> Unrecognized
//! ```
//!
//! Decoding is separate from reacting: [`StreamMessage::decode`] only turns
//! text into a variant, the client decides what each variant triggers.

use serde::Serialize;
use serde_json::{Map, Value};

use super::error::MessageError;
use crate::feed::FeedMode;
use crate::geo::{Coordinate, Waypoint};

/// Default text when a status frame carries no message.
pub const DEFAULT_STATUS_TEXT: &str = "Status received";

/// Default text when an error frame carries no message.
pub const DEFAULT_ERROR_TEXT: &str = "Unknown error";

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    Location(Coordinate),
    Status { message: String },
    Error { message: String },
    Health { mode: String, clients: u64 },
    Unrecognized,
}

type Object = Map<String, Value>;

impl StreamMessage {
    /// Decode a text frame.
    ///
    /// Fails when the frame is not a JSON object, or when it is recognizably
    /// a location frame whose coordinates cannot be read.
    pub fn decode(text: &str) -> Result<Self, MessageError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| MessageError::MalformedJson(e.to_string()))?;
        let Value::Object(json) = value else {
            return Err(MessageError::MalformedJson(
                "expected a JSON object".to_string(),
            ));
        };

        match json.get("type").and_then(Value::as_str).unwrap_or("") {
            "location" => {
                let payload = match json.get("payload") {
                    Some(Value::Object(payload)) => payload,
                    Some(_) => {
                        return Err(MessageError::InvalidField {
                            field: "payload",
                            reason: "expected an object".to_string(),
                        })
                    }
                    None => return Err(MessageError::MissingField("payload")),
                };
                read_coordinate(payload, "latitude", "longitude").map(StreamMessage::Location)
            }
            "status" => Ok(StreamMessage::Status {
                message: string_or(&json, "message", DEFAULT_STATUS_TEXT),
            }),
            "error" => Ok(StreamMessage::Error {
                message: string_or(&json, "message", DEFAULT_ERROR_TEXT),
            }),
            "health" => Ok(StreamMessage::Health {
                mode: string_or(&json, "mode", "unknown"),
                clients: json.get("clients").and_then(Value::as_u64).unwrap_or(0),
            }),
            _ if json.contains_key("latitude") && json.contains_key("longitude") => {
                read_coordinate(&json, "latitude", "longitude").map(StreamMessage::Location)
            }
            _ if json.contains_key("lat") && json.contains_key("lon") => {
                read_coordinate(&json, "lat", "lon").map(StreamMessage::Location)
            }
            _ => Ok(StreamMessage::Unrecognized),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StreamMessage::Location(_) => "location",
            StreamMessage::Status { .. } => "status",
            StreamMessage::Error { .. } => "error",
            StreamMessage::Health { .. } => "health",
            StreamMessage::Unrecognized => "unrecognized",
        }
    }
}

fn string_or(json: &Object, key: &str, default: &str) -> String {
    json.get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

fn read_f64(json: &Object, key: &'static str) -> Result<f64, MessageError> {
    match json.get(key) {
        Some(value) => value.as_f64().ok_or_else(|| MessageError::InvalidField {
            field: key,
            reason: format!("expected a number, got {}", value),
        }),
        None => Err(MessageError::MissingField(key)),
    }
}

fn read_coordinate(
    json: &Object,
    lat_key: &'static str,
    lon_key: &'static str,
) -> Result<Coordinate, MessageError> {
    let coordinate = Coordinate::new(read_f64(json, lat_key)?, read_f64(json, lon_key)?);
    coordinate
        .validated()
        .map_err(|e| MessageError::InvalidField {
            field: if coordinate.latitude.abs() > 90.0 {
                lat_key
            } else {
                lon_key
            },
            reason: e.to_string(),
        })
}

// =============================================================================
// Outbound commands
// =============================================================================

/// Control messages understood by the location server.
///
/// Serialized as a JSON object tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientCommand {
    /// Start streaming at `hz` updates per second.
    Subscribe { hz: u32 },

    /// Switch the server's feed mode (`static`, `jitter`, `route`, `square`).
    SetMode { mode: String },

    /// Set the server's base coordinate.
    SetCoords { latitude: f64, longitude: f64 },

    /// Set the server's jitter radius.
    SetJitter { meters: f64 },

    /// Load an explicit route.
    SetRoute {
        route: Vec<Waypoint>,
        #[serde(skip_serializing_if = "Option::is_none")]
        speed: Option<f64>,
    },

    /// Ask the server to generate a circular route.
    #[serde(rename_all = "camelCase")]
    SetCircleRoute {
        center_lat: f64,
        center_lon: f64,
        radius_meters: f64,
        points: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        speed: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        clockwise: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        hold_seconds: Option<f64>,
    },

    /// Request a health frame.
    Health,
}

impl ClientCommand {
    /// Mode switch using the server's naming, where the circle route is `route`.
    pub fn set_mode(mode: FeedMode) -> Self {
        let name = match mode {
            FeedMode::Circle => "route",
            other => other.as_str(),
        };
        ClientCommand::SetMode {
            mode: name.to_string(),
        }
    }

    pub fn set_coords(coordinate: Coordinate) -> Self {
        ClientCommand::SetCoords {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
        }
    }

    pub fn to_json(&self) -> Result<String, MessageError> {
        serde_json::to_string(self).map_err(|e| MessageError::MalformedJson(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(text: &str) -> StreamMessage {
        match StreamMessage::decode(text) {
            Ok(message) => message,
            Err(e) => panic!("decode failed for {}: {}", text, e),
        }
    }

    #[test]
    fn test_decode_tagged_location() {
        let msg = decode(r#"{"type":"location","payload":{"latitude":10,"longitude":20,"mode":"route"}}"#);
        assert_eq!(msg, StreamMessage::Location(Coordinate::new(10.0, 20.0)));
    }

    #[test]
    fn test_decode_legacy_locations() {
        assert_eq!(
            decode(r#"{"latitude":30,"longitude":40}"#),
            StreamMessage::Location(Coordinate::new(30.0, 40.0))
        );
        assert_eq!(
            decode(r#"{"lat":-1.5,"lon":2.25}"#),
            StreamMessage::Location(Coordinate::new(-1.5, 2.25))
        );
    }

    #[test]
    fn test_decode_status_error_health() {
        assert_eq!(
            decode(r#"{"type":"status","ok":true,"message":"mode=static"}"#),
            StreamMessage::Status {
                message: "mode=static".into()
            }
        );
        assert_eq!(
            decode(r#"{"type":"status"}"#),
            StreamMessage::Status {
                message: DEFAULT_STATUS_TEXT.into()
            }
        );
        assert_eq!(
            decode(r#"{"type":"error","message":"boom"}"#),
            StreamMessage::Error {
                message: "boom".into()
            }
        );
        assert_eq!(
            decode(r#"{"type":"error"}"#),
            StreamMessage::Error {
                message: DEFAULT_ERROR_TEXT.into()
            }
        );
        assert_eq!(
            decode(r#"{"type":"health","mode":"jitter","clients":3}"#),
            StreamMessage::Health {
                mode: "jitter".into(),
                clients: 3
            }
        );
        assert_eq!(
            decode(r#"{"type":"health"}"#),
            StreamMessage::Health {
                mode: "unknown".into(),
                clients: 0
            }
        );
    }

    #[test]
    fn test_decode_unrecognized() {
        assert_eq!(decode(r#"{"type":"pong"}"#), StreamMessage::Unrecognized);
        assert_eq!(decode(r#"{"latitude":1}"#), StreamMessage::Unrecognized);
        assert_eq!(decode("{}"), StreamMessage::Unrecognized);
    }

    #[test]
    fn test_unknown_type_falls_back_to_coordinates() {
        assert_eq!(
            decode(r#"{"type":"fix","latitude":1,"longitude":2}"#),
            StreamMessage::Location(Coordinate::new(1.0, 2.0))
        );
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(
            StreamMessage::decode("not json"),
            Err(MessageError::MalformedJson(_))
        ));
        assert!(matches!(
            StreamMessage::decode("[1,2]"),
            Err(MessageError::MalformedJson(_))
        ));
        assert!(matches!(
            StreamMessage::decode(r#"{"type":"location"}"#),
            Err(MessageError::MissingField("payload"))
        ));
        assert!(matches!(
            StreamMessage::decode(r#"{"type":"location","payload":{"latitude":1}}"#),
            Err(MessageError::MissingField("longitude"))
        ));
        assert!(matches!(
            StreamMessage::decode(r#"{"latitude":"north","longitude":2}"#),
            Err(MessageError::InvalidField {
                field: "latitude",
                ..
            })
        ));
        assert!(matches!(
            StreamMessage::decode(r#"{"lat":10,"lon":200}"#),
            Err(MessageError::InvalidField { field: "lon", .. })
        ));
    }

    #[test]
    fn test_command_serialization() {
        let to_value = |c: ClientCommand| serde_json::to_value(c).unwrap_or_default();

        assert_eq!(
            to_value(ClientCommand::Subscribe { hz: 1 }),
            json!({"type": "subscribe", "hz": 1})
        );
        assert_eq!(
            to_value(ClientCommand::set_mode(FeedMode::Circle)),
            json!({"type": "setMode", "mode": "route"})
        );
        assert_eq!(
            to_value(ClientCommand::set_coords(Coordinate::new(12.34, 56.78))),
            json!({"type": "setCoords", "latitude": 12.34, "longitude": 56.78})
        );
        assert_eq!(
            to_value(ClientCommand::SetJitter { meters: 25.0 }),
            json!({"type": "setJitter", "meters": 25.0})
        );
        assert_eq!(to_value(ClientCommand::Health), json!({"type": "health"}));
        assert_eq!(
            to_value(ClientCommand::SetCircleRoute {
                center_lat: 17.385,
                center_lon: 78.4867,
                radius_meters: 300.0,
                points: 60,
                speed: Some(5.0),
                clockwise: None,
                hold_seconds: None,
            }),
            json!({
                "type": "setCircleRoute",
                "centerLat": 17.385,
                "centerLon": 78.4867,
                "radiusMeters": 300.0,
                "points": 60,
                "speed": 5.0
            })
        );
        assert_eq!(
            to_value(ClientCommand::SetRoute {
                route: vec![Waypoint::new(Coordinate::new(1.0, 2.0), 0.0)],
                speed: None,
            }),
            json!({
                "type": "setRoute",
                "route": [{"latitude": 1.0, "longitude": 2.0, "holdSeconds": 0.0}]
            })
        );
    }
}
