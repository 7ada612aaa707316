//! Alert model and provider payload decoding.
//!
//! This module provides the [`Alert`] struct, the normalized form of both provider
//! payload shapes:
//!
//! - The polled snapshot from `alerts.json`: `{ "id": "133…", "data": ["city", …], … }`
//! - The pushed websocket frame: `{ "data": { "cities": ["city", …] } }`
//!
//! Decoding never fails the caller. A snapshot that cannot be decoded becomes the
//! empty alert (`id = 0`, no locations) and a frame that cannot be decoded is
//! skipped.

use std::fmt;

use log::debug;
use serde::Deserialize;

/// Identifier carried by the empty alert.
///
/// The provider answers with an empty body when nothing is going on, which is
/// decoded to an alert with this id. It never reaches the cursor.
pub const NO_ALERT_ID: u64 = 0;

/// An alert issued by the provider.
///
/// # Identity
///
/// Polled alerts always carry an id and are new only when their id is strictly
/// greater than the stored cursor. Pushed frames usually have no id, in which
/// case they bypass the cursor and are matched on their locations only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alert {
    /// Provider identifier, monotonically increasing.
    pub id: Option<u64>,
    /// Affected location names, in provider order.
    pub locations: Vec<String>,
    /// Payload as received, kept for logging.
    pub raw_payload: String,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "id={}, locations={:?}", self.label(), self.locations)
    }
}

/// Alert id as sent by the provider, either a JSON string or a number.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

impl RawId {
    fn parse(self) -> Option<u64> {
        match self {
            RawId::Number(id) => Some(id),
            RawId::Text(id) => id.trim().parse().ok(),
        }
    }
}

/// Polled snapshot, only `id` and `data` are kept.
#[derive(Deserialize)]
struct Snapshot {
    id: RawId,
    #[serde(default)]
    data: Vec<String>,
}

/// Pushed frame.
#[derive(Deserialize)]
struct Frame {
    data: FrameData,
}

#[derive(Deserialize)]
struct FrameData {
    cities: Vec<String>,
    #[serde(default)]
    id: Option<RawId>,
}

impl Alert {
    /// Returns the empty alert, meaning "nothing new".
    pub fn empty() -> Self {
        Alert {
            id: Some(NO_ALERT_ID),
            locations: vec![],
            raw_payload: String::new(),
        }
    }

    /// Whether this alert is the empty alert.
    pub fn is_empty(&self) -> bool {
        self.id == Some(NO_ALERT_ID)
    }

    /// Short identifier used in logs, `-` for alerts without id.
    pub fn label(&self) -> String {
        match self.id {
            Some(id) => id.to_string(),
            None => "-".to_owned(),
        }
    }

    /// Decodes a polled snapshot body.
    ///
    /// The provider prefixes its body with a UTF-8 byte order mark and answers
    /// with an empty body when no alert is active. Empty, malformed or id-less
    /// bodies all decode to [`Alert::empty`].
    ///
    /// # Examples
    ///
    /// ```
    /// let alert = Alert::from_snapshot(r#"{"id": "6", "data": ["אביגדור"]}"#);
    /// assert_eq!(alert.id, Some(6));
    ///
    /// assert!(Alert::from_snapshot("").is_empty());
    /// ```
    pub fn from_snapshot(body: &str) -> Self {
        let payload = body.trim_start_matches('\u{feff}').trim();
        if payload.is_empty() {
            return Alert::empty();
        }

        let snapshot: Snapshot = match serde_json::from_str(payload) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!("undecodable alert snapshot ({}): {}", e, payload);
                return Alert::empty();
            }
        };

        let Some(id) = snapshot.id.parse() else {
            debug!("alert snapshot without a numeric id: {}", payload);
            return Alert::empty();
        };

        Alert {
            id: Some(id),
            locations: snapshot.data,
            raw_payload: payload.to_owned(),
        }
    }

    /// Decodes a pushed frame, `None` when it has no `data.cities` list.
    pub fn from_frame(text: &str) -> Option<Self> {
        let frame: Frame = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(e) => {
                debug!("skipping frame without alert structure ({}): {}", e, text);
                return None;
            }
        };

        Some(Alert {
            id: frame.data.id.and_then(RawId::parse),
            locations: frame.data.cities,
            raw_payload: text.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_snapshot_with_string_id() {
        let body = r#"{"id": "133497288990000000", "cat": "1", "title": "ירי רקטות וטילים", "data": ["אביגדור", "שדרות"], "desc": "היכנסו למרחב המוגן"}"#;
        let alert = Alert::from_snapshot(body);

        assert_eq!(alert.id, Some(133497288990000000));
        assert_eq!(alert.locations, vec!["אביגדור", "שדרות"]);
        assert!(!alert.is_empty());
    }

    #[test]
    fn test_from_snapshot_with_numeric_id() {
        let alert = Alert::from_snapshot(r#"{"id": 6, "data": ["אביגדור"]}"#);
        assert_eq!(alert.id, Some(6));
        assert_eq!(alert.locations, vec!["אביגדור"]);
    }

    #[test]
    fn test_from_snapshot_strips_byte_order_mark() {
        let alert = Alert::from_snapshot("\u{feff}{\"id\": \"7\", \"data\": [\"שדרות\"]}\r\n");
        assert_eq!(alert.id, Some(7));
    }

    #[test]
    fn test_from_snapshot_empty_body() {
        assert_eq!(Alert::from_snapshot(""), Alert::empty());
        assert_eq!(Alert::from_snapshot("\u{feff}\r\n"), Alert::empty());
    }

    #[test]
    fn test_from_snapshot_malformed_body() {
        assert!(Alert::from_snapshot("{ not json").is_empty());
        assert!(Alert::from_snapshot("<html>blocked</html>").is_empty());
        assert!(Alert::from_snapshot(r#"{"data": ["אביגדור"]}"#).is_empty());
        assert!(Alert::from_snapshot(r#"{"id": "abc", "data": []}"#).is_empty());
    }

    #[test]
    fn test_from_snapshot_without_data() {
        let alert = Alert::from_snapshot(r#"{"id": "8"}"#);
        assert_eq!(alert.id, Some(8));
        assert!(alert.locations.is_empty());
    }

    #[test]
    fn test_from_frame() {
        let frame = r#"{"type": "ALERT", "data": {"cities": ["אביגדור"], "threat": 0}}"#;
        let alert = Alert::from_frame(frame).unwrap();

        assert_eq!(alert.id, None);
        assert_eq!(alert.locations, vec!["אביגדור"]);
        assert_eq!(alert.raw_payload, frame);
    }

    #[test]
    fn test_from_frame_with_id() {
        let alert = Alert::from_frame(r#"{"data": {"cities": [], "id": "42"}}"#).unwrap();
        assert_eq!(alert.id, Some(42));
    }

    #[test]
    fn test_from_frame_skips_unknown_structure() {
        assert!(Alert::from_frame("ping").is_none());
        assert!(Alert::from_frame(r#"{"type": "SYSTEM_MESSAGE"}"#).is_none());
        assert!(Alert::from_frame(r#"{"data": {"notificationId": "x"}}"#).is_none());
        assert!(Alert::from_frame(r#"{"data": "cities"}"#).is_none());
    }

    #[test]
    fn test_display() {
        let alert = Alert::from_snapshot(r#"{"id": 9, "data": ["שדרות"]}"#);
        let display = format!("{}", alert);
        assert!(display.contains("id=9"));
        assert!(display.contains("שדרות"));

        let live = Alert::from_frame(r#"{"data": {"cities": []}}"#).unwrap();
        assert!(format!("{}", live).contains("id=-"));
    }
}
