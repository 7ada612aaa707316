//! Light state structures exchanged with the Hue bridge.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Visible state of a light, restricted to the attributes the alarm touches.
///
/// Every attribute is optional: on reads, attributes the light does not expose are
/// absent and any other attribute the bridge reports (`alert`, `effect`,
/// `reachable`, …) is ignored. On writes, absent attributes are not sent, so a
/// `LightState` doubles as a partial patch.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LightState {
    /// On/off flag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,
    /// Brightness, 0 to 254
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bri: Option<u8>,
    /// Hue, 0 to 65535
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hue: Option<u16>,
    /// Saturation, 0 to 254
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sat: Option<u8>,
    /// CIE chromaticity coordinates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xy: Option<[f64; 2]>,
    /// Mired color temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ct: Option<u16>,
}

impl LightState {
    /// Light switched on at brightness `bri` with chromaticity `xy`.
    pub fn colored(xy: [f64; 2], bri: u8) -> Self {
        LightState {
            on: Some(true),
            bri: Some(bri),
            xy: Some(xy),
            ..LightState::default()
        }
    }
}

impl fmt::Display for LightState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // Compact json, attributes in bridge naming
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{:?}", self),
        }
    }
}

/// A light known to the bridge.
#[derive(Clone, Debug, PartialEq)]
pub struct Device {
    /// Bridge light id, `"1"`, `"2"`, …
    pub id: String,
    /// State at the time it was listed
    pub state: LightState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_ignores_unknown_attributes() {
        let json = r#"{
            "on": true, "bri": 120, "hue": 8417, "sat": 140, "effect": "none",
            "xy": [0.4, 0.4], "ct": 366, "alert": "select", "colormode": "ct",
            "mode": "homeautomation", "reachable": true
        }"#;
        let state: LightState = serde_json::from_str(json).unwrap();

        assert_eq!(
            state,
            LightState {
                on: Some(true),
                bri: Some(120),
                hue: Some(8417),
                sat: Some(140),
                xy: Some([0.4, 0.4]),
                ct: Some(366),
            }
        );
    }

    #[test]
    fn test_deserialize_dimmable_only_light() {
        let state: LightState =
            serde_json::from_str(r#"{"on": false, "bri": 254, "alert": "none"}"#).unwrap();

        assert_eq!(state.on, Some(false));
        assert_eq!(state.bri, Some(254));
        assert_eq!(state.xy, None);
        assert_eq!(state.ct, None);
    }

    #[test]
    fn test_serialize_skips_absent_attributes() {
        let state = LightState::colored([0.675, 0.322], 254);
        let json = serde_json::to_value(&state).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"on": true, "bri": 254, "xy": [0.675, 0.322]})
        );
    }

    #[test]
    fn test_display() {
        let state = LightState {
            on: Some(false),
            ..LightState::default()
        };
        assert_eq!(format!("{}", state), r#"{"on":false}"#);
    }
}
