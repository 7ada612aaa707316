//! Colors and timings of the alarm effect.

use std::time::Duration;

use crate::{config, hue::LightState};

/// Saturated red, CIE xy.
pub const ALARM_XY: [f64; 2] = [0.675, 0.322];

/// D65 white, CIE xy.
pub const SECONDARY_XY: [f64; 2] = [0.3227, 0.3290];

/// Full brightness.
pub const FULL_BRIGHTNESS: u8 = 254;

/// Script every light runs during an effect.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectPlan {
    /// First color of each blink
    pub alarm: LightState,
    /// Second color of each blink, left on while dwelling
    pub secondary: LightState,
    /// Number of blinks
    pub blinks: u8,
    /// Pause after each color change
    pub blink_interval: Duration,
    /// Pause before the captured state is restored
    pub dwell: Duration,
}

impl Default for EffectPlan {
    fn default() -> Self {
        EffectPlan::from(&config::Effect::default())
    }
}

impl From<&config::Effect> for EffectPlan {
    fn from(effect: &config::Effect) -> Self {
        EffectPlan {
            alarm: LightState::colored(ALARM_XY, FULL_BRIGHTNESS),
            secondary: LightState::colored(SECONDARY_XY, FULL_BRIGHTNESS),
            blinks: effect.blinks,
            blink_interval: Duration::from_secs(effect.blink_interval),
            dwell: Duration::from_secs(effect.dwell),
        }
    }
}
