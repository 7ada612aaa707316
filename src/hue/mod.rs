//! Philips Hue lights.
//!
//! - `state` - [`LightState`] and [`Device`], the attributes read and written on lights
//! - `bridge` - [`DeviceRegistry`] and its bridge implementation [`HueBridge`]

mod bridge;
mod state;

pub use crate::hue::bridge::{DeviceRegistry, HueBridge};
pub use crate::hue::state::{Device, LightState};

use thiserror::Error;

/// Errors talking to the lighting controller.
#[derive(Debug, Error)]
pub enum HueError {
    /// The bridge could not be reached or answered with an error status.
    #[error("bridge unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The bridge refused the request.
    #[error("bridge refused request: {description}")]
    Bridge {
        /// Bridge error description
        description: String,
    },

    /// The bridge reply did not have the expected shape.
    #[error("unexpected bridge reply: {0}")]
    Decode(#[from] serde_json::Error),
}
