//! HTTP client for the Philips Hue bridge.
//!
//! This module provides the [`DeviceRegistry`] trait, the view the effect
//! orchestrator has of the lights, and its [`HueBridge`] implementation over the
//! bridge's v1 REST api.

use std::{collections::BTreeMap, future::Future};

use log::debug;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

use crate::hue::{Device, HueError, LightState};

/// Lights reachable through a lighting controller.
///
/// The controller is the single source of truth: implementations do not cache,
/// every read reflects the live state at call time.
pub trait DeviceRegistry: Send + Sync + 'static {
    /// Lists every light with its current state.
    fn list_devices(&self) -> impl Future<Output = Result<Vec<Device>, HueError>> + Send;

    /// Reads the current state of one light.
    fn get_visible_state(
        &self,
        device_id: &str,
    ) -> impl Future<Output = Result<LightState, HueError>> + Send;

    /// Applies the attributes present in `attributes` to one light.
    ///
    /// The controller may apply some attributes and refuse others.
    fn set_state(
        &self,
        device_id: &str,
        attributes: &LightState,
    ) -> impl Future<Output = Result<(), HueError>> + Send;
}

/// Light entry of `/lights` and `/lights/{id}`.
#[derive(Deserialize)]
struct LightResponse {
    state: LightState,
}

/// Client of one Hue bridge.
///
/// # Examples
///
/// ```no_run
/// let bridge = HueBridge::new("192.168.1.20", "bridge-username");
/// for device in bridge.list_devices().await? {
///     println!("light {} -> {}", device.id, device.state);
/// }
/// ```
pub struct HueBridge {
    /// `http://{address}/api/{username}`
    base_url: String,
    /// HTTP client
    client: Client,
}

impl HueBridge {
    /// Create a new [HueBridge].
    ///
    /// # Arguments
    ///
    /// * `address` - Bridge address, a bare host (`192.168.1.20`) or a url (`http://host:port`).
    /// * `username` - Whitelisted bridge username.
    pub fn new(address: &str, username: &str) -> Self {
        let address = address.trim_end_matches('/');
        let base_url = if address.starts_with("http://") || address.starts_with("https://") {
            format!("{}/api/{}", address, username)
        } else {
            format!("http://{}/api/{}", address, username)
        };

        HueBridge {
            base_url,
            client: Client::new(),
        }
    }

    /// Decodes a bridge reply, turning `[{"error": {...}}]` bodies into [`HueError::Bridge`].
    async fn read_reply<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, HueError> {
        let value: Value = response.error_for_status()?.json().await?;

        if let Some(description) = bridge_error(&value) {
            return Err(HueError::Bridge { description });
        }

        Ok(serde_json::from_value(value)?)
    }
}

/// First error description of a bridge reply, if any.
///
/// The bridge answers `200 OK` even when it refuses a request, with a list of
/// `{"error": {"type": 7, "address": "...", "description": "..."}}` entries.
fn bridge_error(value: &Value) -> Option<String> {
    value.as_array()?.iter().find_map(|entry| {
        let error = entry.get("error")?;
        Some(
            error
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("unknown bridge error")
                .to_owned(),
        )
    })
}

impl DeviceRegistry for HueBridge {
    /// Request `/lights`, a json object keyed by light id.
    async fn list_devices(&self) -> Result<Vec<Device>, HueError> {
        let url = format!("{}/lights", &self.base_url);
        debug!("request lights");

        let lights: BTreeMap<String, LightResponse> =
            Self::read_reply(self.client.get(&url).send().await?).await?;

        Ok(lights
            .into_iter()
            .map(|(id, light)| Device {
                id,
                state: light.state,
            })
            .collect())
    }

    async fn get_visible_state(&self, device_id: &str) -> Result<LightState, HueError> {
        let url = format!("{}/lights/{}", &self.base_url, device_id);
        debug!("request state of light {}", device_id);

        let light: LightResponse = Self::read_reply(self.client.get(&url).send().await?).await?;

        Ok(light.state)
    }

    async fn set_state(&self, device_id: &str, attributes: &LightState) -> Result<(), HueError> {
        let url = format!("{}/lights/{}/state", &self.base_url, device_id);
        debug!("set light {} to {}", device_id, attributes);

        let _: Value = Self::read_reply(self.client.put(&url).json(attributes).send().await?).await?;

        Ok(())
    }
}
