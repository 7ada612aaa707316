//! Configuration file structures for red-alert.
//!
//! The configuration is read from a YAML file and can be overridden with
//! environment variables prefixed with `RED_ALERT_`, nested keys being separated
//! by a double underscore (`RED_ALERT_HUE__USERNAME`).
//!
//! # Configuration File Format
//!
//! ```yaml
//! # Home Front Command feed
//! oref:
//!   # "poll" the alerts.json snapshot or "push" over a websocket
//!   feed: poll
//!   alerts_url: "https://www.oref.org.il/WarningMessages/alert/alerts.json"
//!   # Seconds between two polls
//!   polling_interval: 1
//!   # Only used by the push feed
//!   push_url: "wss://ws.tzevaadom.co.il/socket?platform=WEB"
//!   origin: "https://www.tzevaadom.co.il"
//!
//! # City whose alerts trigger the lights
//! watch:
//!   city: "אביגדור"
//!
//! # Philips Hue bridge
//! hue:
//!   address: "192.168.1.20"
//!   username: "bridge-username"
//!
//! # Optional WLED strip blinking along the lights
//! wled:
//!   url: "http://wled.local"
//!
//! # Optional effect tuning, durations in seconds
//! effect:
//!   blinks: 3
//!   blink_interval: 1
//!   dwell: 180
//! ```

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::Deserialize;

/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "RED_ALERT_";

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Alert provider settings
    #[serde(default)]
    pub oref: Oref,
    /// Watched city
    #[serde(default)]
    pub watch: Watch,
    /// Hue bridge credentials
    pub hue: Hue,
    /// Companion WLED strip
    #[serde(default)]
    pub wled: Option<Wled>,
    /// Effect timings
    #[serde(default)]
    pub effect: Effect,
}

impl Config {
    /// Loads the configuration from the YAML file at `path` and the environment.
    ///
    /// Environment variables take precedence over the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is not valid YAML or a required value
    /// (`hue.address`, `hue.username`) is missing.
    pub fn load(path: impl AsRef<Path>) -> Result<Config, figment::Error> {
        Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
    }

    /// Same as [`Config::load`], from YAML content already read.
    pub fn parse(yaml: &str) -> Result<Config, figment::Error> {
        Figment::new()
            .merge(Yaml::string(yaml))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
    }
}

/// Alert feed strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feed {
    /// Fetch the snapshot every `polling_interval` seconds
    #[default]
    Poll,
    /// Keep a websocket open on `push_url`
    Push,
}

/// Home Front Command provider settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Oref {
    /// Feed strategy
    pub feed: Feed,
    /// Snapshot url, polling feed
    pub alerts_url: String,
    /// Seconds between polls
    pub polling_interval: u64,
    /// Websocket url, push feed
    pub push_url: Option<String>,
    /// `Origin` header sent on the websocket handshake
    pub origin: Option<String>,
}

impl Default for Oref {
    fn default() -> Self {
        Oref {
            feed: Feed::Poll,
            alerts_url: "https://www.oref.org.il/WarningMessages/alert/alerts.json".to_owned(),
            polling_interval: 1,
            push_url: None,
            origin: None,
        }
    }
}

/// Watched location.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Watch {
    /// Exact city name as written by the provider
    pub city: String,
}

impl Default for Watch {
    fn default() -> Self {
        Watch {
            city: "אביגדור".to_owned(),
        }
    }
}

/// Hue bridge credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct Hue {
    /// Bridge host or url
    pub address: String,
    /// Whitelisted username
    pub username: String,
}

/// WLED strip.
#[derive(Debug, Clone, Deserialize)]
pub struct Wled {
    /// Base url of the strip
    pub url: String,
}

/// Effect timings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Effect {
    /// Number of alarm/secondary color cycles
    pub blinks: u8,
    /// Seconds each color is held while blinking
    pub blink_interval: u64,
    /// Seconds the lights stay in alarm before being restored
    pub dwell: u64,
}

impl Default for Effect {
    fn default() -> Self {
        Effect {
            blinks: 3,
            blink_interval: 1,
            dwell: 3 * 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    #[serial]
    fn test_load_minimal_config_uses_defaults() {
        let file = write_config(
            r#"
hue:
  address: "192.168.1.20"
  username: "abc"
"#,
        );

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.oref.feed, Feed::Poll);
        assert_eq!(
            config.oref.alerts_url,
            "https://www.oref.org.il/WarningMessages/alert/alerts.json"
        );
        assert_eq!(config.oref.polling_interval, 1);
        assert_eq!(config.watch.city, "אביגדור");
        assert_eq!(config.hue.address, "192.168.1.20");
        assert_eq!(config.hue.username, "abc");
        assert!(config.wled.is_none());
        assert_eq!(config.effect.blinks, 3);
        assert_eq!(config.effect.blink_interval, 1);
        assert_eq!(config.effect.dwell, 180);
    }

    #[test]
    #[serial]
    fn test_load_full_config() {
        let file = write_config(
            r#"
oref:
  feed: push
  push_url: "wss://ws.example.com/socket"
  origin: "https://www.example.com"
watch:
  city: "שדרות"
hue:
  address: "http://127.0.0.1:8080"
  username: "abc"
wled:
  url: "http://wled.local"
effect:
  blinks: 5
  dwell: 60
"#,
        );

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.oref.feed, Feed::Push);
        assert_eq!(
            config.oref.push_url.as_deref(),
            Some("wss://ws.example.com/socket")
        );
        assert_eq!(config.oref.origin.as_deref(), Some("https://www.example.com"));
        assert_eq!(config.watch.city, "שדרות");
        assert_eq!(config.wled.unwrap().url, "http://wled.local");
        assert_eq!(config.effect.blinks, 5);
        assert_eq!(config.effect.blink_interval, 1);
        assert_eq!(config.effect.dwell, 60);
    }

    #[test]
    #[serial]
    fn test_parse_content() {
        let config = Config::parse("watch:\n  city: \"שדרות\"\nhue:\n  address: a\n  username: b\n").unwrap();

        assert_eq!(config.watch.city, "שדרות");
        assert_eq!(config.hue.username, "b");
        assert!(Config::parse("watch: [").is_err());
    }

    #[test]
    #[serial]
    fn test_load_missing_hue_section_fails() {
        let file = write_config("watch:\n  city: \"שדרות\"\n");

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    #[serial]
    fn test_load_unknown_feed_fails() {
        let file = write_config(
            "oref:\n  feed: carrier-pigeon\nhue:\n  address: a\n  username: b\n",
        );

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    #[serial]
    fn test_environment_overrides_file() {
        let file = write_config(
            r#"
watch:
  city: "שדרות"
hue:
  address: "192.168.1.20"
  username: "from-file"
"#,
        );

        // SAFETY: tests touching the environment are serialized
        unsafe {
            std::env::set_var("RED_ALERT_HUE__USERNAME", "from-env");
            std::env::set_var("RED_ALERT_WATCH__CITY", "נתיבות");
        }

        let config = Config::load(file.path());

        unsafe {
            std::env::remove_var("RED_ALERT_HUE__USERNAME");
            std::env::remove_var("RED_ALERT_WATCH__CITY");
        }

        let config = config.unwrap();
        assert_eq!(config.hue.username, "from-env");
        assert_eq!(config.hue.address, "192.168.1.20");
        assert_eq!(config.watch.city, "נתיבות");
    }
}
