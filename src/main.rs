//! Red Alert - Blinks Philips Hue lights on Home Front Command alerts.
//!
//! This is the main entry point of red-alert, which watches the Israeli Home
//! Front Command alert feed and drives the lights of a Hue bridge into an alarm
//! pattern when the configured city is under alert, then restores them.
//!
//! # Overview
//!
//! red-alert reads the alert feed, either by polling the `alerts.json` snapshot
//! or over a push websocket. Every new alert id is written to a cursor file in
//! the data directory so an alert is never processed twice, even across
//! restarts. When the watched city is among the alert locations, every light of
//! the bridge blinks red and white, stays in alarm for a few minutes, and goes
//! back to the state it was in before the alert.
//!
//! # Configuration
//!
//! Create a `config.yaml` file with your settings:
//!
//! ```yaml
//! watch:
//!   city: "אביגדור"
//!
//! hue:
//!   address: "192.168.1.20"
//!   username: "bridge-username"
//! ```
//!
//! See the [`config`] module for every key.
//!
//! # Environment Variable Overrides
//!
//! Override any configuration value using environment variables with the `RED_ALERT_` prefix:
//!
//! ```bash
//! export RED_ALERT_HUE__USERNAME="bridge-username"
//! export RED_ALERT_WATCH__CITY="אביגדור"
//! ```
//!
//! # Usage
//!
//! ```bash
//! red-alert --config config.yaml --data ./red-alert-data
//! ```
//!
//! # Architecture
//!
//! - [`alerts`] - Alert feed sources, decoding, cursor and city matching
//! - [`config`] - YAML configuration file structures and loading with environment variable support
//! - [`effect`] - Alarm effect plan and orchestration over the lights
//! - [`hue`] - Hue bridge client
//! - [`watch`] - Watch loop tying the feed to the effect
//!
//! # Runtime Behavior
//!
//! With the polling feed the process runs until it is terminated, every failure
//! is logged and the next poll tries again. With the push feed the process exits
//! with a failure status as soon as the connection is lost or the alert cursor
//! cannot be written, and is expected to be restarted by its supervisor
//! (systemd, docker, ...).
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (default: `info`)

use std::{path::Path, process::ExitCode, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{error, info};

use crate::{
    alerts::{CURSOR_FILE, CursorStore, OrefRequester, PollingSource, PushSource},
    config::{Config, Feed},
    effect::{EffectOrchestrator, EffectPlan, WledStrip},
    hue::HueBridge,
    watch::{WatchedLocation, Watcher},
};

mod alerts;
mod config;
mod effect;
mod hue;
mod watch;

/// Command-line arguments for red-alert.
///
/// # Examples
///
/// ```bash
/// red-alert --config config.yaml --data ./red-alert-data
/// ```
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file.
    ///
    /// The file is read at startup, and again on every new alert to pick up a
    /// changed `watch.city`.
    #[arg(short, long)]
    config: String,

    /// Path to the directory for storing persistent data.
    ///
    /// This directory will contain:
    /// - `last_alert_id` - Id of the last processed alert
    #[arg(short, long)]
    data: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Put logger at info level by default
    let env = Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    info!("Starting red-alert {}...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let config = match Config::load(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load config file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(config, &args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Builds the watcher from the configuration and runs the configured feed.
///
/// Only returns with the push feed, when its connection or the cursor fails.
async fn run(config: Config, args: &Args) -> Result<()> {
    tokio::fs::create_dir_all(&args.data)
        .await
        .with_context(|| format!("cannot create data directory {}", &args.data))?;

    let bridge = HueBridge::new(&config.hue.address, &config.hue.username);
    let mut orchestrator = EffectOrchestrator::new(bridge, EffectPlan::from(&config.effect));
    if let Some(wled) = &config.wled {
        info!("led strip {} blinks along the lights", wled.url);
        orchestrator = orchestrator.with_strip(WledStrip::new(&wled.url));
    }

    let cursor = CursorStore::new(Path::new(&args.data).join(CURSOR_FILE));
    info!("alert cursor stored in {}", cursor.path().display());
    let location = WatchedLocation::from_config(&args.config, config.watch.city.clone());
    info!("watching alerts on {}", config.watch.city);

    let watcher = Watcher::new(cursor, location, orchestrator);

    match config.oref.feed {
        Feed::Poll => {
            let mut source = PollingSource::new(OrefRequester::new(&config.oref.alerts_url));
            watcher
                .run_polling(
                    &mut source,
                    Duration::from_secs(config.oref.polling_interval.max(1)),
                )
                .await;
            Ok(())
        }
        Feed::Push => {
            let url = config
                .oref
                .push_url
                .as_deref()
                .context("oref.push_url is required by the push feed")?;
            let origin = config
                .oref
                .origin
                .as_deref()
                .context("oref.origin is required by the push feed")?;

            let mut source = PushSource::connect(url, origin).await?;
            watcher.run_push(&mut source).await?;
            Ok(())
        }
    }
}
