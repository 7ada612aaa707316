//! Watch loop.
//!
//! This module ties the alert feed, the cursor, the watched city and the alarm
//! effect together. Every alert read from an [`AlertSource`] goes through
//! [`Watcher::process`]:
//!
//! 1. The empty alert is ignored
//! 2. An alert whose id is not above the stored cursor is a duplicate and ignored
//! 3. The cursor is advanced to the new id, whether the alert matches or not
//! 4. If the watched city is among the alert locations, the effect is triggered
//!    and the loop carries on without waiting for it
//!
//! Pushed alerts without id skip steps 2 and 3.
//!
//! # Failure policy
//!
//! The polling loop never stops: a failed fetch or a failed cursor write is
//! logged and the next tick tries again. The push loop stops on the first
//! connection error or failed cursor write and hands it to its caller,
//! restarting it is left to the process supervisor. A pushed frame is never
//! sent again, so a cursor failure cannot wait for a retry there.

use std::{
    path::PathBuf,
    sync::{Mutex, PoisonError},
    time::Duration,
};

use log::{debug, error, info, warn};
use tokio::{
    fs,
    time::{self, MissedTickBehavior},
};

use crate::{
    alerts::{Alert, AlertSource, CursorError, CursorStore, SourceError, matches},
    config::Config,
    effect::EffectTrigger,
};

/// The city whose alerts trigger the lights.
///
/// When built from a configuration file, the file is read again every time the
/// city is needed so edits apply without a restart. A file that cannot be read
/// keeps the last good value.
pub struct WatchedLocation {
    config_path: Option<PathBuf>,
    last: Mutex<String>,
}

impl WatchedLocation {
    /// A city that never changes.
    pub fn fixed(city: impl Into<String>) -> Self {
        WatchedLocation {
            config_path: None,
            last: Mutex::new(city.into()),
        }
    }

    /// A city read from the `watch.city` key of the configuration file at `path`.
    ///
    /// # Arguments
    ///
    /// * `path` - Configuration file, as given on the command line.
    /// * `initial` - City used until the file is successfully read again.
    pub fn from_config(path: impl Into<PathBuf>, initial: impl Into<String>) -> Self {
        WatchedLocation {
            config_path: Some(path.into()),
            last: Mutex::new(initial.into()),
        }
    }

    /// Returns the city currently watched.
    pub async fn current(&self) -> String {
        let reloaded = match &self.config_path {
            Some(path) => Some(match fs::read_to_string(path).await {
                Ok(content) => Config::parse(&content).map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            }),
            None => None,
        };

        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        match reloaded {
            Some(Ok(config)) if config.watch.city != *last => {
                info!("watched city changed from {} to {}", last, config.watch.city);
                *last = config.watch.city;
            }
            Some(Err(e)) => warn!("cannot reload watched city, keeping {}: {}", last, e),
            _ => {}
        }

        last.clone()
    }
}

/// What [`Watcher::process`] did with an alert.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing is going on
    Empty,
    /// The alert was already processed
    Duplicate,
    /// New alert elsewhere, the cursor was advanced
    Unmatched,
    /// New alert on the watched city, the effect was started
    Triggered,
}

/// Consumes alerts and triggers the effect on the relevant ones.
pub struct Watcher<T: EffectTrigger> {
    /// Last processed alert id
    cursor: CursorStore,
    /// Watched city
    location: WatchedLocation,
    /// Alarm effect
    effect: T,
}

impl<T: EffectTrigger> Watcher<T> {
    pub fn new(cursor: CursorStore, location: WatchedLocation, effect: T) -> Self {
        Watcher {
            cursor,
            location,
            effect,
        }
    }

    /// Processes one alert.
    ///
    /// The cursor is read from disk on every call and written before the
    /// effect is triggered.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError`] when the new id cannot be persisted. The effect is
    /// not triggered then, and since the cursor did not move the next poll sees
    /// the same alert as new.
    pub async fn process(&self, alert: &Alert) -> Result<Outcome, CursorError> {
        if alert.is_empty() {
            return Ok(Outcome::Empty);
        }

        if let Some(id) = alert.id {
            let last_id = self.cursor.load().await;
            if id <= last_id {
                debug!("alert {} already processed, cursor at {}", id, last_id);
                return Ok(Outcome::Duplicate);
            }

            info!("new alert {}", alert);
            self.cursor.save(id).await?;
        } else {
            info!("new pushed alert {}", alert);
        }

        let city = self.location.current().await;
        if !matches(&alert.locations, &city) {
            info!("alert {} does not concern {}", alert.label(), city);
            return Ok(Outcome::Unmatched);
        }

        warn!("alert {} concerns {}, starting alarm effect", alert.label(), city);
        self.effect.trigger(alert);

        Ok(Outcome::Triggered)
    }

    /// Reads and processes one alert, logging any failure.
    ///
    /// Returns `None` when the alert could not be read or its id persisted.
    pub async fn poll_once<S: AlertSource>(&self, source: &mut S) -> Option<Outcome> {
        let alert = match source.next_alert().await {
            Ok(alert) => alert,
            Err(e) => {
                error!("{}", e);
                return None;
            }
        };

        match self.process(&alert).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!("alert {} left for next poll: {}", alert.label(), e);
                None
            }
        }
    }

    /// Polls `source` every `period`, forever.
    pub async fn run_polling<S: AlertSource>(&self, source: &mut S, period: Duration) {
        info!("polling alerts every {} ms", period.as_millis());

        let mut interval = time::interval(period);
        // A slow fetch delays the next one instead of bursting to catch up
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            self.poll_once(source).await;
        }
    }

    /// Processes pushed alerts until the connection or the cursor fails.
    ///
    /// # Errors
    ///
    /// Returns the [`SourceError`] that ended the feed, or
    /// [`SourceError::Persistence`] when the id of a pushed alert cannot be
    /// written. The alert is not triggered then.
    pub async fn run_push<S: AlertSource>(&self, source: &mut S) -> Result<(), SourceError> {
        info!("waiting for pushed alerts");

        loop {
            let alert = source.next_alert().await?;
            self.process(&alert).await?;
        }
    }
}
