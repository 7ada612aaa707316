//! Alert ingestion for the Home Front Command feed.
//!
//! This module turns the provider feed into a stream of [`Alert`]s and holds the
//! pieces the watch loop needs to decide what to do with them:
//!
//! - [`Alert`]: Normalized alert, decoded from either payload shape
//! - [`AlertSource`]: The feed contract, implemented by [`PollingSource`] and [`PushSource`]
//! - [`CursorStore`]: Durable id of the last processed alert
//! - [`matches`]: Exact membership test of the watched city
//!
//! # Strategies
//!
//! The polling strategy fetches one snapshot per call and leaves the pacing to
//! the caller. Transport failures are reported as [`SourceError::Transport`] and
//! the next call may succeed.
//!
//! The push strategy keeps one websocket open and waits for the next frame on
//! each call. Once the connection fails it reports [`SourceError::Connection`]
//! and the source is finished, reconnecting is the supervisor's job.

mod alert;
mod cursor;
mod matcher;
mod polling;
mod push;
mod requester;

pub use crate::alerts::alert::Alert;
pub use crate::alerts::cursor::{CURSOR_FILE, CursorError, CursorStore};
pub use crate::alerts::matcher::matches;
pub use crate::alerts::polling::PollingSource;
pub use crate::alerts::push::PushSource;
pub use crate::alerts::requester::OrefRequester;

#[cfg(test)]
use mockall::automock;
use thiserror::Error;

/// Errors produced while reading the alert feed.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The snapshot could not be fetched. The next poll may succeed.
    #[error("failed to fetch alert snapshot: {0}")]
    Transport(#[from] reqwest::Error),

    /// The push connection could not be opened or was lost. The source is finished.
    #[error("alert connection lost: {0}")]
    Connection(String),

    /// The id of a new alert could not be persisted.
    #[error("alert cursor not saved: {0}")]
    Persistence(#[from] CursorError),
}

/// A lazy, non-restartable sequence of alerts.
#[cfg_attr(test, automock)]
pub trait AlertSource {
    /// Waits for and returns the next alert.
    async fn next_alert(&mut self) -> Result<Alert, SourceError>;
}
