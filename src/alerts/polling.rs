//! Poll-based alert source.

use log::debug;

use crate::alerts::{Alert, AlertSource, SourceError, requester::Requester};

/// Fetches one snapshot per call through a [`Requester`].
///
/// The source does not own any timing, the watch loop decides how often it is
/// called. Undecodable snapshots are returned as [`Alert::empty`].
pub struct PollingSource<R: Requester> {
    requester: R,
}

impl<R: Requester> PollingSource<R> {
    pub fn new(requester: R) -> Self {
        PollingSource { requester }
    }
}

impl<R: Requester> AlertSource for PollingSource<R> {
    async fn next_alert(&mut self) -> Result<Alert, SourceError> {
        let body = self.requester.get_current_alert().await?;
        let alert = Alert::from_snapshot(&body);

        if !alert.is_empty() {
            debug!("last alert from oref: {}", alert);
        }

        Ok(alert)
    }
}
