//! HTTP client for the Home Front Command alert snapshot.
//!
//! This module provides the [`OrefRequester`] struct for fetching the current
//! alert snapshot from the provider.

use log::debug;
#[cfg(test)]
use mockall::automock;
use reqwest::{Client, Error, header};

/// Page the provider expects requests to come from.
const REFERER: &str = "https://www.oref.org.il/12481-he/Pakar.aspx";

/// Browser user agent, the provider rejects unknown clients.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// HTTP client requesting the current alert snapshot.
///
/// # Examples
///
/// ```no_run
/// let requester = OrefRequester::new("https://www.oref.org.il/WarningMessages/alert/alerts.json");
/// let body = requester.get_current_alert().await.unwrap();
/// println!("Snapshot: {}", body);
/// ```
pub struct OrefRequester {
    /// URL of the `alerts.json` snapshot
    url: String,
    /// HTTP client
    client: Client,
}

/// Trait for fetching the raw alert snapshot.
///
/// This trait abstracts the HTTP operation for easier testing with mocks.
#[cfg_attr(test, automock)]
pub trait Requester {
    /// Fetches the raw snapshot body, possibly empty.
    async fn get_current_alert(&self) -> Result<String, Error>;
}

impl OrefRequester {
    /// Create a new [OrefRequester].
    ///
    /// # Arguments
    ///
    /// * `url` - The URL of the alert snapshot.
    pub fn new(url: &str) -> Self {
        OrefRequester {
            url: url.to_string(),
            client: Client::new(),
        }
    }
}

impl Requester for OrefRequester {
    /// Request the alert snapshot.
    ///
    /// While an alert is active the provider answers with a json object:
    /// ```text
    /// {
    ///   "id": "133497288990000000",
    ///   "cat": "1",
    ///   "title": "ירי רקטות וטילים",
    ///   "data": ["אביגדור"],
    ///   "desc": "היכנסו למרחב המוגן ושהו בו 10 דקות"
    /// }
    /// ```
    /// Otherwise the body is empty or a lone byte order mark. The body is returned
    /// as is, decoding is left to [`Alert::from_snapshot`](crate::alerts::Alert::from_snapshot).
    async fn get_current_alert(&self) -> Result<String, Error> {
        debug!("request {}", &self.url);

        let response = self
            .client
            .get(&self.url)
            .header(header::ACCEPT, "*/*")
            .header(header::ACCEPT_LANGUAGE, "he-IL,he;q=0.9,en-US;q=0.8,en;q=0.7")
            .header(header::CONTENT_TYPE, "application/json;charset=utf-8")
            .header(header::REFERER, REFERER)
            .header(header::USER_AGENT, USER_AGENT)
            .header("X-Requested-With", "XMLHttpRequest")
            .send()
            .await?
            .error_for_status()?;

        debug!("{} {}", &self.url, response.status());

        let body = response.text().await?;

        debug!("response from {} -> {:?}", &self.url, &body);

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_current_alert() {
        let mut server = mockito::Server::new_async().await;
        let body = r#"{"id": "133497288990000000", "data": ["אביגדור"]}"#;

        let mock = server
            .mock("GET", "/WarningMessages/alert/alerts.json")
            .match_header("referer", REFERER)
            .match_header("x-requested-with", "XMLHttpRequest")
            .with_status(200)
            .with_header("content-type", "application/json; charset=utf-8")
            .with_body(body)
            .create_async()
            .await;

        let requester =
            OrefRequester::new(&format!("{}/WarningMessages/alert/alerts.json", server.url()));
        let response = requester.get_current_alert().await.unwrap();

        mock.assert_async().await;
        assert!(response.contains("133497288990000000"));
        assert!(response.contains("אביגדור"));
    }

    #[tokio::test]
    async fn test_get_current_alert_empty_body() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("GET", "/alerts.json")
            .with_status(200)
            .with_body("")
            .create_async()
            .await;

        let requester = OrefRequester::new(&format!("{}/alerts.json", server.url()));
        let response = requester.get_current_alert().await.unwrap();

        assert!(response.trim().is_empty());
    }

    #[tokio::test]
    async fn test_get_current_alert_error_status() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("GET", "/alerts.json")
            .with_status(403)
            .with_body("Access Denied")
            .create_async()
            .await;

        let requester = OrefRequester::new(&format!("{}/alerts.json", server.url()));
        let err = requester.get_current_alert().await.unwrap_err();

        assert_eq!(err.status(), Some(reqwest::StatusCode::FORBIDDEN));
    }
}
