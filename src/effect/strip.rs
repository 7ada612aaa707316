//! WLED led strip blinking along the lights.

use log::debug;
use reqwest::{Client, Error};

/// Client of a WLED strip, driven through its `/win` http api.
pub struct WledStrip {
    url: String,
    client: Client,
}

impl WledStrip {
    pub fn new(url: &str) -> Self {
        WledStrip {
            url: url.trim_end_matches('/').to_owned(),
            client: Client::new(),
        }
    }

    /// Sets the strip to red at `brightness`, `0` switching it off.
    pub async fn set_red(&self, brightness: u8) -> Result<(), Error> {
        let url = format!("{}/win&A={}&R=255&G=0&B=0", &self.url, brightness);
        debug!("request {}", &url);

        self.client.get(&url).send().await?.error_for_status()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_red() {
        let mut server = mockito::Server::new_async().await;
        let off = server
            .mock("GET", "/win&A=0&R=255&G=0&B=0")
            .with_status(200)
            .create_async()
            .await;
        let on = server
            .mock("GET", "/win&A=255&R=255&G=0&B=0")
            .with_status(200)
            .create_async()
            .await;

        let strip = WledStrip::new(&format!("{}/", server.url()));
        strip.set_red(0).await.unwrap();
        strip.set_red(255).await.unwrap();

        off.assert_async().await;
        on.assert_async().await;
    }

    #[tokio::test]
    async fn test_set_red_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/win&A=255&R=255&G=0&B=0")
            .with_status(500)
            .create_async()
            .await;

        let strip = WledStrip::new(&server.url());
        assert!(strip.set_red(255).await.is_err());
    }
}
