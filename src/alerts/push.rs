//! Push-based alert source over a persistent websocket.

use futures::StreamExt;
use log::{debug, info, trace};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{ClientRequestBuilder, Message, http::Uri},
};

use crate::alerts::{Alert, AlertSource, SourceError};

/// Websocket sub-protocol the provider requires.
pub const SUB_PROTOCOL: &str = "chat";

/// One websocket connection to the provider.
///
/// Every text frame carrying a `data.cities` list yields an [`Alert`], other frames
/// are skipped. The source never reconnects: once the connection is closed or
/// fails, every call returns [`SourceError::Connection`].
pub struct PushSource {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    closed: bool,
}

impl PushSource {
    /// Opens the connection with the `chat` sub-protocol and the given `Origin` header.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Connection`] when the url is invalid or the handshake fails.
    pub async fn connect(url: &str, origin: &str) -> Result<Self, SourceError> {
        let uri: Uri = url
            .parse()
            .map_err(|e| SourceError::Connection(format!("invalid push url {}: {}", url, e)))?;

        let request = ClientRequestBuilder::new(uri)
            .with_sub_protocol(SUB_PROTOCOL)
            .with_header("Origin", origin);

        info!("connecting to alert push feed {}", url);
        let (stream, _response) = connect_async(request)
            .await
            .map_err(|e| SourceError::Connection(e.to_string()))?;
        info!("connected to alert push feed");

        Ok(PushSource {
            stream,
            closed: false,
        })
    }

    fn close(&mut self, reason: String) -> SourceError {
        self.closed = true;
        SourceError::Connection(reason)
    }
}

impl AlertSource for PushSource {
    async fn next_alert(&mut self) -> Result<Alert, SourceError> {
        if self.closed {
            return Err(SourceError::Connection("push feed already closed".to_owned()));
        }

        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => match Alert::from_frame(&text) {
                    Some(alert) => {
                        debug!("pushed alert: {}", alert);
                        return Ok(alert);
                    }
                    None => continue,
                },
                Some(Ok(Message::Close(frame))) => {
                    let reason = match frame {
                        Some(frame) => format!("closed by provider ({}: {})", frame.code, frame.reason),
                        None => "closed by provider".to_owned(),
                    };
                    return Err(self.close(reason));
                }
                Some(Ok(other)) => trace!("ignoring push frame {:?}", other),
                Some(Err(e)) => return Err(self.close(e.to_string())),
                None => return Err(self.close("stream ended".to_owned())),
            }
        }
    }
}
