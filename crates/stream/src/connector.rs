//! Transport abstraction over the WebSocket connection.
//!
//! The client state machine only ever sees text frames through
//! [`Connection`]; the tungstenite details (ping/pong, close frames,
//! TLS) stay inside [`WsConnector`]. Tests script a connector instead
//! of standing up a socket.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::error::StreamError;

/// One established connection
#[async_trait]
pub trait Connection: Send {
    async fn send(&mut self, text: &str) -> Result<(), StreamError>;

    /// Next text frame, or `None` once the peer has closed
    async fn recv(&mut self) -> Result<Option<String>, StreamError>;

    async fn close(&mut self);
}

/// Dials a feed URL
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn Connection>, StreamError>;
}

/// Production connector backed by tokio-tungstenite
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Connection>, StreamError> {
        let (socket, response) = connect_async(url)
            .await
            .map_err(|e| StreamError::Connect(e.to_string()))?;
        debug!(url, status = %response.status(), "websocket connected");
        Ok(Box::new(WsConnection { socket }))
    }
}

struct WsConnection {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Connection for WsConnection {
    async fn send(&mut self, text: &str) -> Result<(), StreamError> {
        self.socket
            .send(Message::Text(text.to_string()))
            .await
            .map_err(StreamError::from)
    }

    async fn recv(&mut self) -> Result<Option<String>, StreamError> {
        loop {
            match self.socket.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                // tungstenite answers pings itself; nothing to surface
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                Some(Ok(Message::Binary(_))) => {
                    debug!("ignoring binary frame");
                    continue;
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    async fn close(&mut self) {
        let _ = self.socket.close(None).await;
    }
}
