//! Websocket channel to the inference server.
//!
//! The transport is abstracted behind [`Channel`] so the session driver can
//! be exercised against a scripted stub; [`WsChannel`] is the real
//! implementation over `ws://<host>:<port>`.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A duplex text-message channel.
///
/// `recv` yields the next text frame; since at most one request is ever
/// outstanding, that frame unambiguously belongs to the last request sent.
#[async_trait]
pub trait Channel {
    /// Send one text frame.
    async fn send(&mut self, frame: String) -> Result<()>;

    /// Receive the next text frame.
    async fn recv(&mut self) -> Result<String>;
}

/// Failure to establish the websocket connection.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Nothing is listening at the remote address: the expected "server
    /// not running" case, reported with its own message.
    #[error("connection refused at {url}")]
    Refused { url: String },
    /// The server did not complete the handshake in time.
    #[error("timed out connecting to {url}")]
    Timeout { url: String },
    /// Any other handshake failure.
    #[error("failed to connect to {url}: {source}")]
    Handshake {
        url: String,
        source: tungstenite::Error,
    },
}

/// The live websocket connection to the server.
pub struct WsChannel {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsChannel {
    /// Open a connection to `ws://<host>:<port>`.
    pub async fn connect(host: &str, port: u16) -> Result<Self, ConnectError> {
        let url = format!("ws://{host}:{port}");

        match tokio::time::timeout(CONNECT_TIMEOUT, connect_async(url.as_str())).await {
            Err(_) => Err(ConnectError::Timeout { url }),
            Ok(Err(err)) if is_refused(&err) => Err(ConnectError::Refused { url }),
            Ok(Err(err)) => Err(ConnectError::Handshake { url, source: err }),
            Ok(Ok((stream, _))) => {
                debug!(%url, "connected");
                Ok(Self { stream })
            }
        }
    }
}

fn is_refused(err: &tungstenite::Error) -> bool {
    matches!(err, tungstenite::Error::Io(io)
        if io.kind() == std::io::ErrorKind::ConnectionRefused)
}

#[async_trait]
impl Channel for WsChannel {
    async fn send(&mut self, frame: String) -> Result<()> {
        self.stream
            .send(Message::Text(frame.into()))
            .await
            .context("failed to send request")
    }

    async fn recv(&mut self) -> Result<String> {
        while let Some(frame) = self.stream.next().await {
            match frame.context("connection failed while awaiting a reply")? {
                Message::Text(text) => return Ok(text.to_string()),
                // Keepalive traffic is not a reply.
                Message::Ping(_) | Message::Pong(_) => continue,
                Message::Close(_) => bail!("connection closed by the server"),
                other => bail!("unexpected non-text frame from the server: {other:?}"),
            }
        }
        bail!("connection closed before a reply arrived")
    }
}
