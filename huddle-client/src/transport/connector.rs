use async_trait::async_trait;
use futures::{Sink, SinkExt, Stream, StreamExt, future};
use std::pin::Pin;
use thiserror::Error;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::debug;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("channel error: {0}")]
    Channel(String),

    #[error(transparent)]
    WebSocket(#[from] tungstenite::Error),
}

pub type FrameSink = Pin<Box<dyn Sink<String, Error = TransportError> + Send>>;
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, TransportError>> + Send>>;

/// An open control channel carrying text frames.
///
/// The stream ending means the remote side closed the channel. Closing the
/// sink closes the channel normally.
pub struct ChannelLink {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

/// Opens the control channel. Called once per connection attempt.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self) -> Result<ChannelLink, TransportError>;
}

/// WebSocket control channel against a per-session endpoint.
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self) -> Result<ChannelLink, TransportError> {
        let (ws_stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| TransportError::Connect(format!("{}: {}", self.url, e)))?;
        debug!("WebSocket connected to {}", self.url);

        let (write, read) = ws_stream.split();

        let sink = write.with(|text: String| {
            future::ready(Ok::<Message, TransportError>(Message::text(text)))
        });

        let stream = read.filter_map(|msg| {
            future::ready(match msg {
                Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                // Invalid UTF-8 is left for the decoder to reject.
                Ok(Message::Binary(bytes)) => Some(Ok(String::from_utf8_lossy(&bytes).into_owned())),
                Ok(_) => None,
                Err(e) => Some(Err(TransportError::from(e))),
            })
        });

        Ok(ChannelLink {
            sink: Box::pin(sink),
            stream: Box::pin(stream),
        })
    }
}
