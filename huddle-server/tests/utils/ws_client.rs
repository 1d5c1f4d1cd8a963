use futures::{SinkExt, StreamExt};
use huddle_core::{ControlMessage, SessionId, decode_text, encode_text};
use huddle_server::{RegistryConfig, SessionManager, serve};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::utils::RECV_TIMEOUT;

/// Registry served on an ephemeral local port.
pub struct TestServer {
    pub base_url: String,
    pub manager: SessionManager,
}

impl TestServer {
    pub async fn start(config: RegistryConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let manager = SessionManager::new(config);

        tokio::spawn(serve(listener, manager.clone()));

        Self {
            base_url: format!("http://{}", addr),
            manager,
        }
    }

    pub fn ws_url(&self, session: &str) -> String {
        format!("{}/session/{}", self.base_url.replacen("http://", "ws://", 1), session)
    }

    /// Polls until the session lists exactly `count` members.
    pub async fn wait_for_members(&self, session: &SessionId, count: usize) {
        for _ in 0..100 {
            let info = self.manager.describe(session).await.unwrap();
            if info.members.len() == count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("session {} never reached {} members", session, count);
    }
}

pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    pub async fn connect(url: &str) -> Self {
        let (stream, _) = connect_async(url).await.unwrap();
        Self { stream }
    }

    pub async fn send(&mut self, message: &ControlMessage) {
        self.send_raw(&encode_text(message).unwrap()).await;
    }

    pub async fn send_raw(&mut self, text: &str) {
        self.stream.send(Message::text(text.to_owned())).await.unwrap();
    }

    pub async fn recv(&mut self) -> ControlMessage {
        self.recv_within(RECV_TIMEOUT)
            .await
            .expect("timed out waiting for a control message")
    }

    pub async fn recv_within(&mut self, limit: Duration) -> Option<ControlMessage> {
        let next = async {
            while let Some(frame) = self.stream.next().await {
                if let Message::Text(text) = frame.ok()? {
                    return Some(decode_text(text.as_str()).unwrap());
                }
            }
            None
        };
        tokio::time::timeout(limit, next).await.ok().flatten()
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}
