use crate::registry::{ConnectionId, MemberOutbox, SessionCommand, SessionManager};
use crate::signaling::WsOutbox;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, Stream, StreamExt};
use huddle_core::{ControlMessage, MemberId, MessageKind, SessionId, decode_text};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(session): Path<String>,
    State(manager): State<SessionManager>,
) -> Response {
    let Ok(session_id) = SessionId::parse(session) else {
        return (StatusCode::BAD_REQUEST, "invalid session id").into_response();
    };

    ws.on_upgrade(move |socket| handle_socket(socket, session_id, manager))
}

async fn handle_socket(socket: WebSocket, session_id: SessionId, manager: SessionManager) {
    let connection = manager.next_connection_id();
    info!("New WebSocket connection {} for session {}", connection, session_id);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut link = MemberLink::new(session_id, connection, manager, WsOutbox::new(tx));

    tokio::select! {
        _ = (&mut send_task) => {},
        _ = link.receive(&mut receiver) => {},
    };

    send_task.abort();
    link.release().await;
    info!("WebSocket disconnected: {}", connection);
}

struct Joined {
    member: MemberId,
    commands: mpsc::Sender<SessionCommand>,
}

/// Per-connection state: which member this socket registered as, if any.
struct MemberLink {
    session_id: SessionId,
    connection: ConnectionId,
    manager: SessionManager,
    outbox: Arc<WsOutbox>,
    joined: Option<Joined>,
    not_found_sent: bool,
}

impl MemberLink {
    fn new(
        session_id: SessionId,
        connection: ConnectionId,
        manager: SessionManager,
        outbox: WsOutbox,
    ) -> Self {
        Self {
            session_id,
            connection,
            manager,
            outbox: Arc::new(outbox),
            joined: None,
            not_found_sent: false,
        }
    }

    async fn receive<S>(&mut self, stream: &mut S)
    where
        S: Stream<Item = Result<Message, axum::Error>> + Unpin,
    {
        while let Some(Ok(msg)) = stream.next().await {
            match msg {
                Message::Text(text) => self.handle_text(text.as_str()).await,
                Message::Binary(bytes) => self.handle_text(&String::from_utf8_lossy(&bytes)).await,
                Message::Close(_) => break,
                _ => {}
            }
        }
    }

    async fn handle_text(&mut self, text: &str) {
        let message = match decode_text(text) {
            Ok(message) => message,
            Err(e) if is_join_attempt(text) => {
                warn!("Rejecting JOIN on {}: {}", self.connection, e);
                let reply = ControlMessage::InvalidRequest {
                    session_id: Some(self.session_id.clone()),
                    reason: Some(e.to_string()),
                };
                self.reply(&reply).await;
                return;
            }
            Err(e) => {
                warn!("Invalid control message on {}: {}", self.connection, e);
                return;
            }
        };

        match message {
            ControlMessage::Join {
                member, session_id, ..
            } => {
                if session_id != self.session_id {
                    debug!(
                        "JOIN on {} names session {}, using {} from the path",
                        self.connection, session_id, self.session_id
                    );
                }
                self.join(member).await;
            }

            ControlMessage::Offer { .. }
            | ControlMessage::Answer { .. }
            | ControlMessage::Candidate { .. } => {
                if let Some(other) = message.session_id().filter(|id| *id != &self.session_id) {
                    warn!(
                        "Dropping {} for session {} sent on a channel of session {}",
                        message.kind(),
                        other,
                        self.session_id
                    );
                    return;
                }
                self.relay(message).await;
            }

            other => warn!("Unexpected {} from client on {}", other.kind(), self.connection),
        }
    }

    async fn join(&mut self, member: MemberId) {
        if let Some(previous) = self.joined.take() {
            if previous.member != member {
                self.leave(previous).await;
            }
        }

        let Some(commands) = self.manager.sender(&self.session_id) else {
            self.session_not_found().await;
            return;
        };

        let cmd = SessionCommand::Join {
            member: member.clone(),
            connection: self.connection,
            outbox: self.outbox.clone(),
        };
        if commands.send(cmd).await.is_err() {
            self.session_not_found().await;
            return;
        }

        self.joined = Some(Joined { member, commands });
    }

    async fn relay(&self, message: ControlMessage) {
        let Some(joined) = &self.joined else {
            warn!(
                "Dropping {} on {}: connection has not joined",
                message.kind(),
                self.connection
            );
            return;
        };

        let cmd = SessionCommand::Relay {
            from: joined.member.clone(),
            connection: self.connection,
            message,
        };
        if joined.commands.send(cmd).await.is_err() {
            warn!("Session {} is gone", self.session_id);
        }
    }

    async fn session_not_found(&mut self) {
        if self.not_found_sent {
            debug!("Session {} still unknown for {}", self.session_id, self.connection);
            return;
        }
        info!("Session '{}' does not exist", self.session_id);

        self.not_found_sent = true;
        let reply = ControlMessage::SessionNotFound {
            session_id: Some(self.session_id.clone()),
        };
        self.reply(&reply).await;
    }

    async fn reply(&self, message: &ControlMessage) {
        if let Err(e) = self.outbox.deliver(message).await {
            debug!("Could not send {} on {}: {}", message.kind(), self.connection, e);
        }
    }

    async fn leave(&self, joined: Joined) {
        let cmd = SessionCommand::Leave {
            member: joined.member,
            connection: self.connection,
        };
        let _ = joined.commands.send(cmd).await;
    }

    async fn release(mut self) {
        if let Some(joined) = self.joined.take() {
            self.leave(joined).await;
        }
    }
}

fn is_join_attempt(text: &str) -> bool {
    let kind = serde_json::from_str::<Value>(text).ok().and_then(|value| {
        value
            .get("type")
            .and_then(Value::as_str)
            .and_then(MessageKind::from_tag)
    });
    kind == Some(MessageKind::Join)
}
