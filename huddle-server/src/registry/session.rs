use crate::registry::{ConnectionId, MemberOutbox, SessionCommand, SessionInfo};
use huddle_core::{ControlMessage, MemberId, SessionId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

struct MemberSlot {
    connection: ConnectionId,
    outbox: Arc<dyn MemberOutbox>,
}

/// One meeting. Owns its member set and relays negotiation messages between
/// members; all mutation happens on the actor's own task.
pub struct Session {
    id: SessionId,
    host: MemberId,
    created_at: SystemTime,
    members: HashMap<MemberId, MemberSlot>,
    command_rx: mpsc::Receiver<SessionCommand>,
    empty_ttl: Duration,
    expires_at: Option<Instant>,
}

impl Session {
    pub fn new(
        id: SessionId,
        host: MemberId,
        command_rx: mpsc::Receiver<SessionCommand>,
        empty_ttl: Duration,
    ) -> Self {
        Self {
            id,
            host,
            created_at: SystemTime::now(),
            members: HashMap::new(),
            command_rx,
            empty_ttl,
            expires_at: None,
        }
    }

    /// Runs until the session has been empty for `empty_ttl` or every sender
    /// is gone.
    pub async fn run(mut self) {
        info!("Session {} opened for host {}", self.id, self.host);
        self.expires_at = Some(Instant::now() + self.empty_ttl);

        loop {
            let deadline = self.expires_at;

            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("Command channel closed. Closing session {}", self.id);
                            break;
                        }
                    }
                }

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    info!("Session {} stayed empty for {:?}, discarding it", self.id, self.empty_ttl);
                    self.expire().await;
                    break;
                }
            }
        }

        info!("Session {} finished", self.id);
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Join {
                member,
                connection,
                outbox,
            } => {
                let slot = MemberSlot { connection, outbox };
                match self.members.insert(member.clone(), slot) {
                    Some(previous) => info!(
                        "Member {} rejoined session {} on {} (replacing {})",
                        member, self.id, connection, previous.connection
                    ),
                    None => info!("Member {} joined session {} on {}", member, self.id, connection),
                }
                self.expires_at = None;

                let notice = ControlMessage::MemberJoined {
                    session_id: self.id.clone(),
                    member: member.clone(),
                };
                self.broadcast_except(&member, &notice).await;
            }

            SessionCommand::Relay {
                from,
                connection,
                message,
            } => self.relay(from, connection, message).await,

            SessionCommand::Leave { member, connection } => {
                match self.members.get(&member) {
                    Some(slot) if slot.connection == connection => {
                        self.members.remove(&member);
                        info!("Member {} left session {}", member, self.id);
                    }
                    Some(slot) => debug!(
                        "Ignoring close of {} for {}: member is on {}",
                        connection, member, slot.connection
                    ),
                    None => {}
                }

                if self.members.is_empty() && self.expires_at.is_none() {
                    self.expires_at = Some(Instant::now() + self.empty_ttl);
                }
            }

            SessionCommand::Describe { reply } => {
                let _ = reply.send(self.info());
            }
        }
    }

    async fn relay(&self, from: MemberId, connection: ConnectionId, message: ControlMessage) {
        let kind = message.kind();

        let registered = self
            .members
            .get(&from)
            .is_some_and(|slot| slot.connection == connection);
        if !registered {
            warn!(
                "Dropping {} from {} on {}: not a member of session {}",
                kind, from, connection, self.id
            );
            return;
        }

        let Some(target) = message.target().cloned() else {
            warn!("Dropping {} from {}: not a relayable message", kind, from);
            return;
        };
        if target == from {
            debug!("Dropping {} from {} addressed to itself", kind, from);
            return;
        }
        let Some(slot) = self.members.get(&target) else {
            debug!(
                "Dropping {} from {} to {}: no such member in session {}",
                kind, from, target, self.id
            );
            return;
        };

        let message = message.stamped_by(from.clone());
        if let Err(e) = slot.outbox.deliver(&message).await {
            warn!("Failed to relay {} from {} to {}: {}", kind, from, target, e);
        }
    }

    async fn broadcast_except(&self, member: &MemberId, message: &ControlMessage) {
        for (other, slot) in self.members.iter().filter(|(id, _)| *id != member) {
            if let Err(e) = slot.outbox.deliver(message).await {
                warn!("Failed to notify {} in session {}: {}", other, self.id, e);
            }
        }
    }

    /// Stops accepting commands and answers joins still in the queue.
    async fn expire(&mut self) {
        self.command_rx.close();

        while let Ok(cmd) = self.command_rx.try_recv() {
            let SessionCommand::Join { member, outbox, .. } = cmd else {
                continue;
            };
            let reply = ControlMessage::SessionNotFound {
                session_id: Some(self.id.clone()),
            };
            if let Err(e) = outbox.deliver(&reply).await {
                debug!("Could not tell {} that session {} is gone: {}", member, self.id, e);
            }
        }
    }

    fn info(&self) -> SessionInfo {
        let mut members: Vec<MemberId> = self.members.keys().cloned().collect();
        members.sort();

        SessionInfo {
            id: self.id.clone(),
            host: self.host.clone(),
            created_at: self.created_at,
            members,
        }
    }
}
