use crate::config::ClientConfig;
use crate::error::SignalingError;
use crate::media::MediaReadiness;
use crate::peer::{PeerConnectionFactory, PeerNotice};
use crate::signaling::{ClientCommand, ClientEvent, EntryTaskResult};
use crate::table::{CandidateBuffer, PeerSummary, PeerTable};
use crate::transport::{
    ChannelEvent, ChannelState, Connector, ControlSender, SupervisorHandle, TransportSupervisor,
};
use huddle_core::{ControlMessage, MemberId, SessionId};
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Negotiates peer connections for one local member against every other
/// member of one session.
///
/// All state lives inside a single task. Channel frames, peer connection
/// callbacks and entry-owned timers are funnelled into it and handled one at a
/// time, so a member's entry is never touched concurrently.
pub struct SignalingClient {
    pub(super) config: ClientConfig,
    pub(super) local: MemberId,
    pub(super) session: SessionId,
    pub(super) factory: Arc<dyn PeerConnectionFactory>,
    pub(super) media: MediaReadiness,
    pub(super) peers: PeerTable,
    pub(super) pending: CandidateBuffer,
    pub(super) supervisor: SupervisorHandle,
    pub(super) control: ControlSender,
    pub(super) events: mpsc::UnboundedSender<ClientEvent>,
    pub(super) notice_tx: mpsc::UnboundedSender<PeerNotice>,
    pub(super) task_tx: mpsc::UnboundedSender<EntryTaskResult>,
    channel_rx: mpsc::UnboundedReceiver<ChannelEvent>,
    notice_rx: mpsc::UnboundedReceiver<PeerNotice>,
    task_rx: mpsc::UnboundedReceiver<EntryTaskResult>,
    command_rx: mpsc::Receiver<ClientCommand>,
}

/// Caller side of a running [`SignalingClient`].
#[derive(Clone)]
pub struct ClientHandle {
    local: MemberId,
    session: SessionId,
    commands: mpsc::Sender<ClientCommand>,
    control: ControlSender,
}

impl SignalingClient {
    /// Starts connecting and returns immediately. Progress and failures are
    /// reported on the returned receiver.
    pub fn spawn(
        config: ClientConfig,
        local: MemberId,
        session: SessionId,
        connector: Arc<dyn Connector>,
        factory: Arc<dyn PeerConnectionFactory>,
        media: MediaReadiness,
    ) -> (ClientHandle, mpsc::UnboundedReceiver<ClientEvent>) {
        let join = ControlMessage::Join {
            session_id: session.clone(),
            member: local.clone(),
        };
        let (supervisor, channel_rx) = TransportSupervisor::spawn(connector, join, config.reconnect);
        let control = supervisor.sender();

        let (events, events_rx) = mpsc::unbounded_channel();
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let (task_tx, task_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::channel(16);

        let pending = CandidateBuffer::new(config.max_pending_candidates);
        let client = SignalingClient {
            config,
            local: local.clone(),
            session: session.clone(),
            factory,
            media,
            peers: PeerTable::new(),
            pending,
            supervisor,
            control: control.clone(),
            events,
            notice_tx,
            task_tx,
            channel_rx,
            notice_rx,
            task_rx,
            command_rx,
        };
        tokio::spawn(client.run());

        let handle = ClientHandle {
            local,
            session,
            commands: command_tx,
            control,
        };
        (handle, events_rx)
    }

    async fn run(mut self) {
        info!("Signaling client {} started for session {}", self.local, self.session);

        loop {
            let flow = tokio::select! {
                cmd = self.command_rx.recv() => self.handle_command(cmd).await,

                Some(event) = self.channel_rx.recv() => self.handle_channel_event(event).await,

                Some(notice) = self.notice_rx.recv() => {
                    self.handle_peer_notice(notice).await;
                    ControlFlow::Continue(())
                }

                Some(result) = self.task_rx.recv() => {
                    self.handle_task_result(result).await;
                    ControlFlow::Continue(())
                }

                else => ControlFlow::Break(()),
            };

            if flow.is_break() {
                break;
            }
        }

        info!("Signaling client {} finished", self.local);
    }

    async fn handle_command(&mut self, cmd: Option<ClientCommand>) -> ControlFlow<()> {
        match cmd {
            Some(ClientCommand::Leave { done }) => {
                self.leave().await;
                let _ = done.send(());
                ControlFlow::Break(())
            }
            Some(ClientCommand::Snapshot { reply }) => {
                let _ = reply.send(self.peers.snapshot());
                ControlFlow::Continue(())
            }
            None => {
                debug!("All client handles dropped, leaving");
                self.leave().await;
                ControlFlow::Break(())
            }
        }
    }

    async fn handle_channel_event(&mut self, event: ChannelEvent) -> ControlFlow<()> {
        match event {
            ChannelEvent::Opened { reconnect } => {
                self.emit(ClientEvent::Joined { reconnect });
                ControlFlow::Continue(())
            }
            ChannelEvent::Frame(text) => self.handle_frame(&text).await,
            ChannelEvent::Lost { reason } => {
                debug!(
                    "Keeping {} peer entries: {}",
                    self.peers.len(),
                    SignalingError::ChannelLost(reason)
                );
                ControlFlow::Continue(())
            }
            ChannelEvent::Reconnecting { attempt, delay } => {
                self.emit(ClientEvent::Reconnecting { attempt, delay });
                ControlFlow::Continue(())
            }
            ChannelEvent::Unavailable { attempts } => {
                warn!("{}", SignalingError::ReconnectExhausted { attempts });
                self.terminate(ClientEvent::SessionUnavailable { attempts }).await;
                ControlFlow::Break(())
            }
            ChannelEvent::Closed => ControlFlow::Break(()),
        }
    }

    async fn handle_task_result(&mut self, result: EntryTaskResult) {
        match result {
            EntryTaskResult::MediaReady { member, generation } => {
                self.start_offer(&member, generation).await;
            }
            EntryTaskResult::MediaTimedOut {
                member,
                generation,
                waited,
            } => {
                if self.peers.current(&member, generation).is_some() {
                    let error = SignalingError::MediaUnavailableTimeout {
                        member: member.clone(),
                        waited,
                    };
                    self.fail_peer(&member, error).await;
                }
            }
            EntryTaskResult::OfferDelivered { member, generation } => {
                let Some(entry) = self.peers.current(&member, generation) else {
                    return;
                };
                let held = entry.offer_delivered();
                if !held.is_empty() {
                    info!("Sending {} candidates held for {}", held.len(), member);
                }
                for candidate in held {
                    self.send_candidate(&member, candidate);
                }
            }
            EntryTaskResult::OfferUndeliverable {
                member,
                generation,
                attempts,
            } => {
                if self.peers.current(&member, generation).is_some() {
                    let error = SignalingError::OfferUndeliverable {
                        member: member.clone(),
                        attempts,
                    };
                    self.fail_peer(&member, error).await;
                }
            }
        }
    }

    pub(super) fn emit(&self, event: ClientEvent) {
        if self.events.send(event).is_err() {
            debug!("Client event dropped, receiver is gone");
        }
    }

    /// Sends a message that is not retried when the channel is down.
    pub(super) fn send_control(&self, message: ControlMessage) {
        let kind = message.kind();
        if let Err(e) = self.control.send(message) {
            warn!("Dropping outbound {}: {}", kind, e);
        }
    }
}

impl ClientHandle {
    pub fn local(&self) -> &MemberId {
        &self.local
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    pub fn channel_state(&self) -> ChannelState {
        self.control.state()
    }

    /// Whether the client has stopped for good: it left, or the session ended.
    pub fn is_finished(&self) -> bool {
        self.channel_state().is_terminal()
    }

    /// Leaves the session: closes every peer connection, closes the control
    /// channel without reconnecting and waits for the client to stop.
    /// Returns immediately if the client already stopped.
    pub async fn leave(&self) {
        if self.is_finished() {
            debug!("Client {} already stopped", self.local);
            return;
        }
        let (done, wait) = oneshot::channel();
        if self.commands.send(ClientCommand::Leave { done }).await.is_err() {
            return;
        }
        let _ = wait.await;
    }

    /// Role and phase of every current peer entry, ordered by member.
    pub async fn snapshot(&self) -> Vec<PeerSummary> {
        let (reply, rx) = oneshot::channel();
        if self.commands.send(ClientCommand::Snapshot { reply }).await.is_err() {
            return Vec::new();
        }
        rx.await.unwrap_or_default()
    }
}
