use crate::config::BackoffPolicy;
use crate::transport::{ChannelEvent, ChannelLink, ChannelState, Connector, ControlSender};
use futures::{SinkExt, StreamExt};
use huddle_core::{ControlMessage, encode_text};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

enum LinkOutcome {
    Shutdown,
    Lost(String),
}

/// Owns the single control channel of one client.
///
/// Connection attempts run one after another inside one task, so at most one
/// reconnect is ever in flight and a loss observed while waiting is simply
/// the next iteration.
pub struct TransportSupervisor {
    connector: Arc<dyn Connector>,
    join: ControlMessage,
    policy: BackoffPolicy,
    outbound_rx: mpsc::UnboundedReceiver<ControlMessage>,
    state_tx: watch::Sender<ChannelState>,
    events_tx: mpsc::UnboundedSender<ChannelEvent>,
    shutdown_rx: watch::Receiver<bool>,
}

pub struct SupervisorHandle {
    sender: ControlSender,
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SupervisorHandle {
    pub fn sender(&self) -> ControlSender {
        self.sender.clone()
    }

    pub fn state(&self) -> ChannelState {
        self.sender.state()
    }

    /// Closes the channel deliberately and cancels any pending reconnect.
    /// Resolves once the supervisor task has finished.
    pub async fn shutdown(&mut self) {
        self.shutdown_tx.send_replace(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("Transport supervisor task failed: {:?}", e);
            }
        }
    }
}

impl TransportSupervisor {
    /// Starts connecting right away. `join` is sent first on every channel
    /// that opens.
    pub fn spawn(
        connector: Arc<dyn Connector>,
        join: ControlMessage,
        policy: BackoffPolicy,
    ) -> (SupervisorHandle, mpsc::UnboundedReceiver<ChannelEvent>) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ChannelState::Connecting);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let supervisor = TransportSupervisor {
            connector,
            join,
            policy,
            outbound_rx,
            state_tx,
            events_tx,
            shutdown_rx,
        };
        let task = tokio::spawn(supervisor.run());

        let handle = SupervisorHandle {
            sender: ControlSender::new(outbound_tx, state_rx),
            shutdown_tx,
            task: Some(task),
        };
        (handle, events_rx)
    }

    async fn run(mut self) {
        let mut attempt: u32 = 0;
        let mut opened_before = false;

        loop {
            let connected = tokio::select! {
                _ = shutdown_requested(&mut self.shutdown_rx) => break,
                res = self.connector.connect() => res,
            };

            let outcome = match connected {
                Ok(link) => {
                    attempt = 0;
                    let outcome = self.pump(link, opened_before).await;
                    opened_before = true;
                    outcome
                }
                Err(e) => LinkOutcome::Lost(e.to_string()),
            };

            let reason = match outcome {
                LinkOutcome::Shutdown => break,
                LinkOutcome::Lost(reason) => reason,
            };

            warn!("Control channel lost: {}", reason);
            self.emit(ChannelEvent::Lost { reason });

            attempt += 1;
            if !self.policy.allows(attempt) {
                let attempts = attempt - 1;
                error!(
                    "Control channel unavailable after {} reconnect attempts",
                    attempts
                );
                self.state_tx.send_replace(ChannelState::Unavailable);
                self.emit(ChannelEvent::Unavailable { attempts });
                return;
            }

            let delay = self.policy.delay_for(attempt);
            info!("Reconnecting in {:?} (attempt {})", delay, attempt);
            self.state_tx
                .send_replace(ChannelState::Reconnecting { attempt });
            self.emit(ChannelEvent::Reconnecting { attempt, delay });

            tokio::select! {
                _ = shutdown_requested(&mut self.shutdown_rx) => break,
                _ = sleep(delay) => {}
            }
        }

        info!("Control channel closed");
        self.state_tx.send_replace(ChannelState::Closed);
        self.emit(ChannelEvent::Closed);
    }

    async fn pump(&mut self, link: ChannelLink, reconnect: bool) -> LinkOutcome {
        let ChannelLink {
            mut sink,
            mut stream,
        } = link;

        let join = match encode_text(&self.join) {
            Ok(text) => text,
            Err(e) => return LinkOutcome::Lost(format!("join could not be encoded: {}", e)),
        };
        if let Err(e) = sink.send(join).await {
            return LinkOutcome::Lost(e.to_string());
        }

        info!("Control channel open (reconnect: {})", reconnect);
        self.state_tx.send_replace(ChannelState::Open);
        self.emit(ChannelEvent::Opened { reconnect });

        loop {
            tokio::select! {
                _ = shutdown_requested(&mut self.shutdown_rx) => {
                    if let Err(e) = sink.close().await {
                        debug!("Error while closing control channel: {}", e);
                    }
                    return LinkOutcome::Shutdown;
                }

                outbound = self.outbound_rx.recv() => {
                    let Some(message) = outbound else {
                        let _ = sink.close().await;
                        return LinkOutcome::Shutdown;
                    };
                    let text = match encode_text(&message) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!("Dropping {} that failed to encode: {}", message.kind(), e);
                            continue;
                        }
                    };
                    if let Err(e) = sink.send(text).await {
                        return LinkOutcome::Lost(e.to_string());
                    }
                }

                frame = stream.next() => match frame {
                    Some(Ok(text)) => self.emit(ChannelEvent::Frame(text)),
                    Some(Err(e)) => return LinkOutcome::Lost(e.to_string()),
                    None => return LinkOutcome::Lost("closed by remote".to_string()),
                },
            }
        }
    }

    fn emit(&self, event: ChannelEvent) {
        if self.events_tx.send(event).is_err() {
            debug!("Channel event dropped, client is gone");
        }
    }
}

/// Resolves once shutdown was requested or the handle was dropped.
async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|requested| *requested).await;
}
