use crate::config::RegistryConfig;
use crate::registry::{ConnectionId, Session, SessionCommand, SessionInfo};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use huddle_core::{MemberId, SessionId};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::info;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("session {0} already exists")]
    SessionExists(SessionId),
}

/// Directory of live sessions. Each session runs as its own actor and removes
/// itself from the directory once it is discarded.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<DashMap<SessionId, mpsc::Sender<SessionCommand>>>,
    next_connection: Arc<AtomicU64>,
    config: RegistryConfig,
}

impl SessionManager {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            next_connection: Arc::new(AtomicU64::new(1)),
            config,
        }
    }

    /// Creates a session with a fresh identifier.
    pub fn create(&self, host: MemberId) -> Result<SessionId, RegistryError> {
        self.create_with_id(SessionId::generate(), host)
    }

    pub fn create_with_id(&self, id: SessionId, host: MemberId) -> Result<SessionId, RegistryError> {
        let (tx, rx) = mpsc::channel(self.config.command_queue);

        match self.sessions.entry(id.clone()) {
            Entry::Occupied(_) => return Err(RegistryError::SessionExists(id)),
            Entry::Vacant(slot) => {
                slot.insert(tx.clone());
            }
        }

        info!("Creating new session {} for host {}", id, host);
        let session = Session::new(id.clone(), host, rx, self.config.empty_session_ttl);
        let sessions = self.sessions.clone();
        let session_id = id.clone();

        tokio::spawn(async move {
            session.run().await;
            sessions.remove_if(&session_id, |_, sender| sender.same_channel(&tx));
        });

        Ok(id)
    }

    pub fn sender(&self, id: &SessionId) -> Option<mpsc::Sender<SessionCommand>> {
        self.sessions.get(id).map(|sender| sender.clone())
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Asks the session actor for its metadata. `None` if the session is gone.
    pub async fn describe(&self, id: &SessionId) -> Option<SessionInfo> {
        let sender = self.sender(id)?;
        let (reply, rx) = oneshot::channel();
        sender.send(SessionCommand::Describe { reply }).await.ok()?;
        rx.await.ok()
    }

    pub fn next_connection_id(&self) -> ConnectionId {
        ConnectionId(self.next_connection.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}
