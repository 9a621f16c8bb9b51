//! Open page sessions and the messages the engine pushes to them.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, mpsc};

pub type SessionId = u64;

/// Message sent from the engine to pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageMessage {
    UpdateAvailable { version: String },
}

struct SessionState {
    controller: Option<String>,
    tx: mpsc::UnboundedSender<PageMessage>,
}

/// Registry of connected page sessions.
#[derive(Clone, Default)]
pub struct Sessions {
    inner: Arc<RwLock<HashMap<SessionId, SessionState>>>,
    next_id: Arc<AtomicU64>,
}

/// The page side of a session: receives engine messages.
#[derive(Debug)]
pub struct PageSession {
    pub id: SessionId,
    rx: mpsc::UnboundedReceiver<PageMessage>,
}

impl PageSession {
    pub async fn recv(&mut self) -> Option<PageMessage> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<PageMessage> {
        self.rx.try_recv().ok()
    }
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new, uncontrolled page session.
    pub async fn connect(&self) -> PageSession {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.write().await.insert(id, SessionState { controller: None, tx });
        tracing::debug!(session = id, "page session connected");
        PageSession { id, rx }
    }

    pub async fn disconnect(&self, id: SessionId) {
        self.inner.write().await.remove(&id);
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Version controlling session `id`, if any.
    pub async fn controller_of(&self, id: SessionId) -> Option<String> {
        self.inner.read().await.get(&id).and_then(|s| s.controller.clone())
    }

    /// Make `version` the controller of every open session.
    ///
    /// Returns the number of sessions claimed.
    pub async fn claim(&self, version: &str) -> usize {
        let mut inner = self.inner.write().await;
        for state in inner.values_mut() {
            state.controller = Some(version.to_string());
        }
        tracing::info!(version, sessions = inner.len(), "claimed open page sessions");
        inner.len()
    }

    /// Send `message` to every open session, dropping sessions whose page
    /// went away. Returns the number of sessions reached.
    pub async fn broadcast(&self, message: PageMessage) -> usize {
        let mut inner = self.inner.write().await;
        inner.retain(|_, state| state.tx.send(message.clone()).is_ok());
        inner.len()
    }
}
