//! Control messages sent from pages to the engine.

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::engine::Engine;

/// Wire form: `{"type":"SKIP_WAITING"}`, `{"type":"CLEAR_CACHE"}`,
/// `{"type":"GET_VERSION"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    SkipWaiting,
    ClearCache,
    GetVersion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlReply {
    ClearCache { success: bool },
    Version { version: String },
}

impl Engine {
    /// Apply `message`. SKIP_WAITING has no reply.
    pub async fn handle_control(&self, message: ControlMessage) -> Option<ControlReply> {
        tracing::debug!(?message, "control message");
        match message {
            ControlMessage::SkipWaiting => {
                self.skip_waiting().await;
                None
            }
            ControlMessage::ClearCache => {
                let name = self.cache_name();
                let success = match self.store.delete_store(&name).await {
                    Ok(existed) => {
                        tracing::info!(generation = %name, existed, "cache cleared");
                        true
                    }
                    Err(e) => {
                        tracing::warn!("failed to clear {}: {}", name, e);
                        false
                    }
                };
                Some(ControlReply::ClearCache { success })
            }
            ControlMessage::GetVersion => Some(ControlReply::Version { version: self.version().to_string() }),
        }
    }

    /// Apply `message` and answer on `reply` if the sender supplied one.
    ///
    /// A reply to a sender that has gone away is dropped.
    pub async fn on_control_message(&self, message: ControlMessage, reply: Option<oneshot::Sender<ControlReply>>) {
        let answer = self.handle_control(message).await;
        match (answer, reply) {
            (Some(answer), Some(tx)) => {
                if tx.send(answer).is_err() {
                    tracing::debug!(?message, "reply channel closed");
                }
            }
            (Some(_), None) => tracing::debug!(?message, "no reply channel, answer dropped"),
            (None, _) => {}
        }
    }
}
