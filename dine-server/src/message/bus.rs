//! Event broadcaster
//!
//! Single egress point for state-change events. Lifecycles call
//! [`EventBroadcaster::publish`] exactly once per successful mutation; the
//! broadcaster fans the event out to every registered session and mirrors
//! it on an observer channel for in-process subscribers.

use std::sync::Arc;

use serde::Serialize;
use shared::error::{AppError, AppResult};
use shared::message::{BusMessage, EventName, EventPayload};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use super::registry::SessionRegistry;

pub struct EventBroadcaster {
    sessions: Arc<SessionRegistry>,
    observer_tx: broadcast::Sender<BusMessage>,
    shutdown_token: CancellationToken,
}

impl EventBroadcaster {
    pub fn new(sessions: Arc<SessionRegistry>, channel_capacity: usize) -> Self {
        let (observer_tx, _) = broadcast::channel(channel_capacity);
        Self {
            sessions,
            observer_tx,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Publish one state-change event to all sessions
    ///
    /// Called only after the mutation committed. Per-session delivery
    /// failures are logged inside the registry and do not fail the
    /// operation; the returned count says how many sessions got it.
    pub async fn publish<T: Serialize>(&self, event: EventName, data: &T) -> AppResult<usize> {
        let value = serde_json::to_value(data)
            .map_err(|e| AppError::internal(format!("event serialization failed: {}", e)))?;
        let msg = BusMessage::event(&EventPayload::new(event, value));

        // No observer subscribed is normal operation
        let _ = self.observer_tx.send(msg.clone());

        let delivered = self.sessions.broadcast(&msg).await;
        tracing::debug!(event = %event, delivered, "event published");
        Ok(delivered)
    }

    /// Subscribe to the in-process observer channel
    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.observer_tx.subscribe()
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown_token
    }

    pub fn shutdown(&self) {
        tracing::info!("shutting down event broadcaster");
        self.shutdown_token.cancel();
    }
}
