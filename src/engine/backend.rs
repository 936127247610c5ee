use super::error::EngineError;
use super::events::EngineEvent;
use crate::assistant::{AssistantConfig, AssistantOverrides};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A live subscription to an engine's event stream.
///
/// Dropping it releases the subscription: the forwarding task (if any) is
/// aborted and the receiver closes.
pub struct EventSubscription {
    events: mpsc::Receiver<EngineEvent>,
    forwarder: Option<JoinHandle<()>>,
}

impl EventSubscription {
    pub fn new(events: mpsc::Receiver<EngineEvent>) -> Self {
        Self {
            events,
            forwarder: None,
        }
    }

    /// Subscription fed by a background task that is aborted on drop
    pub fn with_forwarder(events: mpsc::Receiver<EngineEvent>, forwarder: JoinHandle<()>) -> Self {
        Self {
            events,
            forwarder: Some(forwarder),
        }
    }

    /// Next event, or `None` once the engine side has gone away
    pub async fn next(&mut self) -> Option<EngineEvent> {
        self.events.recv().await
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.events.close();
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
    }
}

/// Control surface of the external voice engine
///
/// Implementations:
/// - NATS bridge: control and events over NATS subjects
/// - Test doubles: scripted events from a channel
#[async_trait::async_trait]
pub trait VoiceEngine: Send + Sync {
    /// Whether the engine can accept a call right now
    fn is_available(&self) -> bool;

    /// Stand up a call with the given assistant and variable bindings
    async fn start(
        &self,
        assistant: &AssistantConfig,
        overrides: &AssistantOverrides,
    ) -> Result<(), EngineError>;

    /// Tear down the current call
    async fn stop(&self) -> Result<(), EngineError>;

    async fn is_muted(&self) -> Result<bool, EngineError>;

    async fn set_muted(&self, muted: bool) -> Result<(), EngineError>;

    /// Subscribe to the engine's event channels
    async fn subscribe(&self) -> Result<EventSubscription, EngineError>;

    /// Engine name for logging
    fn name(&self) -> &str;
}

/// Hands out one engine per call, keyed by call id
pub trait EngineConnector: Send + Sync {
    fn engine_for(&self, call_id: &str) -> Arc<dyn VoiceEngine>;
}
