use super::messages::{control_subject, events_subject, ControlMessage};
use crate::assistant::{AssistantConfig, AssistantOverrides};
use crate::engine::{EngineConnector, EngineError, EngineEvent, EventSubscription, VoiceEngine};
use anyhow::{Context, Result};
use async_nats::Client;
use futures::stream::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Buffered engine events per subscription
const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Shared NATS connection that hands out one engine bridge per call
pub struct NatsEngineConnector {
    client: Client,
}

impl NatsEngineConnector {
    /// Connect to NATS server
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl EngineConnector for NatsEngineConnector {
    fn engine_for(&self, call_id: &str) -> Arc<dyn VoiceEngine> {
        Arc::new(NatsVoiceEngine::new(self.client.clone(), call_id.to_string()))
    }
}

/// Voice engine reached over NATS.
///
/// Control messages go to `voice.control.<call_id>`; events come back on
/// `voice.events.<call_id>`. The mute flag is mirrored here because the
/// engine does not answer queries.
pub struct NatsVoiceEngine {
    client: Client,
    call_id: String,
    muted: AtomicBool,
}

impl NatsVoiceEngine {
    pub fn new(client: Client, call_id: String) -> Self {
        Self {
            client,
            call_id,
            muted: AtomicBool::new(false),
        }
    }

    async fn publish_control(&self, message: &ControlMessage<'_>) -> Result<(), EngineError> {
        let subject = control_subject(&self.call_id);

        let payload =
            serde_json::to_vec(message).map_err(|e| EngineError::Control(e.to_string()))?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .map_err(|e| EngineError::Control(e.to_string()))?;

        debug!("Published control message to {}", subject);

        Ok(())
    }
}

#[async_trait::async_trait]
impl VoiceEngine for NatsVoiceEngine {
    fn is_available(&self) -> bool {
        matches!(
            self.client.connection_state(),
            async_nats::connection::State::Connected
        )
    }

    async fn start(
        &self,
        assistant: &AssistantConfig,
        overrides: &AssistantOverrides,
    ) -> Result<(), EngineError> {
        self.muted.store(false, Ordering::SeqCst);

        self.publish_control(&ControlMessage::Start {
            assistant,
            assistant_overrides: overrides,
        })
        .await
        .map_err(|e| EngineError::Start(e.to_string()))?;

        info!(
            "Requested call {} (assistant={}, voice={})",
            self.call_id,
            assistant.name(),
            assistant.voice_id()
        );

        Ok(())
    }

    async fn stop(&self) -> Result<(), EngineError> {
        info!("Requesting stop for call {}", self.call_id);
        self.publish_control(&ControlMessage::Stop).await
    }

    async fn is_muted(&self) -> Result<bool, EngineError> {
        Ok(self.muted.load(Ordering::SeqCst))
    }

    async fn set_muted(&self, muted: bool) -> Result<(), EngineError> {
        self.publish_control(&ControlMessage::SetMuted { muted }).await?;
        self.muted.store(muted, Ordering::SeqCst);
        Ok(())
    }

    async fn subscribe(&self) -> Result<EventSubscription, EngineError> {
        let subject = events_subject(&self.call_id);

        info!("Subscribing to engine events on {}", subject);

        let mut subscriber = self
            .client
            .subscribe(subject.clone())
            .await
            .map_err(|e| EngineError::Unavailable(format!("subscribe to {}: {}", subject, e)))?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        // Aborted when the subscription drops; dropping `subscriber` unsubscribes
        let forwarder = tokio::spawn(async move {
            while let Some(msg) = subscriber.next().await {
                match EngineEvent::from_slice(&msg.payload) {
                    Ok(event) => {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Dropping unrecognized engine event on {}: {}", subject, e);
                    }
                }
            }

            debug!("Engine event forwarder for {} stopped", subject);
        });

        Ok(EventSubscription::with_forwarder(rx, forwarder))
    }

    fn name(&self) -> &str {
        "nats"
    }
}
