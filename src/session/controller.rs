use super::config::SessionConfig;
use super::error::CallError;
use super::state::{CallSnapshot, CallState, CallStatus, Effect, HistoryPayload};
use crate::assistant::{AssistantConfigBuilder, AssistantOverrides};
use crate::audio::PermissionGate;
use crate::engine::{EngineEvent, EventSubscription, VoiceEngine};
use crate::history::{PersistenceError, SessionHistoryRecord, SessionHistoryWriter};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

type HistoryTask = JoinHandle<Result<SessionHistoryRecord, PersistenceError>>;

struct Shared {
    session: SessionConfig,
    engine: Arc<dyn VoiceEngine>,
    permission: Arc<dyn PermissionGate>,
    history: Arc<dyn SessionHistoryWriter>,

    /// Never held across an await on a collaborator
    state: Mutex<CallState>,

    snapshots: watch::Sender<CallSnapshot>,

    /// Most recent session history write
    history_task: Mutex<Option<HistoryTask>>,
}

impl Shared {
    fn publish(&self, snapshot: CallSnapshot) {
        self.snapshots.send_replace(snapshot);
    }

    async fn handle_event(self: &Arc<Self>, event: EngineEvent) {
        debug!("Engine event: {}", event.channel());

        let (effect, attempt, snapshot) = {
            let mut state = self.state.lock().await;
            let effect = state.apply(&event);
            (effect, state.attempt(), state.snapshot())
        };

        self.run_effect(attempt, effect).await;
        self.publish(snapshot);
    }

    /// History writes are stored before the caller publishes, so a Finished
    /// observer can always await them
    async fn run_effect(self: &Arc<Self>, attempt: u64, effect: Effect) {
        match effect {
            Effect::None => {}
            Effect::ReportError { message, history } => {
                error!("Call on brain {} failed: {}", self.session.brain_id, message);
                if let Some(payload) = history {
                    self.spawn_history_write(attempt, payload).await;
                }
            }
            Effect::PersistHistory(payload) => {
                self.spawn_history_write(attempt, payload).await;
            }
        }
    }

    /// The event stream ended underneath a call in progress
    async fn stream_closed(self: &Arc<Self>) {
        let closed = {
            let mut state = self.state.lock().await;
            let attempt = state.attempt();
            let err = CallError::EngineRuntime("engine event stream closed".to_string());
            state
                .fail_attempt(attempt, err.to_string())
                .map(|effect| (attempt, effect, state.snapshot()))
        };

        if let Some((attempt, effect, snapshot)) = closed {
            self.run_effect(attempt, effect).await;
            self.publish(snapshot);
        }
    }

    async fn spawn_history_write(self: &Arc<Self>, attempt: u64, payload: HistoryPayload) {
        let shared = Arc::clone(self);

        let task = tokio::spawn(async move {
            let brain_id = &shared.session.brain_id;
            let result = shared
                .history
                .append_session_history(brain_id, &payload.user_text, &payload.assistant_text)
                .await;

            match &result {
                Ok(record) => info!("Saved session history {} for brain {}", record.id, brain_id),
                Err(e) => {
                    error!("Failed to save session history for brain {}: {}", brain_id, e);
                    let snapshot = {
                        let mut state = shared.state.lock().await;
                        state.note_error(attempt, e.to_string());
                        state.snapshot()
                    };
                    shared.publish(snapshot);
                }
            }

            result
        });

        let mut slot = self.history_task.lock().await;
        *slot = Some(task);
    }

    /// Finish `attempt` with `err` if it is still the live attempt
    async fn fail_attempt(self: &Arc<Self>, attempt: u64, err: &CallError) {
        let failed = {
            let mut state = self.state.lock().await;
            state
                .fail_attempt(attempt, err.to_string())
                .map(|effect| (effect, state.snapshot()))
        };

        if let Some((effect, snapshot)) = failed {
            self.run_effect(attempt, effect).await;
            self.publish(snapshot);
        }
    }
}

/// Drives one voice call session against an injected engine.
///
/// The engine event subscription is taken on [`mount`](Self::mount) and
/// held by a single pump task until [`unmount`](Self::unmount) or drop.
pub struct CallSessionController {
    shared: Arc<Shared>,
    pump: Option<JoinHandle<()>>,
}

impl CallSessionController {
    /// Subscribe to `engine` and start consuming its events
    pub async fn mount(
        session: SessionConfig,
        engine: Arc<dyn VoiceEngine>,
        permission: Arc<dyn PermissionGate>,
        history: Arc<dyn SessionHistoryWriter>,
    ) -> Result<Self, CallError> {
        info!(
            "Mounting call session for brain {} (engine={}, permission={})",
            session.brain_id,
            engine.name(),
            permission.name()
        );

        let subscription = engine.subscribe().await?;

        let state = CallState::new(session.history_separator.clone());
        let (snapshots, _) = watch::channel(state.snapshot());

        let shared = Arc::new(Shared {
            session,
            engine,
            permission,
            history,
            state: Mutex::new(state),
            snapshots,
            history_task: Mutex::new(None),
        });

        let pump = tokio::spawn(Self::pump_events(Arc::clone(&shared), subscription));

        Ok(Self {
            shared,
            pump: Some(pump),
        })
    }

    async fn pump_events(shared: Arc<Shared>, mut subscription: EventSubscription) {
        info!("Engine event pump started");

        while let Some(event) = subscription.next().await {
            shared.handle_event(event).await;
        }

        warn!("Engine event stream closed");
        shared.stream_closed().await;
    }

    /// Start a new call attempt.
    ///
    /// On `Err` the session is already Finished and the snapshot carries the
    /// reason. A disconnect during the permission check cancels the attempt
    /// without starting the engine; one that lands while the engine is
    /// starting tears the new engine session down again.
    pub async fn start_call(&self) -> Result<(), CallError> {
        let attempt = {
            let mut state = self.shared.state.lock().await;
            if state.status().is_in_progress() {
                warn!("Call already in progress");
                return Ok(());
            }
            let attempt = state.begin_attempt();
            self.shared.publish(state.snapshot());
            attempt
        };

        let session = &self.shared.session;
        info!("Starting call attempt {} for brain {}", attempt, session.brain_id);

        if let Err(denied) = self.shared.permission.acquire_microphone().await {
            warn!("Microphone permission error: {}", denied.reason);
            let err = CallError::from(denied);
            self.shared.fail_attempt(attempt, &err).await;
            return Err(err);
        }

        let engine = &self.shared.engine;
        if !engine.is_available() {
            error!("Voice engine {} not available", engine.name());
            let err = CallError::EngineUnavailable(format!("{} is not connected", engine.name()));
            self.shared.fail_attempt(attempt, &err).await;
            return Err(err);
        }

        if !self.shared.state.lock().await.is_current(attempt) {
            info!("Call attempt {} cancelled before engine start", attempt);
            return Ok(());
        }

        let assistant = AssistantConfigBuilder::build(&session.voice, &session.style);
        let overrides = AssistantOverrides::for_session(&session.subject, &session.topic, &session.style);

        if let Err(e) = engine.start(&assistant, &overrides).await {
            error!("Failed to start call: {}", e);
            let err = CallError::from(e);
            self.shared.fail_attempt(attempt, &err).await;
            return Err(err);
        }

        if !self.shared.state.lock().await.mark_engine_started(attempt) {
            info!("Call attempt {} ended while the engine was starting, stopping it", attempt);
            if let Err(e) = engine.stop().await {
                error!("Error stopping cancelled call: {}", e);
            }
            return Ok(());
        }

        info!("Call attempt {} handed to engine, waiting for call-start", attempt);

        Ok(())
    }

    /// End the call locally and tell the engine to stop. No-op when no call is in progress.
    /// The transcript so far is saved here rather than on the engine's `call-end`.
    pub async fn disconnect(&self) {
        let (attempt, effect, snapshot) = {
            let mut state = self.shared.state.lock().await;
            let Some(effect) = state.finish_local() else {
                debug!("Disconnect ignored while {:?}", state.status());
                return;
            };
            (state.attempt(), effect, state.snapshot())
        };
        self.shared.run_effect(attempt, effect).await;
        self.shared.publish(snapshot);

        info!("Disconnecting call for brain {}", self.shared.session.brain_id);

        if let Err(e) = self.shared.engine.stop().await {
            error!("Error disconnecting call: {}", e);
        }
    }

    /// Invert the engine's mute flag and mirror it locally. Returns the new flag.
    pub async fn toggle_microphone(&self) -> Result<bool, CallError> {
        {
            let state = self.shared.state.lock().await;
            if !state.status().is_in_progress() {
                debug!("Mute toggle ignored while {:?}", state.status());
                return Ok(state.is_muted());
            }
        }

        let engine = &self.shared.engine;
        let muted = !engine.is_muted().await?;
        engine.set_muted(muted).await?;

        let snapshot = {
            let mut state = self.shared.state.lock().await;
            state.set_muted(muted);
            state.snapshot()
        };
        self.shared.publish(snapshot);

        info!("Microphone {}", if muted { "muted" } else { "unmuted" });

        Ok(muted)
    }

    /// Await the pending session history write, if one was started
    pub async fn wait_for_history(&self) -> Option<Result<SessionHistoryRecord, PersistenceError>> {
        let task = self.shared.history_task.lock().await.take()?;

        match task.await {
            Ok(result) => Some(result),
            Err(e) => {
                error!("Session history task panicked: {}", e);
                Some(Err(PersistenceError::Request(format!(
                    "history task failed: {}",
                    e
                ))))
            }
        }
    }

    pub async fn snapshot(&self) -> CallSnapshot {
        self.shared.state.lock().await.snapshot()
    }

    pub async fn status(&self) -> CallStatus {
        self.shared.state.lock().await.status()
    }

    /// Snapshot updates, for presentation layers
    pub fn subscribe(&self) -> watch::Receiver<CallSnapshot> {
        self.shared.snapshots.subscribe()
    }

    pub fn session(&self) -> &SessionConfig {
        &self.shared.session
    }

    /// Release the engine event subscription
    pub async fn unmount(mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
            if let Err(e) = pump.await {
                if !e.is_cancelled() {
                    error!("Engine event pump panicked: {}", e);
                }
            }
        }
        info!("Unmounted call session for brain {}", self.shared.session.brain_id);
    }
}

impl Drop for CallSessionController {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}
