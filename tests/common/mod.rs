// Test doubles for the call session collaborators
//
// The engine is scripted through a channel, the permission gate answers a
// fixed verdict, and the history writer records every write in memory.

#![allow(dead_code)]

use chrono::Utc;
use snowbrain_voice::engine::EngineConnector;
use snowbrain_voice::{
    AssistantConfig, CallSessionController, CallSnapshot, AssistantOverrides, EngineError, EngineEvent, EventSubscription,
    MicrophoneGrant, PermissionDenied, PermissionGate, PersistenceError, SessionConfig,
    SessionHistoryRecord, SessionHistoryWriter, VoiceEngine,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

pub struct ScriptedEngine {
    available: AtomicBool,
    fail_start: AtomicBool,
    muted: AtomicBool,
    starts: Mutex<Vec<(AssistantConfig, AssistantOverrides)>>,
    stops: AtomicUsize,
    mute_writes: AtomicUsize,
    hold_start: AtomicBool,
    /// Notified when a held `start` is entered
    pub start_entered: Notify,
    pub start_release: Notify,
    events_tx: Mutex<Option<mpsc::Sender<EngineEvent>>>,
    events_rx: Mutex<Option<mpsc::Receiver<EngineEvent>>>,
}

impl ScriptedEngine {
    pub fn new() -> Arc<Self> {
        let (events_tx, events_rx) = mpsc::channel(64);
        Arc::new(Self {
            available: AtomicBool::new(true),
            fail_start: AtomicBool::new(false),
            muted: AtomicBool::new(false),
            starts: Mutex::new(Vec::new()),
            stops: AtomicUsize::new(0),
            mute_writes: AtomicUsize::new(0),
            hold_start: AtomicBool::new(false),
            start_entered: Notify::new(),
            start_release: Notify::new(),
            events_tx: Mutex::new(Some(events_tx)),
            events_rx: Mutex::new(Some(events_rx)),
        })
    }

    pub fn unavailable() -> Arc<Self> {
        let engine = Self::new();
        engine.available.store(false, Ordering::SeqCst);
        engine
    }

    pub fn failing_start() -> Arc<Self> {
        let engine = Self::new();
        engine.fail_start.store(true, Ordering::SeqCst);
        engine
    }

    /// `start` blocks until `start_release` is notified
    pub fn holding_start() -> Arc<Self> {
        let engine = Self::new();
        engine.hold_start.store(true, Ordering::SeqCst);
        engine
    }

    fn sender(&self) -> mpsc::Sender<EngineEvent> {
        self.events_tx
            .lock()
            .unwrap()
            .clone()
            .expect("event stream already closed")
    }

    /// Deliver an event through the subscription, as the real engine would,
    /// and return once the controller has taken it off the channel
    pub async fn emit(&self, event: EngineEvent) {
        let tx = self.sender();
        tx.send(event)
            .await
            .expect("controller should still be subscribed");

        while tx.capacity() < tx.max_capacity() {
            tokio::task::yield_now().await;
        }
        tokio::task::yield_now().await;
    }

    /// End the event stream from the engine side
    pub fn close_events(&self) {
        self.events_tx.lock().unwrap().take();
    }

    pub fn start_count(&self) -> usize {
        self.starts.lock().unwrap().len()
    }

    pub fn last_start(&self) -> Option<(AssistantConfig, AssistantOverrides)> {
        self.starts.lock().unwrap().last().cloned()
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn mute_writes(&self) -> usize {
        self.mute_writes.load(Ordering::SeqCst)
    }

    pub fn engine_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    /// True once the subscriber side has been dropped
    pub fn subscription_released(&self) -> bool {
        self.events_tx
            .lock()
            .unwrap()
            .as_ref()
            .map_or(true, |tx| tx.is_closed())
    }
}

#[async_trait::async_trait]
impl VoiceEngine for ScriptedEngine {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn start(
        &self,
        assistant: &AssistantConfig,
        overrides: &AssistantOverrides,
    ) -> Result<(), EngineError> {
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(EngineError::Start("assistant rejected".to_string()));
        }
        if self.hold_start.load(Ordering::SeqCst) {
            self.start_entered.notify_one();
            self.start_release.notified().await;
        }
        self.starts
            .lock()
            .unwrap()
            .push((assistant.clone(), overrides.clone()));
        Ok(())
    }

    async fn stop(&self) -> Result<(), EngineError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn is_muted(&self) -> Result<bool, EngineError> {
        Ok(self.muted.load(Ordering::SeqCst))
    }

    async fn set_muted(&self, muted: bool) -> Result<(), EngineError> {
        self.mute_writes.fetch_add(1, Ordering::SeqCst);
        self.muted.store(muted, Ordering::SeqCst);
        Ok(())
    }

    async fn subscribe(&self) -> Result<EventSubscription, EngineError> {
        let rx = self
            .events_rx
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| EngineError::Unavailable("already subscribed".to_string()))?;
        Ok(EventSubscription::new(rx))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Creates a fresh scripted engine per call and remembers it by call id
#[derive(Default)]
pub struct ScriptedConnector {
    engines: Mutex<HashMap<String, Arc<ScriptedEngine>>>,
}

impl ScriptedConnector {
    pub fn engine(&self, call_id: &str) -> Option<Arc<ScriptedEngine>> {
        self.engines.lock().unwrap().get(call_id).cloned()
    }
}

impl EngineConnector for ScriptedConnector {
    fn engine_for(&self, call_id: &str) -> Arc<dyn VoiceEngine> {
        let engine = ScriptedEngine::new();
        self.engines
            .lock()
            .unwrap()
            .insert(call_id.to_string(), Arc::clone(&engine));
        engine
    }
}

pub struct StaticGate {
    grant: bool,
    calls: AtomicUsize,
}

impl StaticGate {
    pub fn granting() -> Arc<Self> {
        Arc::new(Self {
            grant: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn denying() -> Arc<Self> {
        Arc::new(Self {
            grant: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl PermissionGate for StaticGate {
    async fn acquire_microphone(&self) -> Result<MicrophoneGrant, PermissionDenied> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.grant {
            Ok(MicrophoneGrant)
        } else {
            Err(PermissionDenied::new("NotAllowedError: Permission denied"))
        }
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Holds the permission check open until released
#[derive(Default)]
pub struct HeldGate {
    pub entered: Notify,
    pub release: Notify,
}

#[async_trait::async_trait]
impl PermissionGate for HeldGate {
    async fn acquire_microphone(&self) -> Result<MicrophoneGrant, PermissionDenied> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(MicrophoneGrant)
    }

    fn name(&self) -> &str {
        "held"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryWrite {
    pub brain_id: String,
    pub user_text: String,
    pub assistant_text: String,
}

#[derive(Default)]
pub struct RecordingHistory {
    fail: bool,
    writes: Mutex<Vec<HistoryWrite>>,
}

impl RecordingHistory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            writes: Mutex::new(Vec::new()),
        })
    }

    pub fn writes(&self) -> Vec<HistoryWrite> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SessionHistoryWriter for RecordingHistory {
    async fn append_session_history(
        &self,
        brain_id: &str,
        user_text: &str,
        assistant_text: &str,
    ) -> Result<SessionHistoryRecord, PersistenceError> {
        let mut writes = self.writes.lock().unwrap();
        writes.push(HistoryWrite {
            brain_id: brain_id.to_string(),
            user_text: user_text.to_string(),
            assistant_text: assistant_text.to_string(),
        });

        if self.fail {
            return Err(PersistenceError::Rejected {
                status: 500,
                body: "database unavailable".to_string(),
            });
        }

        Ok(SessionHistoryRecord {
            id: format!("row-{}", writes.len()),
            user_id: "user_123".to_string(),
            brain_id: brain_id.to_string(),
            user_messages: user_text.to_string(),
            assistant_messages: assistant_text.to_string(),
            created_at: Utc::now(),
        })
    }
}

pub fn biology_session() -> SessionConfig {
    SessionConfig {
        brain_id: "brain-1".to_string(),
        brain_name: "Neura the Brainy Explorer".to_string(),
        subject: "science".to_string(),
        topic: "Cell biology".to_string(),
        voice: "calm".to_string(),
        style: "formal".to_string(),
        ..SessionConfig::default()
    }
}

/// Wait until the published snapshot satisfies `ready`
pub async fn wait_for_snapshot(
    controller: &CallSessionController,
    ready: impl FnMut(&CallSnapshot) -> bool,
) -> CallSnapshot {
    let mut updates = controller.subscribe();
    let snapshot = tokio::time::timeout(Duration::from_secs(2), updates.wait_for(ready))
        .await
        .expect("snapshot condition not reached in time")
        .expect("controller still mounted")
        .clone();
    snapshot
}
