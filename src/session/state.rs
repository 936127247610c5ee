use crate::engine::{EngineEvent, EngineMessage, TranscriptKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Speaker of a transcript turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One finalized utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptTurn {
    pub role: Role,
    pub content: String,
}

impl TranscriptTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Display line: the brain's first name for assistant turns, the user's name otherwise
    pub fn display_line(&self, brain_name: &str, user_name: &str) -> String {
        match self.role {
            Role::Assistant => {
                let first_name = brain_name.split(' ').next().unwrap_or_default();
                format!("{}: {}", first_name, self.content)
            }
            Role::User | Role::System => format!("{}:{}", user_name, self.content),
        }
    }
}

/// Lifecycle of one call attempt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallStatus {
    #[default]
    Inactive,
    Connecting,
    Active,
    Finished,
}

impl CallStatus {
    pub fn is_in_progress(self) -> bool {
        matches!(self, CallStatus::Connecting | CallStatus::Active)
    }
}

/// Read-only view of the session for presentation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CallSnapshot {
    pub status: CallStatus,
    pub is_muted: bool,
    pub is_speaking: bool,
    /// Oldest turn first
    pub transcript: Vec<TranscriptTurn>,
    pub last_error: Option<String>,
}

/// Condensed exchange handed to the history writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryPayload {
    pub user_text: String,
    pub assistant_text: String,
}

/// Side effect requested by a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    PersistHistory(HistoryPayload),
    /// `history` is set when the failed attempt still had turns to save
    ReportError {
        message: String,
        history: Option<HistoryPayload>,
    },
}

/// Call session state machine.
///
/// Status only moves forward within an attempt
/// (Inactive → Connecting → Active → Finished); only
/// [`CallState::begin_attempt`] goes back to Connecting.
///
/// Every path to Finished closes the attempt exactly once, and closing is
/// what hands a non-empty transcript to the history writer. An engine
/// session that was stopped before its `call-end` arrived leaves one stale
/// `call-end` owed; the next attempt absorbs it while Connecting.
#[derive(Debug, Clone)]
pub struct CallState {
    status: CallStatus,
    is_muted: bool,
    is_speaking: bool,
    transcript: Vec<TranscriptTurn>,
    last_error: Option<String>,
    attempt: u64,
    /// The current attempt has been closed
    closed: bool,
    /// The engine was handed the current attempt and has not sent `call-end`
    engine_pending: bool,
    /// A `call-end` from an earlier engine session may still arrive
    stale_call_end: bool,
    separator: String,
}

impl Default for CallState {
    fn default() -> Self {
        Self::new(" | ")
    }
}

impl CallState {
    /// `separator` joins turns of the same role in the history payload
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            status: CallStatus::Inactive,
            is_muted: false,
            is_speaking: false,
            transcript: Vec::new(),
            last_error: None,
            attempt: 0,
            closed: false,
            engine_pending: false,
            stale_call_end: false,
            separator: separator.into(),
        }
    }

    pub fn status(&self) -> CallStatus {
        self.status
    }

    pub fn is_muted(&self) -> bool {
        self.is_muted
    }

    pub fn is_speaking(&self) -> bool {
        self.is_speaking
    }

    pub fn transcript(&self) -> &[TranscriptTurn] {
        &self.transcript
    }

    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    pub fn snapshot(&self) -> CallSnapshot {
        CallSnapshot {
            status: self.status,
            is_muted: self.is_muted,
            is_speaking: self.is_speaking,
            transcript: self.transcript.clone(),
            last_error: self.last_error.clone(),
        }
    }

    /// Reset for a fresh attempt and enter Connecting. Returns the attempt number.
    pub fn begin_attempt(&mut self) -> u64 {
        self.attempt += 1;
        self.status = CallStatus::Connecting;
        self.is_muted = false;
        self.is_speaking = false;
        self.transcript.clear();
        self.last_error = None;
        self.closed = false;
        self.stale_call_end |= self.engine_pending;
        self.engine_pending = false;
        self.attempt
    }

    /// Whether `attempt` is still the live attempt and has not finished
    pub fn is_current(&self, attempt: u64) -> bool {
        self.attempt == attempt && self.status.is_in_progress()
    }

    /// Record that the engine accepted `attempt`.
    ///
    /// Returns false when the attempt ended while the engine was starting;
    /// the caller then owns tearing that engine session down.
    pub fn mark_engine_started(&mut self, attempt: u64) -> bool {
        if self.attempt == attempt {
            self.engine_pending = true;
        } else {
            self.stale_call_end = true;
        }
        self.is_current(attempt)
    }

    /// End `attempt` abnormally. Returns `None` for stale attempts.
    pub fn fail_attempt(&mut self, attempt: u64, reason: impl Into<String>) -> Option<Effect> {
        if !self.is_current(attempt) {
            return None;
        }
        let message = reason.into();
        self.last_error = Some(message.clone());
        let history = self.close();
        Some(Effect::ReportError { message, history })
    }

    /// Local disconnect. Returns `None` when no call was in progress.
    pub fn finish_local(&mut self) -> Option<Effect> {
        if !self.status.is_in_progress() {
            return None;
        }
        Some(match self.close() {
            Some(payload) => Effect::PersistHistory(payload),
            None => Effect::None,
        })
    }

    /// Move to Finished and take the history payload, once per attempt
    fn close(&mut self) -> Option<HistoryPayload> {
        self.status = CallStatus::Finished;
        self.is_speaking = false;
        if self.closed {
            return None;
        }
        self.closed = true;
        if self.transcript.is_empty() {
            None
        } else {
            Some(self.history_payload())
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.is_muted = muted;
    }

    /// Record a failed history write against `attempt`
    pub fn note_error(&mut self, attempt: u64, reason: impl Into<String>) {
        if self.attempt == attempt {
            self.last_error = Some(reason.into());
        }
    }

    /// Apply one engine event and return the side effect it requires
    pub fn apply(&mut self, event: &EngineEvent) -> Effect {
        match event {
            EngineEvent::CallStart => {
                if self.status == CallStatus::Connecting {
                    self.status = CallStatus::Active;
                    self.stale_call_end = false;
                } else {
                    debug!("Ignoring call-start while {:?}", self.status);
                }
                Effect::None
            }

            EngineEvent::CallEnd => {
                if self.status == CallStatus::Connecting && self.stale_call_end {
                    debug!("Absorbing call-end from the previous engine session");
                    self.stale_call_end = false;
                    return Effect::None;
                }
                self.engine_pending = false;
                if self.status == CallStatus::Inactive || self.closed {
                    debug!("Ignoring call-end while {:?}", self.status);
                    return Effect::None;
                }

                match self.close() {
                    Some(payload) => Effect::PersistHistory(payload),
                    None => Effect::None,
                }
            }

            EngineEvent::Message { message } => {
                if self.status != CallStatus::Active {
                    debug!("Ignoring message while {:?}", self.status);
                    return Effect::None;
                }
                match message {
                    EngineMessage::Transcript {
                        role,
                        transcript_type: TranscriptKind::Final,
                        transcript,
                    } => {
                        self.transcript.push(TranscriptTurn::new(*role, transcript.clone()));
                    }
                    EngineMessage::Transcript { .. } => trace!("Discarding partial transcript"),
                    EngineMessage::Other => trace!("Ignoring non-transcript message"),
                }
                Effect::None
            }

            EngineEvent::SpeechStart | EngineEvent::SpeechEnd => {
                if self.status == CallStatus::Active {
                    self.is_speaking = matches!(event, EngineEvent::SpeechStart);
                }
                Effect::None
            }

            EngineEvent::Error { error } => {
                if !self.status.is_in_progress() {
                    debug!("Ignoring engine error while {:?}: {}", self.status, error.message);
                    return Effect::None;
                }
                self.last_error = Some(error.message.clone());
                let history = self.close();
                Effect::ReportError {
                    message: error.message.clone(),
                    history,
                }
            }

            EngineEvent::VolumeLevel { volume } => {
                trace!("Volume level {:.2}", volume);
                Effect::None
            }
        }
    }

    fn history_payload(&self) -> HistoryPayload {
        HistoryPayload {
            user_text: self.joined(Role::User),
            assistant_text: self.joined(Role::Assistant),
        }
    }

    fn joined(&self, role: Role) -> String {
        self.transcript
            .iter()
            .filter(|turn| turn.role == role)
            .map(|turn| turn.content.as_str())
            .collect::<Vec<_>>()
            .join(&self.separator)
    }
}
