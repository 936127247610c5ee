use super::error::EngineError;
use crate::session::Role;
use serde::{Deserialize, Serialize};

/// Events delivered by the voice engine, one variant per channel.
///
/// Wire form is a JSON object tagged by `"type"` with the channel name,
/// e.g. `{"type":"speech-start"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EngineEvent {
    CallStart,
    CallEnd,
    Message { message: EngineMessage },
    SpeechStart,
    SpeechEnd,
    Error { error: EngineFault },
    VolumeLevel { volume: f32 },
}

impl EngineEvent {
    /// Parse one wire payload. Unknown channels or malformed bodies are rejected.
    pub fn from_slice(payload: &[u8]) -> Result<Self, EngineError> {
        serde_json::from_slice(payload).map_err(|e| EngineError::Protocol(e.to_string()))
    }

    /// Channel name, for logging
    pub fn channel(&self) -> &'static str {
        match self {
            EngineEvent::CallStart => "call-start",
            EngineEvent::CallEnd => "call-end",
            EngineEvent::Message { .. } => "message",
            EngineEvent::SpeechStart => "speech-start",
            EngineEvent::SpeechEnd => "speech-end",
            EngineEvent::Error { .. } => "error",
            EngineEvent::VolumeLevel { .. } => "volume-level",
        }
    }

    pub fn final_transcript(role: Role, text: impl Into<String>) -> Self {
        EngineEvent::Message {
            message: EngineMessage::Transcript {
                role,
                transcript_type: TranscriptKind::Final,
                transcript: text.into(),
            },
        }
    }

    pub fn partial_transcript(role: Role, text: impl Into<String>) -> Self {
        EngineEvent::Message {
            message: EngineMessage::Transcript {
                role,
                transcript_type: TranscriptKind::Partial,
                transcript: text.into(),
            },
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        EngineEvent::Error {
            error: EngineFault {
                message: message.into(),
            },
        }
    }
}

/// Payload of a `message` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EngineMessage {
    Transcript {
        role: Role,
        #[serde(rename = "transcriptType")]
        transcript_type: TranscriptKind,
        transcript: String,
    },
    /// Function calls, conversation updates, status updates and the like
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptKind {
    Partial,
    Final,
}

/// Error reported by the engine mid-call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineFault {
    #[serde(default)]
    pub message: String,
}
