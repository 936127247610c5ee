//! Voice engine boundary
//!
//! The engine (speech-to-text, language model, text-to-speech) is an
//! external service. This module defines the control trait the session
//! controller drives and the closed set of events it accepts back.

mod backend;
mod error;
mod events;

pub use backend::{EngineConnector, EventSubscription, VoiceEngine};
pub use error::EngineError;
pub use events::{EngineEvent, EngineFault, EngineMessage, TranscriptKind};
