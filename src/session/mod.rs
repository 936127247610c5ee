//! Voice call session management
//!
//! This module provides the `CallSessionController` that manages:
//! - Microphone permission before a call starts
//! - Assistant configuration and engine call stand-up
//! - Engine events driving the call state machine
//! - Transcript collection and the session history write on call end

mod config;
mod controller;
mod error;
mod state;

pub use config::SessionConfig;
pub use controller::CallSessionController;
pub use error::CallError;
pub use state::{CallSnapshot, CallState, CallStatus, Effect, HistoryPayload, Role, TranscriptTurn};
