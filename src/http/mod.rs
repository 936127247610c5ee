//! HTTP API for the call session front end
//!
//! This module provides a REST API for controlling voice calls:
//! - POST /calls - Mount a session and start a call
//! - POST /calls/:id/start - Start a fresh attempt
//! - POST /calls/:id/mute - Toggle the microphone
//! - POST /calls/:id/disconnect - End the call
//! - GET /calls/:id - Query the call snapshot
//! - GET /calls/:id/transcript - Get accumulated transcript
//! - DELETE /calls/:id - Unmount the session
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
