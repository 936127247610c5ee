use super::state::AppState;
use crate::session::{CallError, CallSessionController, CallSnapshot, SessionConfig, TranscriptTurn};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartCallRequest {
    /// Optional call ID (if not provided, generate UUID)
    pub call_id: Option<String>,

    pub brain_id: String,

    /// Brain display name
    pub name: String,

    pub subject: String,

    pub topic: String,

    pub voice: String,

    pub style: String,
}

#[derive(Debug, Serialize)]
pub struct CallResponse {
    pub call_id: String,
    pub snapshot: CallSnapshot,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub call_id: String,
    pub turns: Vec<TranscriptTurn>,
    /// Turns formatted for display, oldest first
    pub lines: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MuteResponse {
    pub call_id: String,
    pub is_muted: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

fn call_not_found(call_id: &str) -> Response {
    error_response(StatusCode::NOT_FOUND, format!("Call {} not found", call_id))
}

fn status_for(err: &CallError) -> StatusCode {
    match err {
        CallError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        CallError::EngineUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        CallError::EngineRuntime(_) => StatusCode::BAD_GATEWAY,
        CallError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn find_call(state: &AppState, call_id: &str) -> Option<Arc<CallSessionController>> {
    let calls = state.calls.read().await;
    calls.get(call_id).cloned()
}

/// Run a call attempt and report the resulting snapshot
async fn run_attempt(call_id: String, controller: &CallSessionController) -> Response {
    let result = controller.start_call().await;
    let response = CallResponse {
        call_id,
        snapshot: controller.snapshot().await,
    };

    match result {
        Ok(()) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            warn!("Call {} did not start: {}", response.call_id, e);
            (status_for(&e), Json(response)).into_response()
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /calls
/// Mount a call session for a brain and start the first attempt
pub async fn start_call(
    State(state): State<AppState>,
    Json(req): Json<StartCallRequest>,
) -> Response {
    let call_id = req
        .call_id
        .unwrap_or_else(|| format!("call-{}", uuid::Uuid::new_v4()));

    info!("Starting call {} with brain {}", call_id, req.brain_id);

    {
        let calls = state.calls.read().await;
        if calls.contains_key(&call_id) {
            return error_response(
                StatusCode::CONFLICT,
                format!("Call {} is already mounted", call_id),
            );
        }
    }

    let session = SessionConfig {
        brain_id: req.brain_id,
        brain_name: req.name,
        subject: req.subject,
        topic: req.topic,
        voice: req.voice,
        style: req.style,
        history_separator: state.history_separator.clone(),
    };

    let controller = match CallSessionController::mount(
        session,
        state.engines.engine_for(&call_id),
        Arc::clone(&state.permission),
        Arc::clone(&state.history),
    )
    .await
    {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Failed to mount call {}: {}", call_id, e);
            return error_response(status_for(&e), format!("Failed to mount call: {}", e));
        }
    };

    {
        let mut calls = state.calls.write().await;
        match calls.entry(call_id.clone()) {
            Entry::Occupied(_) => {
                // Lost a race with a concurrent mount; dropping ours releases its subscription
                warn!("Call {} was mounted concurrently", call_id);
                return error_response(
                    StatusCode::CONFLICT,
                    format!("Call {} is already mounted", call_id),
                );
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&controller));
            }
        }
    }

    run_attempt(call_id, &controller).await
}

/// POST /calls/:call_id/start
/// Start a fresh attempt on an already mounted call
pub async fn restart_call(State(state): State<AppState>, Path(call_id): Path<String>) -> Response {
    match find_call(&state, &call_id).await {
        Some(controller) => run_attempt(call_id, &controller).await,
        None => call_not_found(&call_id),
    }
}

/// GET /calls/:call_id
/// Current snapshot of a call
pub async fn get_call(State(state): State<AppState>, Path(call_id): Path<String>) -> Response {
    match find_call(&state, &call_id).await {
        Some(controller) => {
            let snapshot = controller.snapshot().await;
            (StatusCode::OK, Json(CallResponse { call_id, snapshot })).into_response()
        }
        None => call_not_found(&call_id),
    }
}

/// GET /calls/:call_id/transcript
/// Transcript accumulated so far
pub async fn get_transcript(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
) -> Response {
    let Some(controller) = find_call(&state, &call_id).await else {
        return call_not_found(&call_id);
    };

    let user_name = state
        .identity
        .current_user()
        .await
        .map(|user| user.display_name)
        .unwrap_or_else(|| "You".to_string());

    let turns = controller.snapshot().await.transcript;
    let brain_name = &controller.session().brain_name;
    let lines = turns
        .iter()
        .map(|turn| turn.display_line(brain_name, &user_name))
        .collect();

    (
        StatusCode::OK,
        Json(TranscriptResponse {
            call_id,
            turns,
            lines,
        }),
    )
        .into_response()
}

/// POST /calls/:call_id/mute
/// Toggle the microphone mute flag
pub async fn toggle_mute(State(state): State<AppState>, Path(call_id): Path<String>) -> Response {
    let Some(controller) = find_call(&state, &call_id).await else {
        return call_not_found(&call_id);
    };

    match controller.toggle_microphone().await {
        Ok(is_muted) => (StatusCode::OK, Json(MuteResponse { call_id, is_muted })).into_response(),
        Err(e) => {
            error!("Failed to toggle microphone for call {}: {}", call_id, e);
            error_response(status_for(&e), format!("Failed to toggle microphone: {}", e))
        }
    }
}

/// POST /calls/:call_id/disconnect
/// End the call
pub async fn disconnect_call(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
) -> Response {
    let Some(controller) = find_call(&state, &call_id).await else {
        return call_not_found(&call_id);
    };

    controller.disconnect().await;
    let snapshot = controller.snapshot().await;

    (StatusCode::OK, Json(CallResponse { call_id, snapshot })).into_response()
}

/// DELETE /calls/:call_id
/// Disconnect and unmount a call session
pub async fn remove_call(State(state): State<AppState>, Path(call_id): Path<String>) -> Response {
    let controller = {
        let mut calls = state.calls.write().await;
        calls.remove(&call_id)
    };

    let Some(controller) = controller else {
        return call_not_found(&call_id);
    };

    controller.disconnect().await;
    if let Some(Err(e)) = controller.wait_for_history().await {
        warn!("Call {} removed without saving its history: {}", call_id, e);
    }

    match Arc::try_unwrap(controller) {
        Ok(controller) => controller.unmount().await,
        // Another request still holds it; the last drop releases the subscription
        Err(_) => info!("Call {} still in use, unmounting on last drop", call_id),
    }

    StatusCode::NO_CONTENT.into_response()
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
