use crate::audio::PermissionGate;
use crate::engine::EngineConnector;
use crate::history::{IdentityProvider, SessionHistoryWriter};
use crate::session::CallSessionController;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Mounted call sessions (call_id → controller)
    pub calls: Arc<RwLock<HashMap<String, Arc<CallSessionController>>>>,

    /// Source of per-call engine bridges
    pub engines: Arc<dyn EngineConnector>,

    pub permission: Arc<dyn PermissionGate>,

    pub history: Arc<dyn SessionHistoryWriter>,

    pub identity: Arc<dyn IdentityProvider>,

    /// Joins same-role turns in saved history
    pub history_separator: String,
}

impl AppState {
    pub fn new(
        engines: Arc<dyn EngineConnector>,
        permission: Arc<dyn PermissionGate>,
        history: Arc<dyn SessionHistoryWriter>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            calls: Arc::new(RwLock::new(HashMap::new())),
            engines,
            permission,
            history,
            identity,
            history_separator: " | ".to_string(),
        }
    }

    pub fn with_history_separator(mut self, separator: impl Into<String>) -> Self {
        self.history_separator = separator.into();
        self
    }
}
