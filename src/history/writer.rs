use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A saved session summary, as returned by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHistoryRecord {
    pub id: String,
    pub user_id: String,
    pub brain_id: String,
    pub user_messages: String,
    pub assistant_messages: String,
    /// Assigned by the store
    pub created_at: DateTime<Utc>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("No authenticated user; session history write rejected")]
    Unauthenticated,

    #[error("Session history request failed: {0}")]
    Request(String),

    #[error("Session history store rejected write ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Unexpected session history response: {0}")]
    Malformed(String),
}

/// Persists one summary row per completed call
#[async_trait::async_trait]
pub trait SessionHistoryWriter: Send + Sync {
    async fn append_session_history(
        &self,
        brain_id: &str,
        user_text: &str,
        assistant_text: &str,
    ) -> Result<SessionHistoryRecord, PersistenceError>;
}
