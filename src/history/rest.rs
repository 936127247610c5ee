use super::identity::IdentityProvider;
use super::writer::{PersistenceError, SessionHistoryRecord, SessionHistoryWriter};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Serialize)]
struct NewHistoryRow<'a> {
    user_id: &'a str,
    brain_id: &'a str,
    user_messages: &'a str,
    assistant_messages: &'a str,
}

/// Session history writer for a PostgREST-style store
pub struct RestSessionHistory {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    identity: Arc<dyn IdentityProvider>,
}

impl RestSessionHistory {
    /// Rows go to `{base_url}/rest/v1/{table}`
    pub fn new(
        base_url: &str,
        table: &str,
        api_key: impl Into<String>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let endpoint = format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table);
        info!("Session history endpoint: {}", endpoint);

        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key: api_key.into(),
            identity,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl SessionHistoryWriter for RestSessionHistory {
    async fn append_session_history(
        &self,
        brain_id: &str,
        user_text: &str,
        assistant_text: &str,
    ) -> Result<SessionHistoryRecord, PersistenceError> {
        let user = self
            .identity
            .current_user()
            .await
            .ok_or(PersistenceError::Unauthenticated)?;

        let row = NewHistoryRow {
            user_id: &user.id,
            brain_id,
            user_messages: user_text,
            assistant_messages: assistant_text,
        };

        let bearer = user.access_token.as_deref().unwrap_or(&self.api_key);

        debug!("Writing session history for brain {} (user={})", brain_id, user.id);

        let response = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(bearer)
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await
            .map_err(|e| PersistenceError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PersistenceError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let mut rows: Vec<SessionHistoryRecord> = response
            .json()
            .await
            .map_err(|e| PersistenceError::Malformed(e.to_string()))?;

        rows.pop()
            .ok_or_else(|| PersistenceError::Malformed("store returned no rows".to_string()))
    }
}
