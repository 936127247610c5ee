use crate::config::IdentityConfig;
use serde::{Deserialize, Serialize};

/// The signed-in user, as supplied by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub display_name: String,
    /// Bearer token for the store; the store API key is used when absent
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
}

#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `None` when nobody is signed in
    async fn current_user(&self) -> Option<UserIdentity>;
}

/// Identity fixed at startup
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user: Option<UserIdentity>,
}

impl StaticIdentity {
    pub fn new(user: Option<UserIdentity>) -> Self {
        Self { user }
    }

    pub fn signed_in(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self::new(Some(UserIdentity {
            id: id.into(),
            display_name: display_name.into(),
            access_token: None,
        }))
    }

    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn from_config(config: &IdentityConfig) -> Self {
        match &config.user_id {
            Some(id) => Self::signed_in(id.clone(), config.display_name.clone()),
            None => Self::anonymous(),
        }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_user(&self) -> Option<UserIdentity> {
        self.user.clone()
    }
}
