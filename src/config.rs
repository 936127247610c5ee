use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub engine: EngineConfig,
    pub store: StoreConfig,
    pub identity: IdentityConfig,
    #[serde(default)]
    pub permission: PermissionConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct EngineConfig {
    pub nats_url: String,
}

#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    pub url: String,
    pub api_key: String,
    #[serde(default = "default_history_table")]
    pub table: String,
}

#[derive(Debug, Deserialize)]
pub struct IdentityConfig {
    /// Authenticated user id. Leaving it unset makes every history write fail.
    pub user_id: Option<String>,
    #[serde(default = "default_display_name")]
    pub display_name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionMode {
    /// Open the default input device before every call
    #[default]
    Probe,
    /// Skip the device check entirely
    AssumeGranted,
}

#[derive(Debug, Default, Deserialize)]
pub struct PermissionConfig {
    #[serde(default)]
    pub mode: PermissionMode,
}

#[derive(Debug, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_separator")]
    pub separator: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            separator: default_separator(),
        }
    }
}

fn default_history_table() -> String {
    "session_history".to_string()
}

fn default_display_name() -> String {
    "Anonymous".to_string()
}

fn default_separator() -> String {
    " | ".to_string()
}

impl Config {
    /// Load `path` (extension optional) and overlay `SNOWBRAIN__SECTION__KEY` variables.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("SNOWBRAIN").separator("__"))
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        settings
            .try_deserialize()
            .context("Failed to deserialize config")
    }
}
