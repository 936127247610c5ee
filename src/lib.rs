pub mod assistant;
pub mod audio;
pub mod config;
pub mod engine;
pub mod history;
pub mod http;
pub mod nats;
pub mod session;

pub use assistant::{AssistantConfig, AssistantConfigBuilder, AssistantOverrides, FALLBACK_VOICE_ID};
pub use audio::{AssumeGranted, MicrophoneGrant, PermissionDenied, PermissionGate};
pub use config::Config;
pub use engine::{EngineError, EngineEvent, EngineMessage, EventSubscription, VoiceEngine};
pub use history::{
    IdentityProvider, PersistenceError, RestSessionHistory, SessionHistoryRecord,
    SessionHistoryWriter, StaticIdentity, UserIdentity,
};
pub use http::{create_router, AppState};
pub use nats::{NatsEngineConnector, NatsVoiceEngine};
pub use session::{
    CallError, CallSessionController, CallSnapshot, CallState, CallStatus, Role, SessionConfig,
    TranscriptTurn,
};
