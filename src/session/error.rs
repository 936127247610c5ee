use crate::audio::PermissionDenied;
use crate::engine::EngineError;
use crate::history::PersistenceError;
use thiserror::Error;

/// Why a call attempt did not go as requested. Never fatal to the process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    #[error(transparent)]
    PermissionDenied(#[from] PermissionDenied),

    #[error("Voice engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Voice engine error: {0}")]
    EngineRuntime(String),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl From<EngineError> for CallError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Unavailable(reason) => CallError::EngineUnavailable(reason),
            other => CallError::EngineRuntime(other.to_string()),
        }
    }
}
