use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Voice engine unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to start call: {0}")]
    Start(String),

    #[error("Engine control error: {0}")]
    Control(String),

    #[error("Malformed engine event: {0}")]
    Protocol(String),
}
