pub mod client;
pub mod messages;

pub use client::{NatsEngineConnector, NatsVoiceEngine};
pub use messages::{control_subject, events_subject, ControlMessage};
