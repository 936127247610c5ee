use crate::assistant::{AssistantConfig, AssistantOverrides};
use serde::Serialize;

/// Control message published to the voice engine
#[derive(Debug, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ControlMessage<'a> {
    Start {
        assistant: &'a AssistantConfig,
        #[serde(rename = "assistantOverrides")]
        assistant_overrides: &'a AssistantOverrides,
    },
    Stop,
    SetMuted {
        muted: bool,
    },
}

/// Subject the engine listens on for a call's control messages
pub fn control_subject(call_id: &str) -> String {
    format!("voice.control.{}", call_id)
}

/// Subject the engine publishes a call's events on
pub fn events_subject(call_id: &str) -> String {
    format!("voice.events.{}", call_id)
}
