use super::voices;
use serde::Serialize;
use std::collections::BTreeMap;

const ASSISTANT_NAME: &str = "SnowBrain v4";

const FIRST_MESSAGE: &str = "Hello! Welcome to your tutoring session. Today we'll be learning about {{topic}} in {{subject}}. I'm excited to teach you! Are you ready to get started?";

const SYSTEM_PROMPT: &str = "You are a highly knowledgeable tutor teaching a real-time voice session with a student about {{topic}} in {{subject}}.

IMPORTANT: This is a LIVE VOICE conversation. Keep the conversation flowing naturally.

Tutor Guidelines:
- Teach the student about {{topic}} in {{subject}} using a {{style}} approach
- Keep responses short (under 100 words) for voice conversation
- Always ask questions to check understanding
- Wait for student responses before continuing
- No special characters - this is voice only
- End each response with a question to maintain engagement
- Be interactive, not just informative

Start by briefly introducing the topic and asking if they're familiar with it.";

/// Speech-to-text settings sent to the engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriberConfig {
    pub provider: String,
    pub model: String,
    pub language: String,
}

/// Text-to-speech voice and prosody
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub provider: String,
    pub voice_id: String,
    pub stability: f32,
    pub similarity_boost: f32,
    pub speed: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: String,
}

/// Language model settings, including the templated system prompt
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    pub provider: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub messages: Vec<PromptMessage>,
}

/// Immutable call configuration understood by the voice engine.
///
/// Prompt placeholders (`{{topic}}`, `{{subject}}`, `{{style}}`) are left
/// intact; the engine substitutes them from [`AssistantOverrides`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantConfig {
    name: String,
    first_message: String,
    transcriber: TranscriberConfig,
    voice: VoiceConfig,
    model: ModelConfig,
}

impl AssistantConfig {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn first_message(&self) -> &str {
        &self.first_message
    }

    pub fn transcriber(&self) -> &TranscriberConfig {
        &self.transcriber
    }

    pub fn voice(&self) -> &VoiceConfig {
        &self.voice
    }

    pub fn voice_id(&self) -> &str {
        &self.voice.voice_id
    }

    pub fn model(&self) -> &ModelConfig {
        &self.model
    }

    /// The system prompt template, placeholders unsubstituted
    pub fn system_prompt(&self) -> Option<&str> {
        self.model
            .messages
            .iter()
            .find(|m| m.role == "system")
            .map(|m| m.content.as_str())
    }
}

/// Variable bindings supplied next to the config at call start
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantOverrides {
    pub variable_values: BTreeMap<String, String>,
}

impl AssistantOverrides {
    pub fn for_session(subject: &str, topic: &str, style: &str) -> Self {
        let variable_values = [("subject", subject), ("topic", topic), ("style", style)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Self { variable_values }
    }
}

/// Builds [`AssistantConfig`] values. Pure: no I/O, same input gives same output.
pub struct AssistantConfigBuilder;

impl AssistantConfigBuilder {
    /// Build the config for a voice family and teaching style.
    ///
    /// Pairs missing from the voice table resolve silently to
    /// [`voices::FALLBACK_VOICE_ID`].
    pub fn build(voice: &str, style: &str) -> AssistantConfig {
        let voice_id = voices::resolve(voice, style);

        AssistantConfig {
            name: ASSISTANT_NAME.to_string(),
            first_message: FIRST_MESSAGE.to_string(),
            transcriber: TranscriberConfig {
                provider: "deepgram".to_string(),
                model: "nova-3".to_string(),
                language: "en".to_string(),
            },
            voice: VoiceConfig {
                provider: "11labs".to_string(),
                voice_id: voice_id.to_string(),
                stability: 0.4,
                similarity_boost: 0.8,
                speed: 0.9,
                style: 0.5,
                use_speaker_boost: true,
            },
            model: ModelConfig {
                provider: "deep-seek".to_string(),
                model: "deepseek-chat".to_string(),
                temperature: 0.7,
                max_tokens: 150,
                messages: vec![PromptMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                }],
            },
        }
    }
}
