//! Assistant configuration for the voice engine
//!
//! Maps a brain's voice family and teaching style onto the transcriber,
//! voice synthesis and language model settings for one call attempt.

mod builder;
pub mod voices;

pub use builder::{
    AssistantConfig, AssistantConfigBuilder, AssistantOverrides, ModelConfig, PromptMessage,
    TranscriberConfig, VoiceConfig,
};
pub use voices::FALLBACK_VOICE_ID;
