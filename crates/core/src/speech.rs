//! Speech-Synthesis Capability
//!
//! Optional voice replies: the narration text is rendered to Opus audio so
//! the transport can send it as a voice note. Synthesis failures are the
//! dispatcher's problem — it falls back to text.

use anyhow::Result;
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{CreateSpeechRequestArgs, SpeechModel, SpeechResponseFormat, Voice},
};
use async_trait::async_trait;
use bytes::Bytes;
use tracing::warn;

/// Defines the contract for rendering text to speech audio.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Renders `text` to an Opus audio stream.
    async fn synthesize(&self, text: &str) -> Result<Bytes>;
}

/// An implementation of `SpeechSynthesizer` using the OpenAI speech API.
pub struct OpenAiSpeech {
    client: Client<OpenAIConfig>,
    voice: Voice,
}

impl OpenAiSpeech {
    /// Creates a synthesizer with the given voice name. Unknown names fall
    /// back to "alloy" with a warning rather than failing startup.
    pub fn new(config: OpenAIConfig, voice: &str) -> Self {
        Self {
            client: Client::with_config(config),
            voice: parse_voice(voice),
        }
    }
}

fn parse_voice(name: &str) -> Voice {
    match name.to_lowercase().as_str() {
        "alloy" => Voice::Alloy,
        "echo" => Voice::Echo,
        "fable" => Voice::Fable,
        "onyx" => Voice::Onyx,
        "nova" => Voice::Nova,
        "shimmer" => Voice::Shimmer,
        other => {
            warn!(voice = other, "unknown voice name, using 'alloy'");
            Voice::Alloy
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeech {
    async fn synthesize(&self, text: &str) -> Result<Bytes> {
        let request = CreateSpeechRequestArgs::default()
            .input(text)
            .model(SpeechModel::Tts1)
            .voice(self.voice.clone())
            .response_format(SpeechResponseFormat::Opus)
            .build()?;

        let response = self.client.audio().speech(request).await?;
        Ok(response.bytes)
    }
}
